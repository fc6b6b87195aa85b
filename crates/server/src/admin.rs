//! Thin operator-facing admin surface.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use beacon_common::AppResult;
use beacon_core::{DispatchService, ScheduleService, ScheduleUpdateInput};
use beacon_db::repositories::CompanyRepository;
use beacon_queue::{run_manual_fanout, CompanyCatalog};
use serde::Serialize;
use serde_json::json;
use tracing::info;

/// Shared state for the admin routes.
#[derive(Clone)]
pub struct AdminState {
    pub catalog: Arc<dyn CompanyCatalog>,
    pub dispatch: DispatchService,
    pub company_repo: CompanyRepository,
    pub schedule_service: ScheduleService,
}

/// Build the admin router.
pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/reports/trigger", post(trigger_reports))
        .route("/admin/companies/{id}/archive", post(archive_company))
        .route("/admin/companies/{id}/schedule", put(update_schedule))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Serialize)]
struct TriggerResponse {
    enqueued: usize,
}

/// Manual full fan-out: enqueue generation for every company.
async fn trigger_reports(
    State(state): State<AdminState>,
) -> AppResult<(StatusCode, Json<TriggerResponse>)> {
    let enqueued = run_manual_fanout(state.catalog.as_ref(), state.dispatch.as_ref()).await?;

    info!(enqueued, "Manual report trigger accepted");
    Ok((StatusCode::ACCEPTED, Json(TriggerResponse { enqueued })))
}

#[derive(Serialize)]
struct ArchiveQueuedResponse {
    company_id: String,
    status: &'static str,
}

/// Enqueue one archive cycle for a company.
async fn archive_company(
    State(state): State<AdminState>,
    Path(company_id): Path<String>,
) -> AppResult<(StatusCode, Json<ArchiveQueuedResponse>)> {
    // 404 before enqueueing anything for an unknown company.
    let company = state.company_repo.get_by_id(&company_id).await?;
    state.dispatch.enqueue_archive(&company.id).await?;

    info!(company_id = %company.id, "Archive job queued via admin");
    Ok((
        StatusCode::ACCEPTED,
        Json(ArchiveQueuedResponse {
            company_id: company.id,
            status: "queued",
        }),
    ))
}

/// Replace a company's schedule policy.
async fn update_schedule(
    State(state): State<AdminState>,
    Path(company_id): Path<String>,
    Json(input): Json<ScheduleUpdateInput>,
) -> AppResult<Json<serde_json::Value>> {
    let company = state.company_repo.get_by_id(&company_id).await?;
    let policy = state.schedule_service.update_schedule(&company.id, input).await?;

    info!(company_id = %company.id, mode = policy.mode.as_str(), "Schedule updated via admin");
    Ok(Json(json!({
        "companyId": company.id,
        "mode": policy.mode.as_str(),
        "timezone": policy.timezone,
        "weeklyDays": policy.weekly_days,
        "customDates": policy.custom_dates,
    })))
}

async fn healthz() -> &'static str {
    "ok"
}
