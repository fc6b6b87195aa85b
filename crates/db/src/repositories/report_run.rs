//! Report run repository.

use std::sync::Arc;

use beacon_common::{AppError, AppResult, IdGenerator};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::report_run::{ActiveModel, Column, Entity, Model, RunStatus};

/// Report run repository for database operations.
#[derive(Clone)]
pub struct ReportRunRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl ReportRunRepository {
    /// Create a new report run repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new pending run for a company.
    pub async fn create(&self, company_id: &str) -> AppResult<Model> {
        let model = ActiveModel {
            id: Set(self.id_gen.generate()),
            company_id: Set(company_id.to_string()),
            status: Set(RunStatus::Pending),
            step_status: Set(None),
            archive_id: Set(None),
            archived_at: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
            updated_at: Set(None),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a run by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Model>> {
        Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Transition a run's status, optionally updating the progress marker.
    pub async fn update_status(
        &self,
        id: &str,
        status: RunStatus,
        step_status: Option<String>,
    ) -> AppResult<Option<Model>> {
        let Some(existing) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.status = Set(status);
        if let Some(step) = step_status {
            model.step_status = Set(Some(step));
        }
        model.updated_at = Set(Some(Utc::now().fixed_offset()));

        model
            .update(self.db.as_ref())
            .await
            .map(Some)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all runs for a company, newest first.
    pub async fn find_by_company(&self, company_id: &str) -> AppResult<Vec<Model>> {
        Entity::find()
            .filter(Column::CompanyId.eq(company_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find completed runs for a company, newest first.
    pub async fn find_completed_by_company(&self, company_id: &str) -> AppResult<Vec<Model>> {
        Entity::find()
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::Status.eq(RunStatus::Completed))
            .order_by_desc(Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count completed runs for a company.
    pub async fn count_completed_by_company(&self, company_id: &str) -> AppResult<u64> {
        Entity::find()
            .filter(Column::CompanyId.eq(company_id))
            .filter(Column::Status.eq(RunStatus::Completed))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
