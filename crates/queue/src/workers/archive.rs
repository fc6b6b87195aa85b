//! Archive worker.

use std::sync::Arc;

use apalis::prelude::*;
use beacon_core::{ArchiveOutcome, ArchiveService};
use tracing::{error, info, warn};

use crate::in_flight::InFlightRegistry;
use crate::jobs::{ArchiveJob, SCHEMA_VERSION};
use crate::retry::JobError;

/// Context for the archive worker.
#[derive(Clone)]
pub struct ArchiveContext {
    pub archive_service: Arc<ArchiveService>,
    pub in_flight: InFlightRegistry,
}

impl ArchiveContext {
    /// Create a new archive worker context.
    #[must_use]
    pub fn new(archive_service: Arc<ArchiveService>) -> Self {
        Self {
            archive_service,
            in_flight: InFlightRegistry::new(),
        }
    }
}

/// Worker function for archive jobs.
///
/// # Errors
/// Returns a retryable error when the cycle fails transiently, and an
/// aborting error when the payload itself is unusable.
pub async fn archive_worker(job: ArchiveJob, ctx: Data<ArchiveContext>) -> Result<(), Error> {
    match run_archive_cycle(&job, &ctx).await {
        Ok(ArchiveOutcome::Skipped { completed_runs }) => {
            info!(
                company_id = %job.company_id,
                completed_runs,
                "Archive cycle skipped, retention window not exceeded"
            );
            Ok(())
        }
        Ok(ArchiveOutcome::Archived {
            archive_id,
            runs_archived,
            responses_deleted,
        }) => {
            info!(
                company_id = %job.company_id,
                archive_id = %archive_id,
                runs_archived,
                responses_deleted,
                "Archive cycle completed"
            );
            Ok(())
        }
        Err(e) => {
            error!(company_id = %job.company_id, error = %e, "Archive cycle failed");
            Err(e.into())
        }
    }
}

async fn run_archive_cycle(
    job: &ArchiveJob,
    ctx: &ArchiveContext,
) -> Result<ArchiveOutcome, JobError> {
    if job.version != SCHEMA_VERSION {
        return Err(JobError::Fatal(format!(
            "Unsupported archive job schema version {} (expected {SCHEMA_VERSION})",
            job.version
        )));
    }

    // At most one archive cycle per company; a concurrent duplicate is
    // redelivered by the queue after backoff.
    let Some(_guard) = ctx.in_flight.try_acquire(&job.company_id) else {
        warn!(company_id = %job.company_id, "Archive already in flight, deferring");
        return Err(JobError::Retryable(format!(
            "Archive already in flight for company {}",
            job.company_id
        )));
    };

    ctx.archive_service
        .archive_company(&job.company_id)
        .await
        .map_err(|e| JobError::Retryable(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use beacon_common::{AppResult, ArchiveObject, ColdStorage};
    use beacon_core::ArchiveStore;
    use beacon_db::entities::report_run;
    use beacon_db::repositories::{CollectedResponses, PurgeOutcome};

    struct EmptyStore;

    #[async_trait]
    impl ArchiveStore for EmptyStore {
        async fn runs_for_company(&self, _company_id: &str) -> AppResult<Vec<report_run::Model>> {
            Ok(Vec::new())
        }

        async fn collect_responses(&self, _run_ids: &[String]) -> AppResult<CollectedResponses> {
            Ok(CollectedResponses::default())
        }

        async fn purge_runs(
            &self,
            run_ids: &[String],
            _archive_id: &str,
        ) -> AppResult<PurgeOutcome> {
            Ok(PurgeOutcome {
                responses_deleted: 0,
                runs_marked: run_ids.len() as u64,
            })
        }
    }

    struct NullCold;

    #[async_trait]
    impl ColdStorage for NullCold {
        async fn upload(&self, key: &str, data: &[u8]) -> AppResult<ArchiveObject> {
            Ok(ArchiveObject {
                archive_id: key.to_string(),
                size: data.len() as u64,
                md5: String::new(),
            })
        }

        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Ok(false)
        }
    }

    fn context() -> ArchiveContext {
        let service = ArchiveService::new(Arc::new(EmptyStore), Arc::new(NullCold), 3);
        ArchiveContext::new(Arc::new(service))
    }

    #[tokio::test]
    async fn test_version_mismatch_is_fatal() {
        let ctx = context();
        let job = ArchiveJob {
            company_id: "c1".to_string(),
            version: 99,
        };

        let err = run_archive_cycle(&job, &ctx).await.unwrap_err();
        assert!(matches!(err, JobError::Fatal(_)));
    }

    #[tokio::test]
    async fn test_busy_company_fails_retryably() {
        let ctx = context();
        let _guard = ctx.in_flight.try_acquire("c1").unwrap();

        let job = ArchiveJob::new("c1".to_string());
        let err = run_archive_cycle(&job, &ctx).await.unwrap_err();
        assert!(matches!(err, JobError::Retryable(_)));
    }

    #[tokio::test]
    async fn test_guard_released_after_cycle() {
        let ctx = context();
        let job = ArchiveJob::new("c1".to_string());

        let outcome = run_archive_cycle(&job, &ctx).await.unwrap();
        assert!(matches!(outcome, ArchiveOutcome::Skipped { .. }));
        assert!(ctx.in_flight.is_empty());
    }
}
