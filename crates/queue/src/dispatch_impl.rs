//! Redis-backed report dispatch implementation.
//!
//! Implements the core `ReportDispatch` trait by pushing jobs onto
//! per-type apalis Redis queues.

use apalis::prelude::Storage;
use async_trait::async_trait;
use beacon_common::{AppError, AppResult};
use beacon_core::ReportDispatch;

use crate::jobs::{ArchiveJob, GenerateReportJob};

/// Redis-backed dispatch service.
///
/// Each job type gets its own queue so archive load never starves
/// report generation.
#[derive(Clone)]
pub struct RedisDispatchService {
    generate_storage: apalis_redis::RedisStorage<GenerateReportJob>,
    archive_storage: apalis_redis::RedisStorage<ArchiveJob>,
}

impl RedisDispatchService {
    /// Create a new Redis dispatch service.
    #[must_use]
    pub const fn new(
        generate_storage: apalis_redis::RedisStorage<GenerateReportJob>,
        archive_storage: apalis_redis::RedisStorage<ArchiveJob>,
    ) -> Self {
        Self {
            generate_storage,
            archive_storage,
        }
    }
}

#[async_trait]
impl ReportDispatch for RedisDispatchService {
    async fn enqueue_generate_report(&self, company_id: &str) -> AppResult<()> {
        let job = GenerateReportJob::new(company_id.to_string());

        self.generate_storage
            .clone()
            .push(job)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to queue generate job: {e}")))?;

        tracing::debug!(company_id = %company_id, "Queued report generation job");
        Ok(())
    }

    async fn enqueue_archive(&self, company_id: &str) -> AppResult<()> {
        let job = ArchiveJob::new(company_id.to_string());

        self.archive_storage
            .clone()
            .push(job)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to queue archive job: {e}")))?;

        tracing::debug!(company_id = %company_id, "Queued archive job");
        Ok(())
    }
}
