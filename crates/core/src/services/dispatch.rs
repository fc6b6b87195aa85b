//! Report dispatch trait - seam between core logic and the job queue.

use std::sync::Arc;

use async_trait::async_trait;
use beacon_common::AppResult;

/// Enqueues report lifecycle work onto the durable queue.
///
/// Core services depend on this trait so that fanout logic can be
/// exercised without a queue backend.
#[async_trait]
pub trait ReportDispatch: Send + Sync {
    /// Enqueue report generation for a company.
    async fn enqueue_generate_report(&self, company_id: &str) -> AppResult<()>;

    /// Enqueue an archival pass for a company.
    async fn enqueue_archive(&self, company_id: &str) -> AppResult<()>;
}

/// Shared handle to a dispatch implementation.
pub type DispatchService = Arc<dyn ReportDispatch>;

/// Dispatch that drops everything, for wiring paths that never enqueue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDispatch;

#[async_trait]
impl ReportDispatch for NoOpDispatch {
    async fn enqueue_generate_report(&self, _company_id: &str) -> AppResult<()> {
        Ok(())
    }

    async fn enqueue_archive(&self, _company_id: &str) -> AppResult<()> {
        Ok(())
    }
}
