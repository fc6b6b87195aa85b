//! Archive repository - response collection and transactional purge.

use std::sync::Arc;

use beacon_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

use crate::entities::{benchmark_response, report_run, visibility_response};

/// Heavy response rows collected for a set of runs.
#[derive(Debug, Clone, Default)]
pub struct CollectedResponses {
    pub visibility: Vec<visibility_response::Model>,
    pub benchmark: Vec<benchmark_response::Model>,
}

impl CollectedResponses {
    /// Total number of response rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visibility.len() + self.benchmark.len()
    }

    /// Whether no responses were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visibility.is_empty() && self.benchmark.is_empty()
    }
}

/// Outcome of a purge transaction.
#[derive(Debug, Clone, Copy)]
pub struct PurgeOutcome {
    /// Response rows deleted across both response tables.
    pub responses_deleted: u64,
    /// Runs stamped with the archive id.
    pub runs_marked: u64,
}

/// Repository for the archival data-migration path.
#[derive(Clone)]
pub struct ArchiveRepository {
    db: Arc<DatabaseConnection>,
}

impl ArchiveRepository {
    /// Create a new archive repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Collect all heavy response rows for the given runs.
    pub async fn collect_for_runs(&self, run_ids: &[String]) -> AppResult<CollectedResponses> {
        if run_ids.is_empty() {
            return Ok(CollectedResponses::default());
        }

        let visibility = visibility_response::Entity::find()
            .filter(visibility_response::Column::RunId.is_in(run_ids.iter().cloned()))
            .order_by_asc(visibility_response::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let benchmark = benchmark_response::Entity::find()
            .filter(benchmark_response::Column::RunId.is_in(run_ids.iter().cloned()))
            .order_by_asc(benchmark_response::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(CollectedResponses {
            visibility,
            benchmark,
        })
    }

    /// Delete the given runs' response rows and stamp the runs archived,
    /// all inside a single transaction.
    ///
    /// Either every response row for the run set is deleted and every run
    /// carries the archive id, or nothing changed. Callers must only
    /// invoke this after the archive payload has been durably uploaded.
    pub async fn purge_runs(&self, run_ids: &[String], archive_id: &str) -> AppResult<PurgeOutcome> {
        if run_ids.is_empty() {
            return Ok(PurgeOutcome {
                responses_deleted: 0,
                runs_marked: 0,
            });
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let visibility_deleted = visibility_response::Entity::delete_many()
            .filter(visibility_response::Column::RunId.is_in(run_ids.iter().cloned()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .rows_affected;

        let benchmark_deleted = benchmark_response::Entity::delete_many()
            .filter(benchmark_response::Column::RunId.is_in(run_ids.iter().cloned()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .rows_affected;

        let now = Utc::now().fixed_offset();
        let runs_marked = report_run::Entity::update_many()
            .col_expr(report_run::Column::ArchiveId, Expr::value(archive_id))
            .col_expr(report_run::Column::ArchivedAt, Expr::value(now))
            .col_expr(report_run::Column::UpdatedAt, Expr::value(now))
            .filter(report_run::Column::Id.is_in(run_ids.iter().cloned()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .rows_affected;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(PurgeOutcome {
            responses_deleted: visibility_deleted + benchmark_deleted,
            runs_marked,
        })
    }
}
