//! Archive orchestration - upload-before-delete migration of heavy
//! response data to cold storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use beacon_common::{generate_archive_key, AppError, AppResult, ColdStorage};
use beacon_db::entities::{benchmark_response, report_run, visibility_response};
use beacon_db::repositories::{
    ArchiveRepository, CollectedResponses, PurgeOutcome, ReportRunRepository,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::retention::overflow_run_ids;

/// Persistence operations the archive cycle needs.
///
/// The worker path goes through [`DbArchiveStore`]; tests substitute an
/// in-memory store.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// All runs for a company, newest first.
    async fn runs_for_company(&self, company_id: &str) -> AppResult<Vec<report_run::Model>>;

    /// Collect the heavy response rows for the given runs.
    async fn collect_responses(&self, run_ids: &[String]) -> AppResult<CollectedResponses>;

    /// Delete response rows and stamp the runs archived, transactionally.
    async fn purge_runs(&self, run_ids: &[String], archive_id: &str) -> AppResult<PurgeOutcome>;
}

/// Database-backed archive store.
#[derive(Clone)]
pub struct DbArchiveStore {
    run_repo: ReportRunRepository,
    archive_repo: ArchiveRepository,
}

impl DbArchiveStore {
    /// Create a new database-backed store.
    #[must_use]
    pub const fn new(run_repo: ReportRunRepository, archive_repo: ArchiveRepository) -> Self {
        Self {
            run_repo,
            archive_repo,
        }
    }
}

#[async_trait]
impl ArchiveStore for DbArchiveStore {
    async fn runs_for_company(&self, company_id: &str) -> AppResult<Vec<report_run::Model>> {
        self.run_repo.find_by_company(company_id).await
    }

    async fn collect_responses(&self, run_ids: &[String]) -> AppResult<CollectedResponses> {
        self.archive_repo.collect_for_runs(run_ids).await
    }

    async fn purge_runs(&self, run_ids: &[String], archive_id: &str) -> AppResult<PurgeOutcome> {
        self.archive_repo.purge_runs(run_ids, archive_id).await
    }
}

/// Responses belonging to a single archived run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResponses {
    pub visibility: Vec<visibility_response::Model>,
    pub benchmark: Vec<benchmark_response::Model>,
}

/// The JSON document uploaded to cold storage.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivePayload {
    pub company_id: String,
    pub generated_at: DateTime<Utc>,
    /// Responses grouped by run id, in stable order.
    pub runs: BTreeMap<String, RunResponses>,
}

impl ArchivePayload {
    /// Group collected responses by run, keeping every overflowed run
    /// present even when it has no response rows.
    #[must_use]
    pub fn build(company_id: &str, run_ids: &[String], collected: CollectedResponses) -> Self {
        let mut runs: BTreeMap<String, RunResponses> = run_ids
            .iter()
            .map(|id| (id.clone(), RunResponses::default()))
            .collect();

        for row in collected.visibility {
            if let Some(entry) = runs.get_mut(&row.run_id) {
                entry.visibility.push(row);
            }
        }
        for row in collected.benchmark {
            if let Some(entry) = runs.get_mut(&row.run_id) {
                entry.benchmark.push(row);
            }
        }

        Self {
            company_id: company_id.to_string(),
            generated_at: Utc::now(),
            runs,
        }
    }

    /// Serialize the payload for upload.
    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// Result of one archive cycle for a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Nothing overflowed the retention window; no upload, no deletion.
    Skipped { completed_runs: usize },
    /// Overflowed runs were uploaded and purged.
    Archived {
        archive_id: String,
        runs_archived: usize,
        responses_deleted: u64,
    },
}

/// Orchestrates the read, upload and purge steps of one archive cycle.
///
/// The invariant is upload-before-delete: the purge transaction only
/// runs after cold storage has durably accepted the payload. A failure
/// between upload and purge leaves an orphaned archive object, which is
/// harmless; the next cycle uploads a fresh object and purges then.
pub struct ArchiveService {
    store: Arc<dyn ArchiveStore>,
    cold: Arc<dyn ColdStorage>,
    keep_hot: usize,
}

impl ArchiveService {
    /// Create a new archive service keeping `keep_hot` completed runs.
    #[must_use]
    pub fn new(store: Arc<dyn ArchiveStore>, cold: Arc<dyn ColdStorage>, keep_hot: usize) -> Self {
        Self {
            store,
            cold,
            keep_hot,
        }
    }

    /// Run one archive cycle for a company.
    pub async fn archive_company(&self, company_id: &str) -> AppResult<ArchiveOutcome> {
        let runs = self.store.runs_for_company(company_id).await?;
        let completed_runs = runs
            .iter()
            .filter(|run| run.status == report_run::RunStatus::Completed)
            .count();

        let overflow = overflow_run_ids(&runs, self.keep_hot);
        if overflow.is_empty() {
            tracing::debug!(
                company_id = %company_id,
                completed_runs,
                keep_hot = self.keep_hot,
                "No runs overflow the retention window, skipping archive"
            );
            return Ok(ArchiveOutcome::Skipped { completed_runs });
        }

        let collected = self.store.collect_responses(&overflow).await?;
        let payload = ArchivePayload::build(company_id, &overflow, collected);
        let body = payload.to_bytes()?;

        let key = generate_archive_key(company_id);
        let object = self.cold.upload(&key, &body).await?;

        tracing::info!(
            company_id = %company_id,
            archive_id = %object.archive_id,
            size = object.size,
            runs = overflow.len(),
            "Uploaded archive payload, purging hot rows"
        );

        let purged = self.store.purge_runs(&overflow, &object.archive_id).await?;

        tracing::info!(
            company_id = %company_id,
            archive_id = %object.archive_id,
            runs_marked = purged.runs_marked,
            responses_deleted = purged.responses_deleted,
            "Archive cycle complete"
        );

        Ok(ArchiveOutcome::Archived {
            archive_id: object.archive_id,
            runs_archived: overflow.len(),
            responses_deleted: purged.responses_deleted,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use beacon_common::ArchiveObject;
    use beacon_db::entities::report_run::RunStatus;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn run(id: &str, status: RunStatus, day: u32) -> report_run::Model {
        report_run::Model {
            id: id.to_string(),
            company_id: "c1".to_string(),
            status,
            step_status: None,
            archive_id: None,
            archived_at: None,
            created_at: Utc
                .with_ymd_and_hms(2024, 5, day, 6, 0, 0)
                .unwrap()
                .fixed_offset(),
            updated_at: None,
        }
    }

    fn visibility(id: &str, run_id: &str) -> visibility_response::Model {
        visibility_response::Model {
            id: id.to_string(),
            run_id: run_id.to_string(),
            question: "How visible is the brand?".to_string(),
            model: "gpt-test".to_string(),
            response: "Quite visible.".to_string(),
            metadata: serde_json::json!({}),
            created_at: Utc
                .with_ymd_and_hms(2024, 5, 1, 7, 0, 0)
                .unwrap()
                .fixed_offset(),
        }
    }

    #[derive(Default)]
    struct FakeStore {
        runs: Vec<report_run::Model>,
        responses: CollectedResponses,
        purge_error: Option<String>,
        purged: Mutex<Vec<(Vec<String>, String)>>,
    }

    #[async_trait]
    impl ArchiveStore for FakeStore {
        async fn runs_for_company(&self, _company_id: &str) -> AppResult<Vec<report_run::Model>> {
            Ok(self.runs.clone())
        }

        async fn collect_responses(&self, _run_ids: &[String]) -> AppResult<CollectedResponses> {
            Ok(self.responses.clone())
        }

        async fn purge_runs(
            &self,
            run_ids: &[String],
            archive_id: &str,
        ) -> AppResult<PurgeOutcome> {
            if let Some(message) = &self.purge_error {
                return Err(AppError::Database(message.clone()));
            }
            self.purged
                .lock()
                .unwrap()
                .push((run_ids.to_vec(), archive_id.to_string()));
            Ok(PurgeOutcome {
                responses_deleted: self.responses.len() as u64,
                runs_marked: run_ids.len() as u64,
            })
        }
    }

    #[derive(Default)]
    struct FakeCold {
        fail: bool,
        uploads: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl ColdStorage for FakeCold {
        async fn upload(&self, key: &str, data: &[u8]) -> AppResult<ArchiveObject> {
            if self.fail {
                return Err(AppError::ColdStorage("bucket unavailable".to_string()));
            }
            let size = data.len() as u64;
            self.uploads.lock().unwrap().push((key.to_string(), data.len()));
            Ok(ArchiveObject {
                archive_id: key.to_string(),
                size,
                md5: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            })
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self
                .uploads
                .lock()
                .unwrap()
                .iter()
                .any(|(stored, _)| stored == key))
        }
    }

    fn service(store: FakeStore, cold: FakeCold, keep: usize) -> (ArchiveService, Arc<FakeStore>, Arc<FakeCold>) {
        let store = Arc::new(store);
        let cold = Arc::new(cold);
        (
            ArchiveService::new(store.clone(), cold.clone(), keep),
            store,
            cold,
        )
    }

    #[tokio::test]
    async fn test_within_window_skips_without_upload_or_purge() {
        let store = FakeStore {
            runs: vec![
                run("r3", RunStatus::Completed, 3),
                run("r2", RunStatus::Completed, 2),
                run("r1", RunStatus::Completed, 1),
            ],
            ..FakeStore::default()
        };
        let (service, store, cold) = service(store, FakeCold::default(), 3);

        let outcome = service.archive_company("c1").await.unwrap();

        assert_eq!(outcome, ArchiveOutcome::Skipped { completed_runs: 3 });
        assert!(cold.uploads.lock().unwrap().is_empty());
        assert!(store.purged.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overflow_is_uploaded_then_purged() {
        let store = FakeStore {
            runs: vec![
                run("r5", RunStatus::Completed, 5),
                run("r4", RunStatus::Completed, 4),
                run("r3", RunStatus::Completed, 3),
                run("r2", RunStatus::Completed, 2),
                run("r1", RunStatus::Completed, 1),
            ],
            responses: CollectedResponses {
                visibility: vec![visibility("v1", "r1"), visibility("v2", "r2")],
                benchmark: Vec::new(),
            },
            ..FakeStore::default()
        };
        let (service, store, cold) = service(store, FakeCold::default(), 3);

        let outcome = service.archive_company("c1").await.unwrap();

        let ArchiveOutcome::Archived {
            archive_id,
            runs_archived,
            responses_deleted,
        } = outcome
        else {
            panic!("expected Archived outcome");
        };
        assert_eq!(runs_archived, 2);
        assert_eq!(responses_deleted, 2);
        assert!(archive_id.contains("/c1/"));

        assert_eq!(cold.uploads.lock().unwrap().len(), 1);
        let purged = store.purged.lock().unwrap();
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].0, vec!["r2".to_string(), "r1".to_string()]);
        assert_eq!(purged[0].1, archive_id);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_hot_data_untouched() {
        let store = FakeStore {
            runs: vec![
                run("r5", RunStatus::Completed, 5),
                run("r4", RunStatus::Completed, 4),
                run("r3", RunStatus::Completed, 3),
                run("r2", RunStatus::Completed, 2),
            ],
            ..FakeStore::default()
        };
        let cold = FakeCold {
            fail: true,
            ..FakeCold::default()
        };
        let (service, store, _cold) = service(store, cold, 3);

        let err = service.archive_company("c1").await.unwrap_err();

        assert!(matches!(err, AppError::ColdStorage(_)));
        assert!(store.purged.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_failure_surfaces_after_upload() {
        let store = FakeStore {
            runs: vec![
                run("r5", RunStatus::Completed, 5),
                run("r4", RunStatus::Completed, 4),
                run("r3", RunStatus::Completed, 3),
                run("r2", RunStatus::Completed, 2),
            ],
            purge_error: Some("deadlock detected".to_string()),
            ..FakeStore::default()
        };
        let (service, _store, cold) = service(store, FakeCold::default(), 3);

        let err = service.archive_company("c1").await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        // The upload happened; the orphaned object is tolerated.
        assert_eq!(cold.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_completed_runs_never_archive() {
        let store = FakeStore {
            runs: vec![
                run("r5", RunStatus::Failed, 5),
                run("r4", RunStatus::Running, 4),
                run("r3", RunStatus::Completed, 3),
                run("r2", RunStatus::Pending, 2),
                run("r1", RunStatus::Completed, 1),
            ],
            ..FakeStore::default()
        };
        let (service, store, cold) = service(store, FakeCold::default(), 3);

        let outcome = service.archive_company("c1").await.unwrap();

        assert_eq!(outcome, ArchiveOutcome::Skipped { completed_runs: 2 });
        assert!(cold.uploads.lock().unwrap().is_empty());
        assert!(store.purged.lock().unwrap().is_empty());
    }

    #[test]
    fn test_payload_groups_responses_by_run() {
        let collected = CollectedResponses {
            visibility: vec![visibility("v1", "r1"), visibility("v2", "r2")],
            benchmark: Vec::new(),
        };
        let payload =
            ArchivePayload::build("c1", &["r1".to_string(), "r2".to_string()], collected);

        assert_eq!(payload.company_id, "c1");
        assert_eq!(payload.runs.len(), 2);
        assert_eq!(payload.runs["r1"].visibility.len(), 1);
        assert_eq!(payload.runs["r2"].visibility.len(), 1);

        let bytes = payload.to_bytes().unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded["company_id"], "c1");
        assert!(decoded["runs"]["r1"]["visibility"].is_array());
    }
}
