//! Master scheduler - cron-style repeatable jobs and schedule fan-out.
//!
//! The scheduler owns named repeatable jobs: registering under an
//! existing name replaces the previous registration, so restarts and
//! config reloads converge on exactly one task per name.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beacon_common::{AppError, AppResult};
use beacon_core::{should_generate_today, DispatchService, ReportDispatch, SchedulePolicy, ScheduleService};
use beacon_db::repositories::CompanyRepository;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::retry::RetryConfig;

/// Name of the daily report-trigger repeatable job.
pub const DAILY_TRIGGER_JOB: &str = "daily-report-trigger";

/// Enumerates companies and resolves their schedule policies for fan-out.
#[async_trait]
pub trait CompanyCatalog: Send + Sync {
    /// All company ids.
    async fn company_ids(&self) -> AppResult<Vec<String>>;

    /// The effective schedule policy for a company.
    async fn policy(&self, company_id: &str) -> AppResult<SchedulePolicy>;
}

/// Database-backed company catalog.
#[derive(Clone)]
pub struct DbCompanyCatalog {
    company_repo: CompanyRepository,
    schedule_service: ScheduleService,
}

impl DbCompanyCatalog {
    /// Create a new database-backed catalog.
    #[must_use]
    pub const fn new(company_repo: CompanyRepository, schedule_service: ScheduleService) -> Self {
        Self {
            company_repo,
            schedule_service,
        }
    }
}

#[async_trait]
impl CompanyCatalog for DbCompanyCatalog {
    async fn company_ids(&self) -> AppResult<Vec<String>> {
        self.company_repo.find_all_ids().await
    }

    async fn policy(&self, company_id: &str) -> AppResult<SchedulePolicy> {
        self.schedule_service.effective_policy(company_id).await
    }
}

/// The daily fan-out pass: consult the decision engine per company and
/// enqueue a generate job for each eligible one.
///
/// Enumeration and hard per-company errors propagate so the queue
/// retries the whole pass; malformed policy data has already failed
/// open at resolution time and never aborts the loop.
pub async fn run_daily_fanout(
    catalog: &dyn CompanyCatalog,
    dispatch: &dyn ReportDispatch,
    now_utc: DateTime<Utc>,
) -> AppResult<usize> {
    let company_ids = catalog.company_ids().await?;
    let total = company_ids.len();
    let mut enqueued = 0;

    for company_id in &company_ids {
        let policy = catalog.policy(company_id).await?;
        if should_generate_today(&policy, now_utc) {
            dispatch.enqueue_generate_report(company_id).await?;
            enqueued += 1;
        } else {
            debug!(company_id = %company_id, "Company not scheduled today");
        }
    }

    info!(total, enqueued, "Daily fan-out complete");
    Ok(enqueued)
}

/// Run the daily fan-out pass, re-attempting failed passes with
/// bounded exponential backoff.
///
/// Each attempt re-reads the clock, so a pass delayed across a day
/// boundary fans out against the current day. Once the retry budget is
/// exhausted the last error propagates.
pub async fn run_daily_fanout_with_retry(
    catalog: &dyn CompanyCatalog,
    dispatch: &dyn ReportDispatch,
    retry: &RetryConfig,
) -> AppResult<usize> {
    let mut attempt = 0;
    loop {
        match run_daily_fanout(catalog, dispatch, Utc::now()).await {
            Ok(enqueued) => return Ok(enqueued),
            Err(e) if retry.should_retry(attempt) => {
                let delay = retry.delay_for_attempt(attempt);
                warn!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Daily fan-out failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Manual full fan-out: enqueue a generate job for every company,
/// bypassing the decision engine. Operator recovery path.
pub async fn run_manual_fanout(
    catalog: &dyn CompanyCatalog,
    dispatch: &dyn ReportDispatch,
) -> AppResult<usize> {
    let company_ids = catalog.company_ids().await?;

    for company_id in &company_ids {
        dispatch.enqueue_generate_report(company_id).await?;
    }

    info!(enqueued = company_ids.len(), "Manual fan-out complete");
    Ok(company_ids.len())
}

/// Owns named repeatable jobs driven by cron expressions.
#[derive(Default)]
pub struct MasterScheduler {
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl MasterScheduler {
    /// Create a scheduler with no registrations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repeatable job under a name.
    ///
    /// If the name is already registered, the previous task is aborted
    /// before the new one is spawned; registration is repeatable and
    /// idempotent per name.
    pub async fn register_repeatable<F, Fut>(
        &self,
        name: &str,
        cron_expr: &str,
        task: F,
    ) -> AppResult<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let schedule = cron_expr
            .parse::<cron::Schedule>()
            .map_err(|e| AppError::Config(format!("Invalid cron expression '{cron_expr}': {e}")))?;

        let mut jobs = self.jobs.lock().await;
        if let Some(previous) = jobs.remove(name) {
            previous.abort();
            info!(job = %name, "Replaced existing repeatable job");
        }

        let job_name = name.to_string();
        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    info!(job = %job_name, "Cron schedule exhausted, stopping");
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                tokio::time::sleep(wait).await;

                debug!(job = %job_name, "Running repeatable job");
                task().await;
            }
        });

        jobs.insert(name.to_string(), handle);
        info!(job = %name, cron = %cron_expr, "Registered repeatable job");
        Ok(())
    }

    /// Remove a repeatable job. Returns whether it existed.
    pub async fn remove_repeatable(&self, name: &str) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.remove(name) {
            Some(handle) => {
                handle.abort();
                info!(job = %name, "Removed repeatable job");
                true
            }
            None => false,
        }
    }

    /// Names of the currently registered jobs, sorted.
    pub async fn registered_jobs(&self) -> Vec<String> {
        let jobs = self.jobs.lock().await;
        let mut names: Vec<String> = jobs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Abort every registered job. Part of graceful shutdown.
    pub async fn stop(&self) {
        let mut jobs = self.jobs.lock().await;
        for (name, handle) in jobs.drain() {
            handle.abort();
            debug!(job = %name, "Stopped repeatable job");
        }
        info!("Master scheduler stopped");
    }

    /// Register the daily report trigger.
    ///
    /// A failing pass is retried with backoff per `retry` before the
    /// trigger gives up until the next cron tick.
    pub async fn schedule_daily_trigger(
        &self,
        cron_expr: &str,
        catalog: Arc<dyn CompanyCatalog>,
        dispatch: DispatchService,
        retry: RetryConfig,
    ) -> AppResult<()> {
        self.register_repeatable(DAILY_TRIGGER_JOB, cron_expr, move || {
            let catalog = catalog.clone();
            let dispatch = dispatch.clone();
            let retry = retry.clone();
            async move {
                match run_daily_fanout_with_retry(catalog.as_ref(), dispatch.as_ref(), &retry)
                    .await
                {
                    Ok(enqueued) => {
                        info!(enqueued, "Daily trigger pass finished");
                    }
                    Err(e) => {
                        error!(error = %e, "Daily trigger pass failed after exhausting retries");
                    }
                }
            }
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use beacon_core::{NoOpDispatch, ScheduleMode};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    // A Monday at noon UTC.
    fn monday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    struct FakeCatalog {
        companies: Vec<(String, SchedulePolicy)>,
        fail_enumeration: bool,
    }

    impl FakeCatalog {
        fn new(companies: Vec<(&str, ScheduleMode)>) -> Self {
            Self {
                companies: companies
                    .into_iter()
                    .map(|(id, mode)| {
                        (
                            id.to_string(),
                            SchedulePolicy {
                                mode,
                                ..SchedulePolicy::default()
                            },
                        )
                    })
                    .collect(),
                fail_enumeration: false,
            }
        }
    }

    #[async_trait]
    impl CompanyCatalog for FakeCatalog {
        async fn company_ids(&self) -> AppResult<Vec<String>> {
            if self.fail_enumeration {
                return Err(AppError::Database("connection refused".to_string()));
            }
            Ok(self.companies.iter().map(|(id, _)| id.clone()).collect())
        }

        async fn policy(&self, company_id: &str) -> AppResult<SchedulePolicy> {
            self.companies
                .iter()
                .find(|(id, _)| id == company_id)
                .map(|(_, policy)| policy.clone())
                .ok_or_else(|| AppError::CompanyNotFound(company_id.to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingDispatch {
        generated: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl ReportDispatch for RecordingDispatch {
        async fn enqueue_generate_report(&self, company_id: &str) -> AppResult<()> {
            self.generated.lock().unwrap().push(company_id.to_string());
            Ok(())
        }

        async fn enqueue_archive(&self, _company_id: &str) -> AppResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_daily_fanout_enqueues_only_eligible_companies() {
        let catalog = FakeCatalog::new(vec![
            ("c-daily", ScheduleMode::Daily),
            ("c-manual", ScheduleMode::Manual),
            ("c-unknown", ScheduleMode::Unknown),
        ]);
        let dispatch = RecordingDispatch::default();

        let enqueued = run_daily_fanout(&catalog, &dispatch, monday_noon())
            .await
            .unwrap();

        assert_eq!(enqueued, 2);
        let generated = dispatch.generated.lock().unwrap();
        assert_eq!(*generated, vec!["c-daily", "c-unknown"]);
    }

    #[tokio::test]
    async fn test_manual_fanout_enqueues_everyone() {
        let catalog = FakeCatalog::new(vec![
            ("c1", ScheduleMode::Manual),
            ("c2", ScheduleMode::Manual),
            ("c3", ScheduleMode::Daily),
        ]);
        let dispatch = RecordingDispatch::default();

        let enqueued = run_manual_fanout(&catalog, &dispatch).await.unwrap();

        assert_eq!(enqueued, 3);
        assert_eq!(dispatch.generated.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fanout_propagates_enumeration_failure() {
        let mut catalog = FakeCatalog::new(vec![("c1", ScheduleMode::Daily)]);
        catalog.fail_enumeration = true;
        let dispatch = RecordingDispatch::default();

        let err = run_daily_fanout(&catalog, &dispatch, monday_noon())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(dispatch.generated.lock().unwrap().is_empty());
    }

    // Fails the first `failures` enumerations, then behaves normally.
    struct FlakyCatalog {
        inner: FakeCatalog,
        failures_left: AtomicU32,
        enumerations: AtomicU32,
    }

    impl FlakyCatalog {
        fn new(companies: Vec<(&str, ScheduleMode)>, failures: u32) -> Self {
            Self {
                inner: FakeCatalog::new(companies),
                failures_left: AtomicU32::new(failures),
                enumerations: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl CompanyCatalog for FlakyCatalog {
        async fn company_ids(&self) -> AppResult<Vec<String>> {
            self.enumerations.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(AppError::Database("connection refused".to_string()));
            }
            self.inner.company_ids().await
        }

        async fn policy(&self, company_id: &str) -> AppResult<SchedulePolicy> {
            self.inner.policy(company_id).await
        }
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_failed_fanout_pass_is_reattempted() {
        let catalog = FlakyCatalog::new(vec![("c1", ScheduleMode::Daily)], 2);
        let dispatch = RecordingDispatch::default();

        let enqueued = run_daily_fanout_with_retry(&catalog, &dispatch, &fast_retry(5))
            .await
            .unwrap();

        assert_eq!(enqueued, 1);
        assert_eq!(catalog.enumerations.load(Ordering::SeqCst), 3);
        assert_eq!(*dispatch.generated.lock().unwrap(), vec!["c1"]);
    }

    #[tokio::test]
    async fn test_fanout_retry_budget_exhaustion_surfaces_error() {
        let catalog = FlakyCatalog::new(vec![("c1", ScheduleMode::Daily)], u32::MAX);

        let err = run_daily_fanout_with_retry(&catalog, &NoOpDispatch, &fast_retry(1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        // Initial attempt plus one retry.
        assert_eq!(catalog.enumerations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_register_repeatable_replaces_same_name() {
        let scheduler = MasterScheduler::new();

        // Far-future schedule; the task body never runs in this test.
        scheduler
            .register_repeatable("job-a", "0 0 0 1 1 * 2099", || async {})
            .await
            .unwrap();
        scheduler
            .register_repeatable("job-a", "0 0 0 1 1 * 2099", || async {})
            .await
            .unwrap();

        assert_eq!(scheduler.registered_jobs().await, vec!["job-a"]);
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_remove_repeatable() {
        let scheduler = MasterScheduler::new();
        scheduler
            .register_repeatable("job-a", "0 0 0 1 1 * 2099", || async {})
            .await
            .unwrap();

        assert!(scheduler.remove_repeatable("job-a").await);
        assert!(!scheduler.remove_repeatable("job-a").await);
        assert!(scheduler.registered_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_cron_expression_is_rejected() {
        let scheduler = MasterScheduler::new();
        let err = scheduler
            .register_repeatable("job-a", "not a cron line", || async {})
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
        assert!(scheduler.registered_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_clears_all_jobs() {
        let scheduler = MasterScheduler::new();
        scheduler
            .register_repeatable("job-a", "0 0 0 1 1 * 2099", || async {})
            .await
            .unwrap();
        scheduler
            .register_repeatable("job-b", "0 0 0 1 1 * 2099", || async {})
            .await
            .unwrap();

        scheduler.stop().await;
        assert!(scheduler.registered_jobs().await.is_empty());
    }
}
