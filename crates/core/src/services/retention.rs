//! Hot-run retention policy.

use beacon_db::entities::report_run;

/// Default number of completed runs kept hot per company.
pub const DEFAULT_HOT_RUNS: usize = 3;

/// Compute the run ids that overflow the hot-retention window.
///
/// Only completed runs count against the window; the newest `keep` of
/// them stay hot and everything older overflows. Runs already stamped
/// with an archive id are excluded from the result so that a retried
/// archival cycle never re-selects work a prior cycle finished.
#[must_use]
pub fn overflow_run_ids(runs: &[report_run::Model], keep: usize) -> Vec<String> {
    let mut completed: Vec<&report_run::Model> = runs
        .iter()
        .filter(|run| run.status == report_run::RunStatus::Completed)
        .collect();
    completed.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    completed
        .into_iter()
        .skip(keep)
        .filter(|run| !run.is_archived())
        .map(|run| run.id.clone())
        .collect()
}
