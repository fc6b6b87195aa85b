//! Background job queue for beacon.
//!
//! Asynchronous report-lifecycle processing over Redis:
//!
//! - **Jobs**: report generation and archival payloads, schema-versioned
//! - **Workers**: archive worker running under Apalis
//! - **Dispatch**: Redis-backed implementation of the core dispatch trait
//! - **Scheduler**: named cron-style repeatable jobs and schedule fan-out
//! - **In-flight guard**: at-most-one cycle per company
//! - **Retry**: job error taxonomy with exponential backoff policy

pub mod dispatch_impl;
pub mod in_flight;
pub mod jobs;
pub mod retry;
pub mod scheduler;
pub mod workers;

pub use dispatch_impl::RedisDispatchService;
pub use in_flight::{InFlightGuard, InFlightRegistry};
pub use jobs::*;
pub use retry::{JobError, RetryConfig};
pub use scheduler::{
    run_daily_fanout, run_daily_fanout_with_retry, run_manual_fanout, CompanyCatalog,
    DbCompanyCatalog, MasterScheduler, DAILY_TRIGGER_JOB,
};
pub use workers::*;
