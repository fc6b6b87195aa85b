//! Business logic services.

#![allow(missing_docs)]

pub mod archive;
pub mod dispatch;
pub mod retention;
pub mod schedule;

pub use archive::{
    ArchiveOutcome, ArchivePayload, ArchiveService, ArchiveStore, DbArchiveStore, RunResponses,
};
pub use dispatch::{DispatchService, NoOpDispatch, ReportDispatch};
pub use retention::{DEFAULT_HOT_RUNS, overflow_run_ids};
pub use schedule::{
    ScheduleMode, SchedulePolicy, ScheduleService, ScheduleUpdateInput, should_generate_today,
};
