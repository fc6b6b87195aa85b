//! Database repositories.

#![allow(missing_docs)]

mod archive;
mod company;
mod report_run;
mod report_schedule;

pub use archive::{ArchiveRepository, CollectedResponses, PurgeOutcome};
pub use company::{CompanyRepository, CreateCompanyInput};
pub use report_run::ReportRunRepository;
pub use report_schedule::{ReportScheduleRepository, UpsertScheduleInput};
