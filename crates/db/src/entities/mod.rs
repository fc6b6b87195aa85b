//! Database entities.

#![allow(missing_docs)]

pub mod benchmark_response;
pub mod company;
pub mod report_run;
pub mod report_schedule;
pub mod report_schedule_date;
pub mod visibility_response;

pub use benchmark_response::Entity as BenchmarkResponse;
pub use company::Entity as Company;
pub use report_run::Entity as ReportRun;
pub use report_schedule::Entity as ReportSchedule;
pub use report_schedule_date::Entity as ReportScheduleDate;
pub use visibility_response::Entity as VisibilityResponse;
