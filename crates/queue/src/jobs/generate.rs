//! Report generation job.

use serde::{Deserialize, Serialize};

use super::{default_version, SCHEMA_VERSION};

/// Job asking the external report worker to generate a report for a
/// company. This crate only enqueues it; consumption happens elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportJob {
    /// Target company.
    pub company_id: String,

    /// Payload schema version.
    #[serde(default = "default_version")]
    pub version: u32,
}

impl GenerateReportJob {
    /// Create a new generate job at the current schema version.
    #[must_use]
    pub const fn new(company_id: String) -> Self {
        Self {
            company_id,
            version: SCHEMA_VERSION,
        }
    }
}
