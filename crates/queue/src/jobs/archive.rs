//! Archival job.

use serde::{Deserialize, Serialize};

use super::{default_version, SCHEMA_VERSION};

/// Job to run one archive cycle for a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveJob {
    /// Target company.
    pub company_id: String,

    /// Payload schema version.
    #[serde(default = "default_version")]
    pub version: u32,
}

impl ArchiveJob {
    /// Create a new archive job at the current schema version.
    #[must_use]
    pub const fn new(company_id: String) -> Self {
        Self {
            company_id,
            version: SCHEMA_VERSION,
        }
    }
}
