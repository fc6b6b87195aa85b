//! Job payload definitions.

mod archive;
mod generate;

pub use archive::ArchiveJob;
pub use generate::GenerateReportJob;

/// Current job payload schema version.
///
/// Workers reject payloads carrying a different version as fatal: a
/// mismatched payload was enqueued by an incompatible deployment and
/// retrying it can never succeed.
pub const SCHEMA_VERSION: u32 = 1;

/// Serde default for the version field, so payloads enqueued before the
/// field existed decode as version 1.
pub(crate) const fn default_version() -> u32 {
    1
}
