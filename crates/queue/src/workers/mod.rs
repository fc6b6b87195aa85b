//! Apalis worker functions.

mod archive;

pub use archive::{archive_worker, ArchiveContext};
