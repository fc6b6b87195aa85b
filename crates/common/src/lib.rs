//! Common utilities and shared types for beacon.
//!
//! This crate provides foundational components used across all beacon crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Cold storage**: Archive upload backends (local, S3-compatible)

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{ArchiveObject, ColdStorage, LocalArchiveStore, generate_archive_key};
#[cfg(feature = "s3")]
pub use storage::S3ArchiveStore;
