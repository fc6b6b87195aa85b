//! Core business logic for beacon.

pub mod services;

pub use services::*;
