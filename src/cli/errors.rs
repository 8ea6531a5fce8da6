//! CLI-specific error types
//!
//! Everything here is fatal: it stops the invocation before any per-item
//! work and maps to exit status 1. Per-item failures never appear as a
//! `CliError`; they live in the operation report.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backing store failed before per-item work started.
    #[error("connectivity error: {0}")]
    Connectivity(#[from] StoreError),

    #[error("usage error: {0}")]
    Usage(String),
}
