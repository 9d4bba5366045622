//! Common error types for Rollcall

use thiserror::Error;

use crate::export::ExportKind;

/// Common result type for Rollcall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the server and the kiosk
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed request field
    #[error("{0}")]
    Validation(String),

    /// Identifier has no directory record
    #[error("{0}")]
    NotFound(String),

    /// Directory transport failure, timeout, or malformed payload
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Export requested with zero rows
    #[error("No {0} records to export")]
    EmptyExport(ExportKind),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
