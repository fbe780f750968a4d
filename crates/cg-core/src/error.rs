//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

/// The base error type for `cg-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("parameter '{0}' not found")]
    MissingParameter(String),

    #[error("parameter '{key}' has type {found}, expected {expected}")]
    ParameterType {
        key:      String,
        expected: &'static str,
        found:    &'static str,
    },

    #[error("invalid schedule: {0}")]
    Schedule(String),

    #[error("invalid distribution: {0}")]
    Distribution(String),
}

/// Shorthand result type for `cg-core`.
pub type CoreResult<T> = Result<T, CoreError>;
