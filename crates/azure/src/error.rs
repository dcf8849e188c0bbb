//! Error types for the Azure client

use thiserror::Error;

/// Result type alias for Azure operations
pub type AzureResult<T> = std::result::Result<T, AzureError>;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("token request failed: {0}")]
    Token(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{operation} failed with status {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },
}
