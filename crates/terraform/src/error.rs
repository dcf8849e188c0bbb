//! Error types for the Terraform driver

use thiserror::Error;

/// Result type alias for driver operations
pub type TerraformResult<T> = std::result::Result<T, TerraformError>;

#[derive(Error, Debug)]
pub enum TerraformError {
    #[error("terraform binary not found: {0}")]
    BinaryNotFound(String),

    #[error("terraform {op} failed with exit code {exit_code}:\n{output}")]
    CommandFailed {
        op: &'static str,
        exit_code: i32,
        output: String,
    },

    #[error("terraform output '{name}' unavailable: {detail}")]
    OutputMissing { name: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
