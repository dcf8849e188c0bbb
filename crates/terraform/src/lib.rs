//! tfprobe Terraform Driver
//!
//! Wraps the installed `terraform` binary: init, apply, destroy, and output
//! reads, with variables rendered as literal `-var` arguments and a bounded
//! retry loop for transient infrastructure failures.

pub mod cmd;
pub mod error;
pub mod options;
pub mod retry;

pub use cmd::{CommandOutput, TerraformCli};
pub use error::{TerraformError, TerraformResult};
pub use options::Options;
pub use retry::RetryableError;
