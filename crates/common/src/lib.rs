//! tfprobe Common Library
//!
//! Shared types and utilities for the tfprobe harness crates.

pub mod error;
pub mod fsutil;
pub mod teardown;
pub mod vars;

// Re-export commonly used types
pub use error::{Error, Result};
pub use teardown::{TeardownOutcome, TeardownStack};
pub use vars::{NodePool, RunVars};

/// tfprobe version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
