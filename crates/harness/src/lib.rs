//! tfprobe Harness
//!
//! Orchestrates a full integration-test cycle against a Terraform AKS
//! module: write the provider file, create the resource group, apply the
//! module, verify the managed cluster and its node pools, then tear
//! everything down in inverse order of acquisition.

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod verify;

pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use report::{PhaseOutcome, RunReport};
pub use runner::Runner;
