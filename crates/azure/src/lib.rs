//! tfprobe Azure Client
//!
//! Just enough of the Azure Resource Manager REST surface for the harness:
//! service-principal tokens, resource-group lifecycle, and managed-cluster
//! reads.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{Credentials, TokenProvider, DEFAULT_AUTHORITY};
pub use client::{AzureClient, ManagedCluster, ResourceGroup, DEFAULT_ENDPOINT};
pub use error::{AzureError, AzureResult};
