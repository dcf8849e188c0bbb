//! Error types for the harness

use thiserror::Error;

/// Result type alias for harness operations
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Azure(#[from] tfprobe_azure::AzureError),

    #[error(transparent)]
    Terraform(#[from] tfprobe_terraform::TerraformError),

    #[error(transparent)]
    Common(#[from] tfprobe_common::Error),

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("cluster '{cluster}' reports provisioning state '{state}', expected 'Succeeded'")]
    ProvisioningState { cluster: String, state: String },

    #[error("cluster name mismatch: expected '{expected}', API returned '{actual}'")]
    ClusterName { expected: String, actual: String },

    #[error("no node name contains pool key '{pool}'")]
    NoNodesForPool { pool: String },

    #[error("node '{node}' matched pool '{pool}' but carries agent-pool label '{label}'")]
    NodeLabelMismatch {
        pool: String,
        node: String,
        label: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
