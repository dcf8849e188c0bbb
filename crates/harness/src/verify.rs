//! Post-apply verification against the management and cluster APIs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::config::{Config, KubeConfigOptions, Kubeconfig};
use serde::Serialize;
use tracing::{debug, info};

use tfprobe_azure::AzureClient;

use crate::error::{HarnessError, HarnessResult};

/// Provisioning-state value a healthy cluster reports.
pub const PROVISIONING_SUCCEEDED: &str = "Succeeded";

/// Fetch the managed cluster and assert its provisioning state and name.
pub async fn verify_managed_cluster(
    azure: &AzureClient,
    resource_group: &str,
    expected_name: &str,
) -> HarnessResult<()> {
    let cluster = azure
        .get_managed_cluster(resource_group, expected_name)
        .await?;
    let state = cluster.provisioning_state();
    if state != PROVISIONING_SUCCEEDED {
        return Err(HarnessError::ProvisioningState {
            cluster: expected_name.to_string(),
            state: state.to_string(),
        });
    }
    // the API echoes the name from the URL, but a mismatch here would mean
    // the module named the cluster something else entirely
    if cluster.name != expected_name {
        return Err(HarnessError::ClusterName {
            expected: expected_name.to_string(),
            actual: cluster.name,
        });
    }
    info!("managed cluster '{}' is {}", cluster.name, state);
    Ok(())
}

/// One worker node as the verifier sees it.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

/// Read-only node access, implemented against the live API and by test
/// stubs.
#[async_trait]
pub trait NodeLister: Send + Sync {
    async fn list_nodes(&self) -> HarnessResult<Vec<NodeInfo>>;
}

/// Node lister backed by a kube client built from a kubeconfig file.
pub struct KubeNodeLister {
    client: kube::Client,
}

impl KubeNodeLister {
    pub async fn from_kubeconfig(path: &Path) -> HarnessResult<Self> {
        let kubeconfig = Kubeconfig::read_from(path)?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await?;
        let client = kube::Client::try_from(config)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NodeLister for KubeNodeLister {
    async fn list_nodes(&self) -> HarnessResult<Vec<NodeInfo>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api.list(&ListParams::default()).await?;
        Ok(nodes
            .items
            .into_iter()
            .map(|node| NodeInfo {
                name: node.metadata.name.unwrap_or_default(),
                labels: node.metadata.labels.unwrap_or_default(),
            })
            .collect())
    }
}

/// Result of checking one pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolCheck {
    pub pool: String,
    pub nodes_checked: usize,
}

/// Check every configured pool against the node list.
///
/// A pool's nodes are the ones whose name contains the pool key (AKS bakes
/// the pool name into its VMSS instance names). Every matching node must
/// carry the agent-pool label with exactly the pool key as its value, and
/// a pool with no matching nodes at all fails the run.
pub async fn verify_node_pools(
    lister: &dyn NodeLister,
    pools: &[String],
    label_key: &str,
) -> HarnessResult<Vec<PoolCheck>> {
    let nodes = lister.list_nodes().await?;
    debug!("cluster reports {} node(s)", nodes.len());
    let mut checks = Vec::with_capacity(pools.len());
    for pool in pools {
        let matching: Vec<&NodeInfo> = nodes
            .iter()
            .filter(|node| node.name.contains(pool.as_str()))
            .collect();
        if matching.is_empty() {
            return Err(HarnessError::NoNodesForPool { pool: pool.clone() });
        }
        for node in &matching {
            let label = node.labels.get(label_key).cloned().unwrap_or_default();
            if label != *pool {
                return Err(HarnessError::NodeLabelMismatch {
                    pool: pool.clone(),
                    node: node.name.clone(),
                    label,
                });
            }
        }
        info!(
            "pool '{}': {} node(s) carry the expected label",
            pool,
            matching.len()
        );
        checks.push(PoolCheck {
            pool: pool.clone(),
            nodes_checked: matching.len(),
        });
    }
    Ok(checks)
}

/// Write kubeconfig `contents` under `dir` and return the file path. The
/// file holds cluster-admin credentials, so it is written owner-only.
pub fn write_kubeconfig(dir: &Path, contents: &str) -> HarnessResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join("config");
    std::fs::write(&path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }
    info!("kubeconfig written to {}", path.display());
    Ok(path)
}
