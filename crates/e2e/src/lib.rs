//! tfprobe E2E Fixtures
//!
//! Offline stand-ins for everything the harness talks to, so the full
//! lifecycle can run as an ordinary `cargo test`:
//!
//! - [`arm_stub::ArmStub`] serves the management API surface the harness
//!   touches (token endpoint, resource groups, managed clusters) on a
//!   loopback port and records every call.
//! - [`fake_terraform::FakeTerraform`] writes a small shell script that
//!   stands in for the real binary, with knobs for transient and
//!   permanent apply failures.
//! - [`StubNodeLister`] feeds the node-pool verifier a fixed node set.
//!
//! The one test that talks to real infrastructure lives in
//! `tests/aks_live.rs` and is `#[ignore]`d.

pub mod arm_stub;
pub mod fake_terraform;

use std::collections::BTreeMap;

use async_trait::async_trait;

use tfprobe_harness::verify::{NodeInfo, NodeLister};
use tfprobe_harness::HarnessResult;

/// Node lister returning a fixed node set.
pub struct StubNodeLister {
    nodes: Vec<NodeInfo>,
}

impl StubNodeLister {
    pub fn new(nodes: Vec<NodeInfo>) -> Self {
        Self { nodes }
    }
}

#[async_trait]
impl NodeLister for StubNodeLister {
    async fn list_nodes(&self) -> HarnessResult<Vec<NodeInfo>> {
        Ok(self.nodes.clone())
    }
}

/// Node fixture with an optional agent-pool label.
pub fn node(name: &str, pool_label: Option<(&str, &str)>) -> NodeInfo {
    let mut labels = BTreeMap::new();
    labels.insert("kubernetes.io/os".to_string(), "linux".to_string());
    if let Some((key, value)) = pool_label {
        labels.insert(key.to_string(), value.to_string());
    }
    NodeInfo {
        name: name.to_string(),
        labels,
    }
}
