//! Input variables handed to the Terraform module.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single additional node pool, shaped like the module's
/// `additional_node_pools` map entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePool {
    pub max_node_count: u32,
    pub min_node_count: u32,
    pub node_count: u32,
    pub orchestrator_version: String,
    pub vm_size: String,
}

impl Default for NodePool {
    fn default() -> Self {
        Self {
            max_node_count: 2,
            min_node_count: 1,
            node_count: 1,
            orchestrator_version: "1.25.4".to_string(),
            vm_size: "Standard_B2ms".to_string(),
        }
    }
}

/// Input variables for one provisioning run.
///
/// Field names mirror the module's variable names exactly; the struct
/// flattens 1:1 into the `-var` arguments passed to the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunVars {
    /// Short cluster name, combined with environment and location into the
    /// full Azure resource name.
    pub name: String,
    pub environment: String,
    pub location: String,
    pub resource_group_name: String,
    pub dns_prefix: String,
    pub resource_count: u32,
    pub additional_node_pools: BTreeMap<String, NodePool>,
    /// Optional module flag provisioning a Log Analytics workspace for
    /// cluster telemetry; left out of the var set when unset so the
    /// module default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_telemetry_law: Option<bool>,
}

impl Default for RunVars {
    fn default() -> Self {
        let mut additional_node_pools = BTreeMap::new();
        additional_node_pools.insert("pool".to_string(), NodePool::default());
        Self {
            name: "cluster".to_string(),
            environment: "test".to_string(),
            location: "westus".to_string(),
            resource_group_name: "test".to_string(),
            dns_prefix: "tfprobe-test".to_string(),
            resource_count: 1,
            additional_node_pools,
            create_telemetry_law: None,
        }
    }
}

impl RunVars {
    /// Name the module gives the managed cluster:
    /// `{environment}-{location}-{name}-aks`.
    pub fn cluster_name(&self) -> String {
        format!("{}-{}-{}-aks", self.environment, self.location, self.name)
    }

    /// Check that every required variable is present and sane before
    /// anything touches the cloud.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("environment", &self.environment),
            ("location", &self.location),
            ("resource_group_name", &self.resource_group_name),
            ("dns_prefix", &self.dns_prefix),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "variable '{}' must be a non-empty string",
                    field
                )));
            }
        }
        for (key, pool) in &self.additional_node_pools {
            if key.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "node pool keys must be non-empty".to_string(),
                ));
            }
            if pool.orchestrator_version.trim().is_empty() || pool.vm_size.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "node pool '{}' is missing orchestrator_version or vm_size",
                    key
                )));
            }
            if pool.node_count < pool.min_node_count || pool.node_count > pool.max_node_count {
                return Err(Error::InvalidConfig(format!(
                    "node pool '{}': node_count {} outside [{}, {}]",
                    key, pool.node_count, pool.min_node_count, pool.max_node_count
                )));
            }
        }
        Ok(())
    }

    /// Append `suffix` to the cluster name and resource-group name so
    /// concurrent runs cannot collide on Azure resource names.
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.name = format!("{}-{}", self.name, suffix);
        self.resource_group_name = format!("{}-{}", self.resource_group_name, suffix);
        self
    }

    /// [`with_suffix`](Self::with_suffix) with a random 6-character suffix.
    pub fn with_unique_suffix(self) -> Self {
        let suffix = unique_suffix();
        self.with_suffix(&suffix)
    }

    /// Flatten into the ordered name-to-value map the driver turns into
    /// `-var` arguments.
    pub fn to_var_map(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(Error::InvalidConfig(
                "run variables must serialize to a map".to_string(),
            )),
        }
    }
}

/// Random lowercase alphanumeric suffix for resource names.
pub fn unique_suffix() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
