//! Harness configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tfprobe_common::vars::RunVars;
use tfprobe_terraform::Options;

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory holding the module; run artifacts land here too
    pub work_dir: PathBuf,

    /// Directory receiving the JSON run report; relative paths resolve
    /// under `work_dir`
    pub output_dir: PathBuf,

    /// Input variables for the module
    pub run: RunVars,

    /// Terraform driver settings
    pub terraform: TerraformSettings,

    /// Management API settings
    pub azure: AzureSettings,

    /// Node verification settings
    pub kubernetes: KubeSettings,

    /// Local artifact cleanup settings
    pub cleanup: CleanupSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            output_dir: PathBuf::from("test-results"),
            run: RunVars::default(),
            terraform: TerraformSettings::default(),
            azure: AzureSettings::default(),
            kubernetes: KubeSettings::default(),
            cleanup: CleanupSettings::default(),
        }
    }
}

/// Terraform driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformSettings {
    /// Binary name or absolute path
    pub binary: String,

    /// Retry attempts after a transient failure
    pub max_retries: u32,

    /// Seconds between retry attempts
    pub time_between_retries_secs: u64,
}

impl Default for TerraformSettings {
    fn default() -> Self {
        Self {
            binary: "terraform".to_string(),
            max_retries: 3,
            time_between_retries_secs: 5,
        }
    }
}

/// Management API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureSettings {
    /// Management endpoint
    pub endpoint: String,

    /// Token authority host
    pub authority: String,
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            endpoint: tfprobe_azure::DEFAULT_ENDPOINT.to_string(),
            authority: tfprobe_azure::DEFAULT_AUTHORITY.to_string(),
        }
    }
}

/// Node verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeSettings {
    /// Label AKS stamps on every node with its pool name
    pub agent_pool_label: String,

    /// Directory under `work_dir` receiving the kubeconfig
    pub kubeconfig_dir: String,
}

impl Default for KubeSettings {
    fn default() -> Self {
        Self {
            agent_pool_label: "kubernetes.azure.com/agentpool".to_string(),
            kubeconfig_dir: ".kube".to_string(),
        }
    }
}

/// Local artifact cleanup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    /// Entries under `work_dir` the sweeper removes
    pub files: Vec<String>,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            files: vec![
                "terraform.tfstate".to_string(),
                "terraform.tfstate.backup".to_string(),
                ".terraform.lock.hcl".to_string(),
                ".terraform".to_string(),
                ".kube".to_string(),
                "provider.tf".to_string(),
            ],
        }
    }
}

impl HarnessConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of the generated provider file
    pub fn provider_file_path(&self) -> PathBuf {
        self.work_dir.join("provider.tf")
    }

    /// Directory receiving the kubeconfig
    pub fn kubeconfig_dir(&self) -> PathBuf {
        self.work_dir.join(&self.kubernetes.kubeconfig_dir)
    }

    /// Path of the written kubeconfig
    pub fn kubeconfig_path(&self) -> PathBuf {
        self.kubeconfig_dir().join("config")
    }

    /// Directory receiving the run report, with a relative `output_dir`
    /// anchored at `work_dir` like every other artifact path.
    pub fn report_dir(&self) -> PathBuf {
        if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            self.work_dir.join(&self.output_dir)
        }
    }

    /// Driver options assembled from the terraform settings and the run
    /// variables.
    pub fn terraform_options(&self) -> tfprobe_common::Result<Options> {
        let mut options = Options::with_default_retryable_errors(self.work_dir.clone())
            .with_vars(self.run.to_var_map()?);
        options.binary = self.terraform.binary.clone();
        options.max_retries = self.terraform.max_retries;
        options.time_between_retries = Duration::from_secs(self.terraform.time_between_retries_secs);
        Ok(options)
    }
}
