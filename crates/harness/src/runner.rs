//! Lifecycle runner: provision, verify, tear down.

use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use tfprobe_azure::{AzureClient, Credentials};
use tfprobe_common::teardown::{TeardownOutcome, TeardownStack};
use tfprobe_common::fsutil;
use tfprobe_terraform::TerraformCli;

use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::report::{PhaseOutcome, RunReport};
use crate::verify::{self, KubeNodeLister, NodeLister, PoolCheck};

/// Provider block materialized for the module before `init`.
pub const PROVIDER_FILE_CONTENT: &str = r#"provider "azurerm" {
  features {}
}
"#;

/// Terraform output holding the cluster-admin kubeconfig.
const KUBECONFIG_OUTPUT: &str = "admin_kube_config";

/// Orchestrates a full provision, verify, and teardown cycle.
///
/// Cleanup actions are registered on a [`TeardownStack`] immediately before
/// the matching acquisition, so teardown always runs in inverse order:
/// `terraform destroy`, then the resource-group delete, then the local
/// artifact sweep. Teardown runs whether the forward phases succeeded or
/// not, and a teardown failure never replaces the forward error in the
/// report.
pub struct Runner {
    config: HarnessConfig,
    azure: AzureClient,
    terraform: TerraformCli,
    node_lister: Option<Box<dyn NodeLister>>,
}

impl Runner {
    /// Build a runner from configuration, with credentials taken from the
    /// environment.
    pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
        let azure = AzureClient::new(
            Credentials::from_env()?,
            &config.azure.endpoint,
            &config.azure.authority,
        )?;
        let terraform = TerraformCli::new(config.terraform_options()?);
        Ok(Self {
            config,
            azure,
            terraform,
            node_lister: None,
        })
    }

    /// Build a runner around pre-built clients.
    pub fn with_clients(
        config: HarnessConfig,
        azure: AzureClient,
        terraform: TerraformCli,
    ) -> Self {
        Self {
            config,
            azure,
            terraform,
            node_lister: None,
        }
    }

    /// Use `lister` for node verification instead of building a client
    /// from the written kubeconfig.
    pub fn set_node_lister(&mut self, lister: Box<dyn NodeLister>) {
        self.node_lister = Some(lister);
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the full lifecycle. The report carries per-phase and
    /// per-teardown outcomes; it is returned even when the run failed.
    pub async fn run(&mut self) -> RunReport {
        self.run_with_teardown(true).await
    }

    /// Full lifecycle, optionally leaving the deployment in place for
    /// debugging.
    pub async fn run_with_teardown(&mut self, teardown_enabled: bool) -> RunReport {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        let cluster_name = self.config.run.cluster_name();
        info!("run {} starting for cluster '{}'", run_id, cluster_name);

        let mut phases = Vec::new();
        let mut stack = TeardownStack::new();
        let outcome = self.forward(&mut stack, &mut phases).await;

        if let Err(err) = &outcome {
            error!("run failed: {err}");
        }

        let teardown = if teardown_enabled {
            stack.run_all().await
        } else {
            warn!(
                "teardown disabled; leaving {} cleanup action(s) unexecuted",
                stack.len()
            );
            Vec::new()
        };

        RunReport {
            run_id,
            cluster_name,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            success: outcome.is_ok(),
            phases,
            teardown,
            error: outcome.err().map(|err| err.to_string()),
        }
    }

    /// Forward phases, failing fast on the first error. Cleanup for each
    /// acquired resource is registered on `stack` before the acquisition
    /// is attempted, so a half-finished run still tears down everything it
    /// may have created.
    async fn forward(
        &self,
        stack: &mut TeardownStack,
        phases: &mut Vec<PhaseOutcome>,
    ) -> HarnessResult<()> {
        let resource_group = self.config.run.resource_group_name.clone();
        let location = self.config.run.location.clone();
        let cluster_name = self.config.run.cluster_name();

        phase(phases, "validate-config", async {
            self.config.run.validate()?;
            Ok(())
        })
        .await?;

        // Registered first so it runs last, after the infrastructure that
        // produced the artifacts is gone.
        {
            let base = self.config.work_dir.clone();
            let files = self.config.cleanup.files.clone();
            stack.push("sweep-local-files", move || async move {
                let removed = fsutil::sweep(&base, &files)?;
                info!("swept {} local artifact(s)", removed);
                Ok(())
            });
        }

        phase(phases, "write-provider-file", async {
            let path = self.config.provider_file_path();
            if fsutil::create_if_absent(&path, PROVIDER_FILE_CONTENT)? {
                info!("wrote provider file {}", path.display());
            }
            Ok(())
        })
        .await?;

        // Deleting a group that never materialized is a no-op, so the
        // delete is registered before the create is attempted.
        {
            let azure = self.azure.clone();
            let name = resource_group.clone();
            stack.push("delete-resource-group", move || async move {
                azure.delete_resource_group(&name).await?;
                Ok(())
            });
        }

        phase(phases, "create-resource-group", async {
            self.azure
                .create_resource_group(&resource_group, &location)
                .await?;
            Ok(())
        })
        .await?;

        // Destroy consumes the state files the sweeper removes, so it must
        // sit above the sweep on the stack.
        {
            let terraform = self.terraform.clone();
            stack.push("terraform-destroy", move || async move {
                terraform.destroy().await?;
                Ok(())
            });
        }

        phase(phases, "terraform-apply", async {
            self.terraform.init_and_apply().await?;
            Ok(())
        })
        .await?;

        phase(
            phases,
            "verify-managed-cluster",
            verify::verify_managed_cluster(&self.azure, &resource_group, &cluster_name),
        )
        .await?;

        let kubeconfig_path = phase(phases, "write-kubeconfig", async {
            let contents = self.terraform.output(KUBECONFIG_OUTPUT).await?;
            verify::write_kubeconfig(&self.config.kubeconfig_dir(), &contents)
        })
        .await?;

        phase(phases, "verify-node-pools", async {
            let pools: Vec<String> = self
                .config
                .run
                .additional_node_pools
                .keys()
                .cloned()
                .collect();
            let label_key = &self.config.kubernetes.agent_pool_label;
            match &self.node_lister {
                Some(lister) => {
                    verify::verify_node_pools(lister.as_ref(), &pools, label_key).await?;
                }
                None => {
                    let lister = KubeNodeLister::from_kubeconfig(&kubeconfig_path).await?;
                    verify::verify_node_pools(&lister, &pools, label_key).await?;
                }
            }
            Ok(())
        })
        .await?;

        info!("cluster '{}' verified", cluster_name);
        Ok(())
    }

    /// Verify an existing deployment without provisioning or destroying
    /// anything. Expects the kubeconfig from a previous `--keep` run.
    pub async fn verify_only(&self) -> HarnessResult<Vec<PoolCheck>> {
        let cluster_name = self.config.run.cluster_name();
        verify::verify_managed_cluster(
            &self.azure,
            &self.config.run.resource_group_name,
            &cluster_name,
        )
        .await?;

        let pools: Vec<String> = self
            .config
            .run
            .additional_node_pools
            .keys()
            .cloned()
            .collect();
        let label_key = &self.config.kubernetes.agent_pool_label;
        match &self.node_lister {
            Some(lister) => verify::verify_node_pools(lister.as_ref(), &pools, label_key).await,
            None => {
                let lister = KubeNodeLister::from_kubeconfig(&self.config.kubeconfig_path()).await?;
                verify::verify_node_pools(&lister, &pools, label_key).await
            }
        }
    }

    /// Teardown only: destroy the module, delete the resource group, sweep
    /// the local artifacts. Used to clean up after `--keep` runs and
    /// crashed processes.
    pub async fn destroy_only(&self) -> Vec<TeardownOutcome> {
        let mut stack = TeardownStack::new();
        {
            let base = self.config.work_dir.clone();
            let files = self.config.cleanup.files.clone();
            stack.push("sweep-local-files", move || async move {
                let removed = fsutil::sweep(&base, &files)?;
                info!("swept {} local artifact(s)", removed);
                Ok(())
            });
        }
        {
            let azure = self.azure.clone();
            let name = self.config.run.resource_group_name.clone();
            stack.push("delete-resource-group", move || async move {
                azure.delete_resource_group(&name).await?;
                Ok(())
            });
        }
        {
            let terraform = self.terraform.clone();
            stack.push("terraform-destroy", move || async move {
                terraform.destroy().await?;
                Ok(())
            });
        }
        stack.run_all().await
    }
}

/// Run one forward phase, recording its outcome before propagating any
/// error.
async fn phase<T, Fut>(
    phases: &mut Vec<PhaseOutcome>,
    name: &str,
    fut: Fut,
) -> HarnessResult<T>
where
    Fut: std::future::Future<Output = HarnessResult<T>>,
{
    info!("phase: {}", name);
    let start = Instant::now();
    match fut.await {
        Ok(value) => {
            phases.push(PhaseOutcome {
                name: name.to_string(),
                success: true,
                duration_ms: start.elapsed().as_millis() as u64,
                error: None,
            });
            Ok(value)
        }
        Err(err) => {
            phases.push(PhaseOutcome {
                name: name.to_string(),
                success: false,
                duration_ms: start.elapsed().as_millis() as u64,
                error: Some(err.to_string()),
            });
            Err(err)
        }
    }
}
