//! Full-lifecycle runs against the management stub and a scripted
//! terraform binary. No cloud access, no real cluster.

use std::fs;

use tempfile::TempDir;

use tfprobe_azure::{AzureClient, Credentials};
use tfprobe_e2e::arm_stub::ArmStub;
use tfprobe_e2e::fake_terraform::{FakeTerraform, SAMPLE_KUBECONFIG};
use tfprobe_e2e::{node, StubNodeLister};
use tfprobe_harness::{HarnessConfig, Runner};
use tfprobe_terraform::TerraformCli;

const AGENT_POOL_LABEL: &str = "kubernetes.azure.com/agentpool";
const CLUSTER_NAME: &str = "test-westus-cluster-aks";

fn stub_credentials() -> Credentials {
    Credentials {
        subscription_id: "00000000-0000-0000-0000-000000000000".to_string(),
        tenant_id: "stub-tenant".to_string(),
        client_id: "stub-client".to_string(),
        client_secret: "stub-secret".to_string(),
    }
}

/// Runner wired to the stub server, the fake binary, and a healthy
/// default node set.
fn build_runner(stub: &ArmStub, work: &TempDir, fake: &FakeTerraform) -> Runner {
    let binary = fake.install(&work.path().join("bin"));

    let mut config = HarnessConfig::default();
    config.work_dir = work.path().to_path_buf();
    config.output_dir = work.path().join("test-results");
    config.azure.endpoint = stub.endpoint();
    config.azure.authority = stub.authority();
    config.terraform.binary = binary.to_string_lossy().into_owned();
    config.terraform.time_between_retries_secs = 0;

    let azure = AzureClient::new(
        stub_credentials(),
        &config.azure.endpoint,
        &config.azure.authority,
    )
    .expect("stub client");
    let terraform = TerraformCli::new(config.terraform_options().expect("driver options"));

    let mut runner = Runner::with_clients(config, azure, terraform);
    runner.set_node_lister(Box::new(StubNodeLister::new(vec![node(
        "aks-pool-32315060-vmss000000",
        Some((AGENT_POOL_LABEL, "pool")),
    )])));
    runner
}

#[tokio::test]
async fn full_lifecycle_provisions_verifies_and_tears_down() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", CLUSTER_NAME, "Succeeded");
    let work = TempDir::new().unwrap();
    let mut runner = build_runner(&stub, &work, &FakeTerraform::new());

    let report = runner.run().await;

    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(report.cluster_name, CLUSTER_NAME);
    let phase_names: Vec<&str> = report.phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        phase_names,
        [
            "validate-config",
            "write-provider-file",
            "create-resource-group",
            "terraform-apply",
            "verify-managed-cluster",
            "write-kubeconfig",
            "verify-node-pools",
        ]
    );
    assert!(report.phases.iter().all(|p| p.success));

    // teardown ran in inverse registration order
    let teardown_labels: Vec<&str> = report.teardown.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(
        teardown_labels,
        ["terraform-destroy", "delete-resource-group", "sweep-local-files"]
    );
    assert!(report.teardown.iter().all(|t| t.success));

    // the group is gone from the stub and the artifacts from disk
    assert!(!stub.has_resource_group("test"));
    assert!(!work.path().join("terraform.tfstate").exists());
    assert!(!work.path().join("provider.tf").exists());
    assert!(!work.path().join(".kube").exists());

    // destroy saw the state file before the sweeper removed it
    let log = fs::read_to_string(work.path().join("tf-invocations.log")).unwrap();
    assert!(log.contains("destroy state=present"));
}

#[tokio::test]
async fn keep_mode_leaves_the_deployment_and_artifacts_in_place() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", CLUSTER_NAME, "Succeeded");
    let work = TempDir::new().unwrap();
    let mut runner = build_runner(&stub, &work, &FakeTerraform::new());

    let report = runner.run_with_teardown(false).await;

    assert!(report.success, "run failed: {:?}", report.error);
    assert!(report.teardown.is_empty());
    assert!(stub.has_resource_group("test"));
    assert!(work.path().join("terraform.tfstate").exists());

    // provider file has the minimal azurerm block
    let provider = fs::read_to_string(work.path().join("provider.tf")).unwrap();
    assert!(provider.contains("provider \"azurerm\""));
    assert!(provider.contains("features {}"));

    // kubeconfig was captured from the output, owner-only
    let kubeconfig_path = work.path().join(".kube/config");
    assert_eq!(fs::read_to_string(&kubeconfig_path).unwrap(), SAMPLE_KUBECONFIG);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&kubeconfig_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[tokio::test]
async fn existing_provider_file_is_not_overwritten() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", CLUSTER_NAME, "Succeeded");
    let work = TempDir::new().unwrap();
    let custom = "provider \"azurerm\" {\n  features {}\n  skip_provider_registration = true\n}\n";
    fs::write(work.path().join("provider.tf"), custom).unwrap();
    let mut runner = build_runner(&stub, &work, &FakeTerraform::new());

    let report = runner.run_with_teardown(false).await;

    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(fs::read_to_string(work.path().join("provider.tf")).unwrap(), custom);
}

#[tokio::test]
async fn failed_provisioning_state_fails_the_run_but_still_tears_down() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", CLUSTER_NAME, "Failed");
    let work = TempDir::new().unwrap();
    let mut runner = build_runner(&stub, &work, &FakeTerraform::new());

    let report = runner.run().await;

    assert!(!report.success);
    let error = report.error.as_deref().unwrap();
    assert!(error.contains("provisioning state"), "unexpected error: {error}");

    // verification was the last phase attempted
    let last = report.phases.last().unwrap();
    assert_eq!(last.name, "verify-managed-cluster");
    assert!(!last.success);

    // teardown still ran to completion
    let teardown_labels: Vec<&str> = report.teardown.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(
        teardown_labels,
        ["terraform-destroy", "delete-resource-group", "sweep-local-files"]
    );
    assert!(report.teardown.iter().all(|t| t.success));
    assert!(!stub.has_resource_group("test"));
}

#[tokio::test]
async fn missing_cluster_fails_verification() {
    let stub = ArmStub::spawn().await;
    // no cluster fixture registered
    let work = TempDir::new().unwrap();
    let mut runner = build_runner(&stub, &work, &FakeTerraform::new());

    let report = runner.run().await;

    assert!(!report.success);
    assert!(report.error.as_deref().unwrap().contains("managed cluster"));
    assert!(report.teardown.iter().all(|t| t.success));
}

#[tokio::test]
async fn apply_failure_keeps_its_error_through_a_failing_teardown() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", CLUSTER_NAME, "Succeeded");
    let work = TempDir::new().unwrap();
    let fake = FakeTerraform::with_apply_error("Invalid resource block");
    let mut runner = build_runner(&stub, &work, &fake);

    let report = runner.run().await;

    assert!(!report.success);
    // apply never wrote state, so destroy fails during teardown; the
    // report must still carry the apply error, not the destroy error
    let error = report.error.as_deref().unwrap();
    assert!(error.contains("apply"), "unexpected error: {error}");
    assert!(error.contains("Invalid resource block"), "unexpected error: {error}");

    let phase_names: Vec<&str> = report.phases.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        phase_names,
        [
            "validate-config",
            "write-provider-file",
            "create-resource-group",
            "terraform-apply",
        ]
    );

    let destroy = &report.teardown[0];
    assert_eq!(destroy.label, "terraform-destroy");
    assert!(!destroy.success);
    // the later actions still ran
    assert!(report.teardown[1].success);
    assert!(report.teardown[2].success);
    assert!(!stub.has_resource_group("test"));
}

#[tokio::test]
async fn mislabeled_node_fails_the_pool_check() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", CLUSTER_NAME, "Succeeded");
    let work = TempDir::new().unwrap();
    let mut runner = build_runner(&stub, &work, &FakeTerraform::new());
    runner.set_node_lister(Box::new(StubNodeLister::new(vec![node(
        "aks-pool-32315060-vmss000000",
        Some((AGENT_POOL_LABEL, "nodepool1")),
    )])));

    let report = runner.run().await;

    assert!(!report.success);
    assert!(report.error.as_deref().unwrap().contains("agent-pool label"));
    assert_eq!(report.phases.last().unwrap().name, "verify-node-pools");
    assert!(report.teardown.iter().all(|t| t.success));
}

#[tokio::test]
async fn invalid_vars_fail_before_any_cloud_call() {
    let stub = ArmStub::spawn().await;
    let work = TempDir::new().unwrap();
    let runner = build_runner(&stub, &work, &FakeTerraform::new());
    // empty location must be rejected by validation
    let mut config = runner.config().clone();
    config.run.location = String::new();
    let azure = AzureClient::new(stub_credentials(), &config.azure.endpoint, &config.azure.authority)
        .unwrap();
    let terraform = TerraformCli::new(config.terraform_options().unwrap());
    let mut runner = Runner::with_clients(config, azure, terraform);

    let report = runner.run().await;

    assert!(!report.success);
    assert_eq!(report.phases.len(), 1);
    assert_eq!(report.phases[0].name, "validate-config");
    assert!(stub.calls().is_empty(), "validation must not touch the API");
    // nothing was registered for teardown yet
    assert!(report.teardown.is_empty());
}

#[tokio::test]
async fn destroy_only_cleans_up_a_kept_deployment() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", CLUSTER_NAME, "Succeeded");
    let work = TempDir::new().unwrap();
    let mut runner = build_runner(&stub, &work, &FakeTerraform::new());

    let kept = runner.run_with_teardown(false).await;
    assert!(kept.success, "run failed: {:?}", kept.error);
    assert!(stub.has_resource_group("test"));

    let outcomes = runner.destroy_only().await;

    let labels: Vec<&str> = outcomes.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(
        labels,
        ["terraform-destroy", "delete-resource-group", "sweep-local-files"]
    );
    assert!(outcomes.iter().all(|o| o.success));
    assert!(!stub.has_resource_group("test"));
    assert!(!work.path().join("terraform.tfstate").exists());
    assert!(!work.path().join(".kube").exists());
}

#[tokio::test]
async fn unique_suffix_runs_against_renamed_resources() {
    let stub = ArmStub::spawn().await;
    let work = TempDir::new().unwrap();
    let runner = build_runner(&stub, &work, &FakeTerraform::new());

    let mut config = runner.config().clone();
    config.run = config.run.with_suffix("ab12cd");
    stub.add_cluster("test-ab12cd", "test-westus-cluster-ab12cd-aks", "Succeeded");

    let azure = AzureClient::new(stub_credentials(), &config.azure.endpoint, &config.azure.authority)
        .unwrap();
    let terraform = TerraformCli::new(config.terraform_options().unwrap());
    let mut runner = Runner::with_clients(config, azure, terraform);
    runner.set_node_lister(Box::new(StubNodeLister::new(vec![node(
        "aks-pool-32315060-vmss000000",
        Some((AGENT_POOL_LABEL, "pool")),
    )])));

    let report = runner.run().await;

    assert!(report.success, "run failed: {:?}", report.error);
    assert_eq!(report.cluster_name, "test-westus-cluster-ab12cd-aks");
    assert!(!stub.has_resource_group("test-ab12cd"));
}
