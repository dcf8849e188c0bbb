//! Azure client behavior against the management stub: status-code
//! handling and token caching.

use tfprobe_azure::{AzureClient, AzureError, Credentials};
use tfprobe_e2e::arm_stub::ArmStub;

fn client_for(stub: &ArmStub) -> AzureClient {
    let credentials = Credentials {
        subscription_id: "00000000-0000-0000-0000-000000000000".to_string(),
        tenant_id: "stub-tenant".to_string(),
        client_id: "stub-client".to_string(),
        client_secret: "stub-secret".to_string(),
    };
    AzureClient::new(credentials, &stub.endpoint(), &stub.authority()).expect("stub client")
}

#[tokio::test]
async fn create_is_created_then_updated() {
    let stub = ArmStub::spawn().await;
    let client = client_for(&stub);

    let group = client.create_resource_group("test", "westus").await.unwrap();
    assert_eq!(group.name, "test");
    assert_eq!(group.location, "westus");

    // second PUT updates in place instead of failing
    let group = client.create_resource_group("test", "westus").await.unwrap();
    assert_eq!(group.name, "test");

    let calls = stub.calls();
    assert_eq!(
        calls.iter().filter(|c| c.as_str() == "PUT resourcegroup test").count(),
        2
    );
}

#[tokio::test]
async fn deleting_an_absent_group_is_not_an_error() {
    let stub = ArmStub::spawn().await;
    let client = client_for(&stub);

    client.delete_resource_group("never-created").await.unwrap();
}

#[tokio::test]
async fn delete_removes_the_group() {
    let stub = ArmStub::spawn().await;
    let client = client_for(&stub);

    client.create_resource_group("test", "westus").await.unwrap();
    assert!(stub.has_resource_group("test"));

    client.delete_resource_group("test").await.unwrap();
    assert!(!stub.has_resource_group("test"));
}

#[tokio::test]
async fn missing_cluster_maps_to_not_found() {
    let stub = ArmStub::spawn().await;
    let client = client_for(&stub);

    let err = client
        .get_managed_cluster("test", "test-westus-cluster-aks")
        .await
        .unwrap_err();
    assert!(matches!(err, AzureError::NotFound { .. }));
}

#[tokio::test]
async fn cluster_in_another_group_is_not_found() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("other-group", "test-westus-cluster-aks", "Succeeded");
    let client = client_for(&stub);

    let err = client
        .get_managed_cluster("test", "test-westus-cluster-aks")
        .await
        .unwrap_err();
    assert!(matches!(err, AzureError::NotFound { .. }));
}

#[tokio::test]
async fn cluster_fields_round_trip_from_the_api() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", "test-westus-cluster-aks", "Succeeded");
    let client = client_for(&stub);

    let cluster = client
        .get_managed_cluster("test", "test-westus-cluster-aks")
        .await
        .unwrap();
    assert_eq!(cluster.name, "test-westus-cluster-aks");
    assert_eq!(cluster.provisioning_state(), "Succeeded");
}

#[tokio::test]
async fn one_token_is_fetched_for_many_operations() {
    let stub = ArmStub::spawn().await;
    stub.add_cluster("test", "test-westus-cluster-aks", "Succeeded");
    let client = client_for(&stub);

    client.create_resource_group("test", "westus").await.unwrap();
    client
        .get_managed_cluster("test", "test-westus-cluster-aks")
        .await
        .unwrap();
    client.delete_resource_group("test").await.unwrap();

    let token_fetches = stub
        .calls()
        .iter()
        .filter(|c| c.as_str() == "POST token")
        .count();
    assert_eq!(token_fetches, 1, "token must be cached across operations");
}
