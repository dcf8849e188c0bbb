//! In-memory stand-in for the management API surface the harness touches.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

type SharedState = Arc<Mutex<StubState>>;

/// Mutable fixture state shared with the test body.
#[derive(Debug, Default)]
pub struct StubState {
    /// resource-group name to location
    pub resource_groups: BTreeMap<String, String>,
    /// cluster name to fixture
    pub clusters: BTreeMap<String, StubCluster>,
    /// ordered log of every call the harness made
    pub calls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StubCluster {
    pub resource_group: String,
    pub provisioning_state: String,
}

/// Running stub server bound to an ephemeral loopback port.
pub struct ArmStub {
    pub state: SharedState,
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ArmStub {
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(StubState::default()));
        let app = router(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener address");
        debug!("management stub listening on {}", addr);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve stub");
        });
        Self {
            state,
            addr,
            handle,
        }
    }

    /// Management endpoint URL for client configuration.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Token authority URL; the stub serves both from the same port.
    pub fn authority(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Register a cluster fixture the GET route will serve.
    pub fn add_cluster(&self, resource_group: &str, name: &str, provisioning_state: &str) {
        self.state.lock().clusters.insert(
            name.to_string(),
            StubCluster {
                resource_group: resource_group.to_string(),
                provisioning_state: provisioning_state.to_string(),
            },
        );
    }

    pub fn has_resource_group(&self, name: &str) -> bool {
        self.state.lock().resource_groups.contains_key(name)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }
}

impl Drop for ArmStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/:tenant/oauth2/v2.0/token", post(issue_token))
        .route(
            "/subscriptions/:subscription/resourcegroups/:name",
            put(put_group).delete(delete_group),
        )
        .route(
            "/subscriptions/:subscription/resourceGroups/:group/providers/Microsoft.ContainerService/managedClusters/:name",
            get(get_cluster),
        )
        .with_state(state)
}

async fn issue_token(
    State(state): State<SharedState>,
    Path(_tenant): Path<String>,
) -> Json<serde_json::Value> {
    state.lock().calls.push("POST token".to_string());
    Json(json!({
        "token_type": "Bearer",
        "expires_in": 3600,
        "access_token": "stub-token",
    }))
}

async fn put_group(
    State(state): State<SharedState>,
    Path((_subscription, name)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let location = body["location"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock();
    state.calls.push(format!("PUT resourcegroup {}", name));
    let status = if state.resource_groups.contains_key(&name) {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    state.resource_groups.insert(name.clone(), location.clone());
    (
        status,
        Json(json!({
            "id": format!("/subscriptions/stub/resourceGroups/{}", name),
            "name": name,
            "location": location,
            "properties": { "provisioningState": "Succeeded" },
        })),
    )
}

async fn delete_group(
    State(state): State<SharedState>,
    Path((_subscription, name)): Path<(String, String)>,
) -> StatusCode {
    let mut state = state.lock();
    state.calls.push(format!("DELETE resourcegroup {}", name));
    if state.resource_groups.remove(&name).is_some() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_cluster(
    State(state): State<SharedState>,
    Path((_subscription, group, name)): Path<(String, String, String)>,
) -> axum::response::Response {
    let mut state = state.lock();
    state.calls.push(format!("GET managedcluster {}", name));
    match state.clusters.get(&name) {
        Some(cluster) if cluster.resource_group == group => (
            StatusCode::OK,
            Json(json!({
                "id": format!(
                    "/subscriptions/stub/resourceGroups/{}/providers/Microsoft.ContainerService/managedClusters/{}",
                    group, name
                ),
                "name": name,
                "location": "westus",
                "properties": { "provisioningState": cluster.provisioning_state },
            })),
        )
            .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": { "code": "ResourceNotFound", "message": format!("cluster '{}' not found", name) },
            })),
        )
            .into_response(),
    }
}
