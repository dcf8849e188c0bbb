//! Typed client for the resource-group and managed-cluster operations.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::auth::{Credentials, TokenProvider, DEFAULT_AUTHORITY};
use crate::error::{AzureError, AzureResult};

/// Default management endpoint (public cloud).
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// API version for Microsoft.Resources resource-group operations.
const RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";

/// API version for Microsoft.ContainerService managed-cluster reads.
const MANAGED_CLUSTER_API_VERSION: &str = "2021-05-01";

/// Client for the subset of Azure Resource Manager the harness needs.
#[derive(Clone)]
pub struct AzureClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    endpoint: String,
    subscription_id: String,
}

/// A resource group as returned by the management API.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: Option<ResourceGroupProperties>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

/// A managed cluster, reduced to the fields the verifier reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagedCluster {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: ManagedClusterProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterProperties {
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

impl ManagedCluster {
    /// Provisioning state, or the empty string when the API omitted it.
    pub fn provisioning_state(&self) -> &str {
        self.properties.provisioning_state.as_deref().unwrap_or("")
    }
}

impl AzureClient {
    /// Build a client from explicit credentials and endpoints.
    pub fn new(credentials: Credentials, endpoint: &str, authority: &str) -> AzureResult<Self> {
        let http = reqwest::Client::builder().build()?;
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let tokens = TokenProvider::new(http.clone(), credentials.clone(), authority, &endpoint);
        Ok(Self {
            http,
            tokens,
            endpoint,
            subscription_id: credentials.subscription_id,
        })
    }

    /// Build a client from the environment against the public cloud.
    pub fn from_env() -> AzureResult<Self> {
        Self::new(Credentials::from_env()?, DEFAULT_ENDPOINT, DEFAULT_AUTHORITY)
    }

    fn group_url(&self, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourcegroups/{}?api-version={}",
            self.endpoint, self.subscription_id, name, RESOURCE_GROUP_API_VERSION
        )
    }

    fn cluster_url(&self, resource_group: &str, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ContainerService/managedClusters/{}?api-version={}",
            self.endpoint, self.subscription_id, resource_group, name, MANAGED_CLUSTER_API_VERSION
        )
    }

    /// Create the resource group, or update it in place when it already
    /// exists. ARM answers 201 for a fresh group and 200 for an update.
    pub async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> AzureResult<ResourceGroup> {
        let token = self.tokens.bearer().await?;
        debug!("PUT resource group '{}' in {}", name, location);
        let response = self
            .http
            .put(self.group_url(name))
            .bearer_auth(token)
            .json(&json!({ "location": location }))
            .send()
            .await?;
        match response.status() {
            StatusCode::CREATED => {
                let group: ResourceGroup = response.json().await?;
                info!("created resource group '{}' in {}", group.name, group.location);
                Ok(group)
            }
            StatusCode::OK => {
                let group: ResourceGroup = response.json().await?;
                info!("resource group '{}' already present, updated", group.name);
                Ok(group)
            }
            status => Err(api_error("create resource group", status, response).await),
        }
    }

    /// Delete the resource group. A missing group counts as already
    /// deleted; ARM accepts the delete asynchronously and finishes it in
    /// the background.
    pub async fn delete_resource_group(&self, name: &str) -> AzureResult<()> {
        let token = self.tokens.bearer().await?;
        debug!("DELETE resource group '{}'", name);
        let response = self
            .http
            .delete(self.group_url(name))
            .bearer_auth(token)
            .send()
            .await?;
        match response.status() {
            StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NO_CONTENT => {
                info!("deletion of resource group '{}' accepted", name);
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                debug!("resource group '{}' already absent", name);
                Ok(())
            }
            status => Err(api_error("delete resource group", status, response).await),
        }
    }

    /// Fetch a managed cluster by resource group and name.
    pub async fn get_managed_cluster(
        &self,
        resource_group: &str,
        name: &str,
    ) -> AzureResult<ManagedCluster> {
        let token = self.tokens.bearer().await?;
        debug!("GET managed cluster '{}' in '{}'", name, resource_group);
        let response = self
            .http
            .get(self.cluster_url(resource_group, name))
            .bearer_auth(token)
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Err(AzureError::NotFound {
                kind: "managed cluster",
                name: name.to_string(),
            }),
            status => Err(api_error("get managed cluster", status, response).await),
        }
    }
}

async fn api_error(
    operation: &'static str,
    status: StatusCode,
    response: reqwest::Response,
) -> AzureError {
    let message = response.text().await.unwrap_or_default();
    AzureError::Api {
        operation,
        status: status.as_u16(),
        message: truncate(&message, 400),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
