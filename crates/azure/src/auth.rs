//! Service-principal credentials and token acquisition.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AzureError, AzureResult};

/// Default authority host for token requests (public cloud).
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Tokens are refreshed this long before their reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Service-principal credentials for the management API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    /// Read credentials from the environment.
    ///
    /// The subscription id honors `AZURE_SUBSCRIPTION_ID` first with
    /// `ARM_SUBSCRIPTION_ID` as the fallback; the remaining values use the
    /// `ARM_*` names Terraform already requires, with `AZURE_*` fallbacks.
    pub fn from_env() -> AzureResult<Self> {
        Ok(Self {
            subscription_id: env_any(&["AZURE_SUBSCRIPTION_ID", "ARM_SUBSCRIPTION_ID"])?,
            tenant_id: env_any(&["ARM_TENANT_ID", "AZURE_TENANT_ID"])?,
            client_id: env_any(&["ARM_CLIENT_ID", "AZURE_CLIENT_ID"])?,
            client_secret: env_any(&["ARM_CLIENT_SECRET", "AZURE_CLIENT_SECRET"])?,
        })
    }
}

/// First non-empty value among `names`; the error names the preferred one.
fn env_any(names: &[&'static str]) -> AzureResult<String> {
    for name in names {
        if let Ok(value) = std::env::var(name) {
            if !value.trim().is_empty() {
                return Ok(value);
            }
        }
    }
    Err(AzureError::MissingEnv(names[0]))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Fetches and caches OAuth2 bearer tokens via the client-credentials flow.
#[derive(Clone)]
pub struct TokenProvider {
    http: reqwest::Client,
    credentials: Credentials,
    authority: String,
    scope: String,
    cache: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenProvider {
    /// `resource` is the audience the token is requested for, typically the
    /// management endpoint.
    pub fn new(
        http: reqwest::Client,
        credentials: Credentials,
        authority: &str,
        resource: &str,
    ) -> Self {
        Self {
            http,
            credentials,
            authority: authority.trim_end_matches('/').to_string(),
            scope: format!("{}/.default", resource.trim_end_matches('/')),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Current bearer token, fetching a fresh one when the cache is empty
    /// or inside the refresh margin.
    pub async fn bearer(&self) -> AzureResult<String> {
        if let Some(cached) = self.cache.lock().as_ref() {
            if cached.expires_at > Instant::now() + REFRESH_MARGIN {
                return Ok(cached.token.clone());
            }
        }
        self.fetch().await
    }

    async fn fetch(&self) -> AzureResult<String> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority, self.credentials.tenant_id
        );
        debug!("requesting management token from {}", url);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let response = self.http.post(&url).form(&params).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AzureError::Token(format!("{}: {}", status, body)));
        }
        let token: TokenResponse = response.json().await?;
        *self.cache.lock() = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> Credentials {
        Credentials {
            subscription_id: "sub-0000".to_string(),
            tenant_id: "tenant-0000".to_string(),
            client_id: "client-0000".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    #[test]
    fn env_any_prefers_the_first_set_variable() {
        std::env::set_var("TFPROBE_AUTH_TEST_PRIMARY", "primary");
        std::env::set_var("TFPROBE_AUTH_TEST_FALLBACK", "fallback");
        let value = env_any(&["TFPROBE_AUTH_TEST_PRIMARY", "TFPROBE_AUTH_TEST_FALLBACK"]).unwrap();
        assert_eq!(value, "primary");
    }

    #[test]
    fn env_any_falls_back_past_unset_and_empty_values() {
        std::env::set_var("TFPROBE_AUTH_TEST_EMPTY", "  ");
        std::env::set_var("TFPROBE_AUTH_TEST_SECOND", "second");
        let value = env_any(&[
            "TFPROBE_AUTH_TEST_UNSET_NEVER",
            "TFPROBE_AUTH_TEST_EMPTY",
            "TFPROBE_AUTH_TEST_SECOND",
        ])
        .unwrap();
        assert_eq!(value, "second");
    }

    #[test]
    fn env_any_reports_the_preferred_name() {
        let err = env_any(&["TFPROBE_AUTH_TEST_MISSING_A", "TFPROBE_AUTH_TEST_MISSING_B"])
            .unwrap_err();
        assert!(err.to_string().contains("TFPROBE_AUTH_TEST_MISSING_A"));
    }

    #[test]
    fn scope_targets_the_management_endpoint() {
        let provider = TokenProvider::new(
            reqwest::Client::new(),
            test_credentials(),
            "https://login.example.com/",
            "https://management.example.com/",
        );
        assert_eq!(provider.scope, "https://management.example.com/.default");
        assert_eq!(provider.authority, "https://login.example.com");
    }
}
