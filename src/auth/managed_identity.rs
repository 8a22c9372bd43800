//! Managed identity credential
//!
//! On App Service and Functions the platform injects `IDENTITY_ENDPOINT` and
//! `IDENTITY_HEADER`. Everywhere else the Azure Instance Metadata Service is
//! used.

use super::{resource_from_scope, AccessToken, AuthError, TokenCredential, TokenResponse};
use async_trait::async_trait;
use reqwest::Client;

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const IMDS_API_VERSION: &str = "2018-02-01";

/// Where managed identity tokens are requested from
#[derive(Clone, PartialEq, Eq)]
pub enum IdentitySource {
    AppService { endpoint: String, header: String },
    Imds { endpoint: String },
}

impl std::fmt::Debug for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentitySource::AppService { endpoint, .. } => f
                .debug_struct("AppService")
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            IdentitySource::Imds { endpoint } => {
                f.debug_struct("Imds").field("endpoint", endpoint).finish()
            }
        }
    }
}

impl IdentitySource {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        match (get("IDENTITY_ENDPOINT"), get("IDENTITY_HEADER")) {
            (Some(endpoint), Some(header)) => IdentitySource::AppService { endpoint, header },
            _ => IdentitySource::Imds {
                endpoint: IMDS_ENDPOINT.to_string(),
            },
        }
    }
}

/// Token credential for a system- or user-assigned managed identity
pub struct ManagedIdentityCredential {
    source: IdentitySource,
    client_id: Option<String>,
    http_client: Client,
}

impl ManagedIdentityCredential {
    pub fn new(source: IdentitySource, client_id: Option<String>) -> Self {
        Self {
            source,
            client_id,
            http_client: Client::new(),
        }
    }

    fn request(&self, resource: &str) -> reqwest::RequestBuilder {
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(3);
        let request = match &self.source {
            IdentitySource::AppService { endpoint, header } => {
                query.push(("api-version", APP_SERVICE_API_VERSION));
                self.http_client
                    .get(endpoint)
                    .header("X-IDENTITY-HEADER", header)
            }
            IdentitySource::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION));
                self.http_client.get(endpoint).header("Metadata", "true")
            }
        };

        query.push(("resource", resource));
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }
        request.query(&query)
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn acquire_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        let resource = resource_from_scope(scope);
        tracing::debug!(resource, "Requesting managed identity token");

        let response = self.request(resource).send().await?;
        TokenResponse::from_response(response).await
    }
}
