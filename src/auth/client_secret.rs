//! OAuth2 client credentials flow against Azure AD

use super::{AccessToken, AuthError, TokenCredential, TokenResponse};
use async_trait::async_trait;
use reqwest::Client;

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// App-only credential backed by an Azure AD app registration
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
    http_client: Client,
}

impl ClientSecretCredential {
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Self {
        Self {
            tenant_id,
            client_id,
            client_secret,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            http_client: Client::new(),
        }
    }

    /// Point at a different authority (sovereign clouds, tests)
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the token endpoint URL for this tenant
    fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn acquire_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        tracing::debug!(scope, "Requesting client credentials token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];

        let response = self
            .http_client
            .post(self.token_endpoint())
            .form(&params)
            .send()
            .await?;

        TokenResponse::from_response(response).await
    }
}
