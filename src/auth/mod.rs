//! Azure AD Authentication module
//!
//! Token acquisition for the upstream D365 API. The handler only sees the
//! [`TokenCredential`] capability; the concrete credential is picked from
//! configuration at startup.

mod client_secret;
mod managed_identity;

pub use client_secret::ClientSecretCredential;
pub use managed_identity::{IdentitySource, ManagedIdentityCredential};

use crate::config::Config;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request failed: {0}")]
    TokenRequestFailed(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Token parse error: {0}")]
    ParseError(String),
}

/// Opaque bearer token; never printed in full
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Capability to obtain a bearer token for a scope
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn acquire_token(&self, scope: &str) -> Result<AccessToken, AuthError>;
}

/// Token response shared by the identity endpoints and Azure AD
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl TokenResponse {
    async fn from_response(response: reqwest::Response) -> Result<AccessToken, AuthError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token request failed: {} - {}", status, body);
            return Err(AuthError::TokenRequestFailed(format!(
                "Status: {}, Body: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AuthError::ParseError(format!("Failed to parse token response: {}", e))
        })?;

        Ok(AccessToken::new(token.access_token))
    }
}

/// Resource URI for the v1 identity endpoints, which take a resource instead of a scope
pub fn resource_from_scope(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

/// Which credential `credential_from_config` selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ClientSecret,
    AppServiceIdentity,
    ImdsIdentity,
}

/// Pick the credential named by `config`
///
/// `lookup` supplies the platform variables (`IDENTITY_ENDPOINT`,
/// `IDENTITY_HEADER`) that the managed identity needs.
pub fn credential_from_config<F>(
    config: &Config,
    lookup: F,
) -> (CredentialKind, Arc<dyn TokenCredential>)
where
    F: Fn(&str) -> Option<String>,
{
    match &config.client_secret {
        Some(settings) => {
            tracing::info!(
                tenant_id = %settings.tenant_id,
                client_id = %settings.client_id,
                "Using client secret credential"
            );
            let credential: Arc<dyn TokenCredential> = Arc::new(ClientSecretCredential::new(
                settings.tenant_id.clone(),
                settings.client_id.clone(),
                settings.client_secret.clone(),
            ));
            (CredentialKind::ClientSecret, credential)
        }
        None => {
            let source = IdentitySource::from_lookup(lookup);
            tracing::info!(
                source = ?source,
                client_id = ?config.managed_identity_client_id,
                "Using managed identity credential"
            );
            let kind = match source {
                IdentitySource::AppService { .. } => CredentialKind::AppServiceIdentity,
                IdentitySource::Imds { .. } => CredentialKind::ImdsIdentity,
            };
            let credential: Arc<dyn TokenCredential> = Arc::new(ManagedIdentityCredential::new(
                source,
                config.managed_identity_client_id.clone(),
            ));
            (kind, credential)
        }
    }
}
