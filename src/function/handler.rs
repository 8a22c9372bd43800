//! Customer lookup proxy handler
//!
//! Resolves the customer id, acquires a token for the configured scope and
//! forwards one query to D365. Every upstream failure becomes a 502.

use super::protocol::{ErrorBody, LookupRequest, ResponseEnvelope};
use crate::auth::{AuthError, TokenCredential};
use crate::config::Config;
use crate::odata::{ODataClient, ODataError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Lookup failures as seen by the caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("missing id")]
    MissingId,

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl From<AuthError> for LookupError {
    fn from(err: AuthError) -> Self {
        LookupError::Upstream(err.to_string())
    }
}

impl From<ODataError> for LookupError {
    fn from(err: ODataError) -> Self {
        LookupError::Upstream(err.to_string())
    }
}

impl LookupError {
    pub fn status(&self) -> u16 {
        match self {
            LookupError::MissingId => 400,
            LookupError::Upstream(_) => 502,
        }
    }

    pub fn into_envelope(self) -> ResponseEnvelope {
        let status = self.status();
        let body = match self {
            LookupError::MissingId => ErrorBody {
                error: "missing id".to_string(),
                details: None,
            },
            LookupError::Upstream(details) => ErrorBody {
                error: "upstream error".to_string(),
                details: Some(details),
            },
        };
        ResponseEnvelope::error(status, body)
    }
}

/// Stateless handler shared by all invocations
pub struct CustomerLookupHandler {
    client: ODataClient,
    scope: String,
    credential: Arc<dyn TokenCredential>,
}

impl CustomerLookupHandler {
    pub fn new(config: &Config, credential: Arc<dyn TokenCredential>) -> Self {
        Self::with_client(ODataClient::new(&config.base_url), config.scope.clone(), credential)
    }

    pub fn with_client(
        client: ODataClient,
        scope: String,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            client,
            scope,
            credential,
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Handle one invocation and produce the response envelope
    pub async fn handle(&self, request: &LookupRequest) -> ResponseEnvelope {
        tracing::info!("get-customer invoked");

        match self.lookup(request).await {
            Ok(body) => ResponseEnvelope::ok(body),
            Err(err) => {
                if let LookupError::Upstream(details) = &err {
                    tracing::error!(details = %details, "error calling D365");
                }
                err.into_envelope()
            }
        }
    }

    /// Resolve the id, then query the upstream once
    pub async fn lookup(&self, request: &LookupRequest) -> Result<Value, LookupError> {
        let customer_id = request.customer_id().ok_or(LookupError::MissingId)?;

        let token = self.credential.acquire_token(&self.scope).await?;
        let body = self.client.fetch_customers(&customer_id, &token).await?;

        Ok(body)
    }
}
