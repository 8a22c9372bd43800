//! OData Client module
//!
//! HTTP client for the Dynamics 365 Finance & Operations OData API

use crate::auth::AccessToken;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

/// Entity set queried for customer lookups
pub const CUSTOMERS_ENTITY: &str = "CustomersV3";

/// Longest upstream error body kept in `ODataError::Status`, in characters
const MAX_ERROR_BODY_CHARS: usize = 512;

/// OData client errors
#[derive(Error, Debug)]
pub enum ODataError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request failed with status code {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Query options for OData requests
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub cross_company: bool,
    pub filter: Option<String>,
}

impl QueryOptions {
    /// Build query string from options
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();

        if self.cross_company {
            params.push("cross-company=true".to_string());
        }

        if let Some(ref filter) = self.filter {
            params.push(format!("$filter={}", filter));
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }

    /// Cross-company lookup of a customer by account number
    ///
    /// The account number is placed inside the string literal as is.
    pub fn customer_by_account(account_number: &str) -> Self {
        if account_number.contains('\'') {
            tracing::warn!(
                account_number,
                "Account number contains a quote and alters the $filter expression"
            );
        }

        Self {
            cross_company: true,
            filter: Some(format!("AccountNumber eq '{}'", account_number)),
        }
    }
}

/// OData client for the D365 data endpoint
#[derive(Debug, Clone)]
pub struct ODataClient {
    base_url: String,
    http_client: Client,
}

impl ODataClient {
    /// Create a new OData client
    ///
    /// # Arguments
    /// * `base_url` - Environment root (e.g., "https://org.operations.dynamics.com")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, Client::new())
    }

    pub fn with_http_client(base_url: impl Into<String>, http_client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client,
        }
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of an entity set query under `/data`
    pub fn entity_url(&self, entity: &str, options: &QueryOptions) -> String {
        format!(
            "{}/data/{}{}",
            self.base_url,
            entity,
            options.to_query_string()
        )
    }

    /// URL of the customer lookup for `customer_id`
    pub fn customers_url(&self, customer_id: &str) -> String {
        self.entity_url(
            CUSTOMERS_ENTITY,
            &QueryOptions::customer_by_account(customer_id),
        )
    }

    /// Single GET of an entity set query, returning the JSON body unmodified
    pub async fn fetch(&self, url: &str, token: &AccessToken) -> Result<Value, ODataError> {
        tracing::debug!("Fetching: {}", url);

        let response = self
            .http_client
            .get(url)
            .header("Authorization", token.bearer())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ODataError::Status(status.as_u16(), truncate_body(body)));
        }

        response.json::<Value>().await.map_err(|e| {
            ODataError::ParseError(format!("Failed to parse OData response: {}", e))
        })
    }

    /// Look up customers by account number across all legal entities
    pub async fn fetch_customers(
        &self,
        customer_id: &str,
        token: &AccessToken,
    ) -> Result<Value, ODataError> {
        let url = self.customers_url(customer_id);
        self.fetch(&url, token).await
    }
}

fn truncate_body(body: String) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((end, _)) => format!("{}... ({} bytes total)", &body[..end], body.len()),
        None => body,
    }
}
