//! Configuration module
//!
//! Resolves the upstream base URL, token scope, credential selection and
//! listen port. Values come from an optional TOML file, overridden by
//! environment variables.

use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Base URL used when `D365_API_BASEURL` is not set
pub const DEFAULT_BASE_URL: &str = "https://d365.example.com";

/// Port used when `FUNCTIONS_CUSTOMHANDLER_PORT` is not set
pub const DEFAULT_PORT: u16 = 3000;

pub const ENV_BASE_URL: &str = "D365_API_BASEURL";
pub const ENV_SCOPE: &str = "D365_SCOPE";
pub const ENV_CONFIG_FILE: &str = "D365_CONFIG_FILE";
pub const ENV_PORT: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid port '{0}'")]
    InvalidPort(String),
}

/// Azure AD app registration used instead of the managed identity
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ClientSecretSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientSecretSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// File layout of the optional TOML config
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    base_url: Option<String>,
    scope: Option<String>,
    port: Option<u16>,
    managed_identity_client_id: Option<String>,
    client_secret: Option<ClientSecretSettings>,
}

/// Resolved configuration, passed explicitly to every collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Upstream service root, without a trailing slash
    pub base_url: String,
    /// Token scope requested for the upstream
    pub scope: String,
    /// User-assigned managed identity; `None` selects the system-assigned one
    pub managed_identity_client_id: Option<String>,
    /// When set, tokens come from the client credentials flow
    pub client_secret: Option<ClientSecretSettings>,
    /// Port the custom handler listens on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            scope: scope_from_base_url(DEFAULT_BASE_URL),
            managed_identity_client_id: None,
            client_secret: None,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load from process environment, reading `D365_CONFIG_FILE` first if set
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        match non_empty(lookup(ENV_CONFIG_FILE)) {
            Some(path) => Self::load(path, lookup),
            None => Self::from_lookup(lookup),
        }
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(FileConfig::default(), lookup)
    }

    /// Load a TOML file, then apply overrides from `lookup`
    pub fn load<P, F>(path: P, lookup: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.display().to_string(), e))?;
        Self::from_toml_str(&content, lookup)
    }

    /// Parse TOML content, then apply overrides from `lookup`
    pub fn from_toml_str<F>(content: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileConfig = toml::from_str(content)?;
        Self::resolve(file, lookup)
    }

    fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let base_url = get(ENV_BASE_URL)
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let scope = get(ENV_SCOPE)
            .or(file.scope)
            .unwrap_or_else(|| scope_from_base_url(&base_url));

        let port = match get(ENV_PORT) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let client_secret = match (get(ENV_TENANT_ID), get(ENV_CLIENT_ID), get(ENV_CLIENT_SECRET)) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => Some(ClientSecretSettings {
                tenant_id,
                client_id,
                client_secret,
            }),
            _ => file.client_secret,
        };

        // AZURE_CLIENT_ID alone names a user-assigned managed identity
        let managed_identity_client_id = if client_secret.is_some() {
            None
        } else {
            get(ENV_CLIENT_ID).or(file.managed_identity_client_id)
        };

        Ok(Self {
            base_url,
            scope,
            managed_identity_client_id,
            client_secret,
            port,
        })
    }
}

/// Origin (`scheme://host[:port]`) of an endpoint URL
pub fn origin_from_endpoint(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        Ok(url) if url.origin().is_tuple() => url.origin().ascii_serialization(),
        _ => endpoint.split('/').take(3).collect::<Vec<_>>().join("/"),
    }
}

/// Default `.default` scope for the origin of `base_url`
pub fn scope_from_base_url(base_url: &str) -> String {
    format!("{}/.default", origin_from_endpoint(base_url))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
