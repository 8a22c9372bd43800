//! Config module
//!
//! Explicit configuration for the lookup function

pub mod config;

pub use config::{
    origin_from_endpoint, scope_from_base_url, ClientSecretSettings, Config, ConfigError,
    DEFAULT_BASE_URL, DEFAULT_PORT,
};
