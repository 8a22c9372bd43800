//! D365 Customer Lookup Library
//!
//! Azure Functions custom handler that looks up customers in
//! Dynamics 365 Finance & Operations using a managed identity.

pub mod auth;
pub mod config;
pub mod function;
pub mod odata;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth::{AccessToken, ManagedIdentityCredential, TokenCredential};
pub use config::{Config, ConfigError};
pub use function::{create_router, CustomerLookupHandler, LookupRequest, ResponseEnvelope};
pub use odata::{ODataClient, ODataError};
