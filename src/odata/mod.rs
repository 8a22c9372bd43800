//! OData module
//!
//! HTTP client for D365 OData APIs

pub mod client;

pub use client::{ODataClient, ODataError, QueryOptions, CUSTOMERS_ENTITY};
