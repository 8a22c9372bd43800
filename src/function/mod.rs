//! HTTP-triggered customer lookup function
//!
//! Proxies customer lookups to D365 Finance & Operations

mod handler;
pub mod protocol;
mod server;

pub use handler::{CustomerLookupHandler, LookupError};
pub use protocol::*;
pub use server::{create_router, TRIGGER_ROUTE};
