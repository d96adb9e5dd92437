//! # Magento Token Agent Library
//!
//! Acquires bearer tokens for the Magento REST API, caches them in a
//! persistent store with a safety margin, and refreshes them on expiry or
//! when the API rejects them.
//!
//! Modules:
//! - `config` — YAML service configuration and validation
//! - `cache` — credential records and token stores (Postgres, in-memory)
//! - `sources` — remote token issuer
//! - `credentials` — credential manager: resolve, issue, authenticated calls
//! - `server` — health, token status and metrics routes

pub mod cache;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::store::{StoreError, TokenStore};
pub use crate::cache::token::{CredentialRecord, TokenStatus};
pub use crate::config::service::ServiceConfig;
pub use crate::credentials::manager::CredentialManager;
pub use crate::errors::CredentialError;
