use serde::Deserialize;
use std::fmt;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::{
    DEFAULT_MAX_CONNECTIONS, DEFAULT_SAFETY_MARGIN_MINUTES, DEFAULT_SERVICE_NAME,
    DEFAULT_TOKEN_LIFETIME_MINUTES,
};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub store: StoreConfig,
    pub magento: MagentoConfig,
}

/// ================================
/// Token store (Postgres)
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// ================================
/// Magento API identity and endpoints
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct MagentoConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// resource API base, endpoints are appended to it
    pub base_url: String,
    /// admin token issuance endpoint
    pub token_url: String,
    pub username: String,
    pub password: Secret,
    /// real lifetime of an issued token on the Magento side
    #[serde(default = "default_token_lifetime_minutes")]
    pub token_lifetime_minutes: u64,
    /// cached expiry is shortened by this margin
    /// invariant: < token_lifetime_minutes
    #[serde(default = "default_safety_margin_minutes")]
    pub safety_margin_minutes: u64,
    /// skip TLS certificate validation for the issuer and the resource API
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// String that never shows up in `Debug` output.
#[derive(Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_owned()
}

fn default_token_lifetime_minutes() -> u64 {
    DEFAULT_TOKEN_LIFETIME_MINUTES
}

fn default_safety_margin_minutes() -> u64 {
    DEFAULT_SAFETY_MARGIN_MINUTES
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_true() -> bool {
    true
}
