//! Shared constants and invariants

pub const DEFAULT_SERVICE_NAME: &str = "magento_api";
/// Lifetime of a Magento admin token on the issuer side.
pub const DEFAULT_TOKEN_LIFETIME_MINUTES: u64 = 60;
pub const DEFAULT_SAFETY_MARGIN_MINUTES: u64 = 10;
/// Upper bound for a configured token lifetime: one year.
pub const MAX_TOKEN_LIFETIME_MINUTES: u64 = 365 * 24 * 60;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub const DEFAULT_CONFIG_PATH: &str = "magento-token-agent.yaml";
