//! Configuration validation with aggregated errors.
//! Every problem is collected so a broken config is reported in one go.

use tracing::{error, info};

use crate::config::service::{MagentoConfig, ServiceConfig, StoreConfig};
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::MAX_TOKEN_LIFETIME_MINUTES;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_store(&cfg.store, &mut errors);
    validate_magento(&cfg.magento, &mut errors);

    if errors.is_empty() {
        info!("config validation passed");
        return Ok(());
    }

    let metrics = get_metrics().await;
    for err in &errors {
        error!("config validation: {}", err);
        metrics.config_validation_errors.inc();
    }
    Err(errors)
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' is not one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
    if !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' is not a valid port",
            settings.server.port
        ));
    }
}

fn validate_store(store: &StoreConfig, errors: &mut Vec<String>) {
    if store.database_url.trim().is_empty() {
        errors.push("store.database_url is required".to_string());
    }
    if store.max_connections == 0 {
        errors.push("store.max_connections must be greater than 0".to_string());
    }
}

fn validate_magento(magento: &MagentoConfig, errors: &mut Vec<String>) {
    if magento.service_name.trim().is_empty() {
        errors.push("magento.service_name must not be empty".to_string());
    }
    for (field, value) in [("base_url", &magento.base_url), ("token_url", &magento.token_url)] {
        if value.trim().is_empty() {
            errors.push(format!("magento.{} is required", field));
        } else if !value.starts_with("http://") && !value.starts_with("https://") {
            errors.push(format!("magento.{} '{}' must be an http(s) url", field, value));
        }
    }
    if magento.username.trim().is_empty() || magento.password.is_empty() {
        errors.push("magento.username and magento.password are required".to_string());
    }
    if magento.token_lifetime_minutes > MAX_TOKEN_LIFETIME_MINUTES {
        errors.push(format!(
            "magento.token_lifetime_minutes ({}) must not exceed {}",
            magento.token_lifetime_minutes, MAX_TOKEN_LIFETIME_MINUTES
        ));
    }
    if magento.safety_margin_minutes >= magento.token_lifetime_minutes {
        errors.push(format!(
            "magento.safety_margin_minutes ({}) must be less than token_lifetime_minutes ({})",
            magento.safety_margin_minutes, magento.token_lifetime_minutes
        ));
    }
}
