use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use magento_token_agent::cache::pg_store::PgTokenStore;
use magento_token_agent::credentials::manager::CredentialManager;
use magento_token_agent::server;
use magento_token_agent::utils::config_loader;
use magento_token_agent::utils::constants::DEFAULT_CONFIG_PATH;
use magento_token_agent::utils::logging::{self, LogLevel};
use magento_token_agent::utils::signal::ShutdownSignal;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level)?;

    // -------------------------------
    // 2. Connect token store
    // -------------------------------

    let store = PgTokenStore::connect(&service_config.store)
        .await
        .context("failed to connect token store")?;
    if service_config.store.run_migrations {
        store.migrate().await.context("failed to migrate token store")?;
    }

    // -------------------------------
    // 3. Build credential manager
    // -------------------------------

    let magento = &service_config.magento;
    let manager = Arc::new(
        CredentialManager::from_config(magento, store).context("failed to build http client")?,
    );
    info!(
        "credential manager ready for '{}' (issuer: {}, api: {})",
        magento.service_name, magento.token_url, magento.base_url
    );

    // -------------------------------
    // 4. Serve until SIGINT / SIGTERM, then release the store
    // -------------------------------

    let shutdown = ShutdownSignal::install()?;
    let served = server::server::start(&service_config.settings, manager.clone(), shutdown.recv()).await;
    manager.close().await;
    info!("Service stopped");

    served
}
