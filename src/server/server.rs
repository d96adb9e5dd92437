use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use http::StatusCode;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::cache::store::TokenStore;
use crate::cache::token::TokenStatus;
use crate::config::settings::{MetricsConfig, SettingsConfig};
use crate::credentials::manager::CredentialManager;
use crate::errors::CredentialError;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;

pub struct AppState<S: TokenStore> {
    pub manager: Arc<CredentialManager<S>>,
    pub metrics_state: MetricsState,
}

impl<S: TokenStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            metrics_state: self.metrics_state.clone(),
        }
    }
}

impl<S: TokenStore> AppState<S> {
    pub fn new(manager: Arc<CredentialManager<S>>, metrics: &Metrics) -> Self {
        Self {
            manager,
            metrics_state: MetricsState::new(metrics.registry.clone()),
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

pub fn router<S: TokenStore>(state: AppState<S>, metrics_config: &MetricsConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/token/status", get(token_status::<S>))
        .route("/token/refresh", post(token_refresh::<S>))
        .merge(state.metrics_state.router::<S>(metrics_config))
        .with_state(state)
}

/// Serve the diagnostic routes until `shutdown` resolves.
pub async fn start<S: TokenStore>(
    settings_config: &SettingsConfig,
    manager: Arc<CredentialManager<S>>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(AppState::new(manager, metrics), &settings_config.metrics);

    let bind_addr = &settings_config.server.host;
    let port = &settings_config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind_addr, port)).await?;
    info!("http server listening on {}", listener.local_addr()?);

    metrics.up.set(1);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    metrics.up.set(0);
    info!("http server stopped");

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn token_status<S: TokenStore>(State(state): State<AppState<S>>) -> Result<Json<TokenStatus>, ApiError> {
    let manager = &state.manager;
    manager
        .get_status(manager.service_name())
        .await
        .map(Json)
        .map_err(|err| error_response(StatusCode::SERVICE_UNAVAILABLE, "token status unavailable", err))
}

/// Force a new token; the token text itself is never returned.
async fn token_refresh<S: TokenStore>(State(state): State<AppState<S>>) -> Result<Json<TokenStatus>, ApiError> {
    let manager = &state.manager;
    let service_name = manager.service_name();
    manager
        .issue_token(service_name)
        .await
        .map_err(|err| error_response(StatusCode::BAD_GATEWAY, "token refresh failed", err))?;
    manager
        .get_status(service_name)
        .await
        .map(Json)
        .map_err(|err| error_response(StatusCode::SERVICE_UNAVAILABLE, "token status unavailable", err))
}

fn error_response(status: StatusCode, error: &str, err: CredentialError) -> ApiError {
    error!("{}: {}", error, err);
    (
        status,
        Json(json!({
            "error": error,
            "message": err.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
