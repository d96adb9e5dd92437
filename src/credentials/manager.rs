use std::time::Instant;

use chrono::Duration;
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::store::TokenStore;
use crate::cache::token::{CredentialRecord, TokenStatus};
use crate::config::service::MagentoConfig;
use crate::errors::{CredentialError, CredentialResult};
use crate::helpers::time::{cached_lifetime, now};
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetryState;
use crate::sources::issuer::TokenIssuer;

/// Resource API target and cache lifetime of issued tokens.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub service_name: String,
    pub base_url: String,
    /// recorded lifetime of an issued token, already shortened by the safety margin
    pub cached_for: Duration,
}

impl ManagerSettings {
    pub fn from_config(config: &MagentoConfig) -> Self {
        Self {
            service_name: config.service_name.to_owned(),
            base_url: config.base_url.to_owned(),
            cached_for: cached_lifetime(config.token_lifetime_minutes, config.safety_margin_minutes),
        }
    }
}

/// Resolves, issues and persists bearer tokens, and runs authenticated
/// calls against the resource API with one forced refresh on 401.
///
/// Issuance is not serialized: concurrent cache misses may each issue a
/// token, the last upsert wins.
#[derive(Debug)]
pub struct CredentialManager<S: TokenStore> {
    store: S,
    issuer: TokenIssuer,
    client: Client,
    settings: ManagerSettings,
}

impl<S: TokenStore> CredentialManager<S> {
    pub fn new(store: S, issuer: TokenIssuer, client: Client, settings: ManagerSettings) -> Self {
        Self { store, issuer, client, settings }
    }

    /// One HTTP client is shared by the issuer and the resource API calls.
    pub fn from_config(config: &MagentoConfig, store: S) -> reqwest::Result<Self> {
        let client = build_client(config)?;
        let issuer = TokenIssuer::from_config(client.clone(), config);
        Ok(Self::new(store, issuer, client, ManagerSettings::from_config(config)))
    }

    pub fn service_name(&self) -> &str {
        &self.settings.service_name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached token when one is active and unexpired, a freshly issued one otherwise.
    /// A failing store lookup is not fatal: it falls through to issuance.
    pub async fn resolve_token(&self, service_name: &str) -> CredentialResult<String> {
        let metrics = get_metrics().await;
        let now = now();

        match self.store.find_current(service_name, now).await {
            Ok(Some(record)) if record.is_current(now) => {
                metrics.token_lookups.with_label_values(&[service_name, "hit"]).inc();
                debug!("token for '{}' retrieved from store (expires: {})", service_name, record.expires_at);
                return Ok(record.access_token);
            }
            Ok(_) => {
                metrics.token_lookups.with_label_values(&[service_name, "miss"]).inc();
                info!("no valid token for '{}' in store, issuing a new one", service_name);
            }
            Err(err) => {
                metrics.token_lookups.with_label_values(&[service_name, "store_error"]).inc();
                warn!("token lookup for '{}' failed, issuing a new one: {}", service_name, err);
            }
        }

        self.issue_token(service_name).await
    }

    /// Exchange credentials for a new token and upsert it, bypassing the cache.
    ///
    /// A token that cannot be persisted is still returned; the next
    /// resolution will issue again.
    pub async fn issue_token(&self, service_name: &str) -> CredentialResult<String> {
        let metrics = get_metrics().await;
        let start = Instant::now();
        metrics.issuance_requests.with_label_values(&[service_name]).inc();
        info!("issuing new token for '{}'", service_name);

        let token = self.issuer.request_token().await;
        metrics
            .issuance_duration
            .with_label_values(&[service_name])
            .observe(start.elapsed().as_secs_f64());

        let token = token.map_err(|err| {
            let reason = err
                .status()
                .map(|status| status.as_str().to_owned())
                .unwrap_or_else(|| "transport".to_owned());
            metrics.issuance_failures.with_label_values(&[service_name, reason.as_str()]).inc();
            error!("token issuance for '{}' failed: {}", service_name, err);
            err
        })?;

        let record = CredentialRecord::issued(service_name, token.clone(), now(), self.settings.cached_for)
            .ok_or_else(|| {
                metrics.issuance_failures.with_label_values(&[service_name, "expiry_overflow"]).inc();
                error!("token lifetime for '{}' overflows the expiry timestamp", service_name);
                CredentialError::Issuance {
                    status: None,
                    body: None,
                    message: format!("token lifetime {:?} overflows the expiry timestamp", self.settings.cached_for),
                }
            })?;
        match self.store.upsert(&record).await {
            Ok(stored) => {
                metrics
                    .token_expiry_unix
                    .with_label_values(&[service_name])
                    .set(stored.expires_at.timestamp());
                info!("token for '{}' stored (expires: {})", service_name, stored.expires_at);
            }
            Err(err) => {
                metrics.persist_failures.with_label_values(&[service_name]).inc();
                warn!("token for '{}' issued but not stored, continuing uncached: {}", service_name, err);
            }
        }

        Ok(token)
    }

    /// Call `endpoint` on the resource API with the current bearer token.
    ///
    /// A 401 triggers exactly one forced reissue and resend; the resend's
    /// outcome is final. Other failures are returned as they come.
    pub async fn authenticated_request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> CredentialResult<Value> {
        let url = self.endpoint_url(endpoint);
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| CredentialError::Request {
                status: None,
                body: None,
                message: format!("failed to serialize request body: {}", err),
            })?;

        let service_name = self.service_name();
        let mut token = self.resolve_token(service_name).await?;
        let mut state = RetryState::Initial;

        loop {
            match self.send(&method, &url, &token, payload.as_deref()).await {
                Ok(value) => {
                    if state.is_terminal() {
                        info!("{} {} succeeded after token refresh", method, endpoint);
                    }
                    return Ok(value);
                }
                Err(err) if err.is_unauthorized() => match state.on_unauthorized() {
                    Some(next) => {
                        warn!("{} {} got 401, forcing token refresh", method, endpoint);
                        get_metrics().await.api_auth_retries.with_label_values(&[service_name]).inc();
                        token = self.issue_token(service_name).await?;
                        state = next;
                    }
                    None => {
                        error!("{} {} failed even after token refresh: {}", method, endpoint, err);
                        return Err(err);
                    }
                },
                Err(err) => {
                    error!("{} {} failed: {}", method, endpoint, err);
                    return Err(err);
                }
            }
        }
    }

    /// Latest record of `service_name` regardless of activity or expiry.
    pub async fn get_status(&self, service_name: &str) -> CredentialResult<TokenStatus> {
        let record = self.store.find_latest(service_name).await?;
        Ok(record
            .map(|record| TokenStatus::from_record(&record, now()))
            .unwrap_or_else(TokenStatus::absent))
    }

    /// Release the store; call once on shutdown.
    pub async fn close(&self) {
        self.store.close().await;
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        payload: Option<&[u8]>,
    ) -> CredentialResult<Value> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json");
        if let Some(payload) = payload {
            request = request.body(payload.to_vec());
        }

        let response = request.send().await.map_err(|err| CredentialError::Request {
            status: err.status(),
            body: None,
            message: err.to_string(),
        })?;

        let status = response.status();
        get_metrics()
            .await
            .api_requests
            .with_label_values(&[method.as_str(), status.as_str()])
            .inc();

        let text = response.text().await.map_err(|err| CredentialError::Request {
            status: Some(status),
            body: None,
            message: format!("failed to read response body: {}", err),
        })?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(CredentialError::AuthorizationFailure { body: Some(text) });
        }
        if !status.is_success() {
            return Err(CredentialError::Request {
                status: Some(status),
                message: format!("{} {} responded with {}", method, url, status),
                body: Some(text),
            });
        }

        Ok(parse_body(&text))
    }
}

/// Certificate validation stays on unless the config explicitly disables it.
pub fn build_client(config: &MagentoConfig) -> reqwest::Result<Client> {
    if config.accept_invalid_certs {
        warn!("TLS certificate validation is DISABLED for Magento endpoints");
    }
    Client::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}
