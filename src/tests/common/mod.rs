// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use chrono::{DateTime, Duration, Utc};
use httpmock::Method::POST;
use httpmock::{Mock, MockServer};
use std::net::SocketAddr;

use crate::cache::store::{StoreError, TokenStore};
use crate::cache::token::CredentialRecord;
use crate::config::service::{MagentoConfig, Secret};
use crate::credentials::manager::CredentialManager;

pub const SERVICE: &str = "magento_api";
pub const TOKEN_PATH: &str = "/rest/all/V1/integration/admin/token";
pub const USERNAME: &str = "api-admin";
pub const PASSWORD: &str = "s3cret";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn magento_config(token_url: String, base_url: String) -> MagentoConfig {
    MagentoConfig {
        service_name: SERVICE.to_owned(),
        base_url,
        token_url,
        username: USERNAME.to_owned(),
        password: Secret::new(PASSWORD),
        token_lifetime_minutes: 60,
        safety_margin_minutes: 10,
        accept_invalid_certs: false,
    }
}

/// Manager talking to `issuer` for tokens and to `api_base` for resources.
pub fn build_manager<S: TokenStore>(store: S, issuer: &MockServer, api_base: &str) -> CredentialManager<S> {
    let config = magento_config(issuer.url(TOKEN_PATH), api_base.to_owned());
    CredentialManager::from_config(&config, store).expect("manager")
}

/// Issuer that answers the configured credentials with `body`.
pub async fn mock_issuer<'a>(server: &'a MockServer, status: u16, body: &str) -> Mock<'a> {
    let body = body.to_owned();
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(TOKEN_PATH)
                .json_body(json!({ "username": USERNAME, "password": PASSWORD }));
            then.status(status)
                .header("Content-Type", "application/json")
                .body(body);
        })
        .await
}

pub fn record_issued_at(token: &str, issued_at: DateTime<Utc>) -> CredentialRecord {
    CredentialRecord::issued(SERVICE, token.to_owned(), issued_at, Duration::minutes(50)).unwrap()
}

pub fn valid_record(token: &str) -> CredentialRecord {
    record_issued_at(token, Utc::now() - Duration::minutes(5))
}

/// Active record whose expiry passed one minute ago.
pub fn expired_record(token: &str) -> CredentialRecord {
    record_issued_at(token, Utc::now() - Duration::minutes(51))
}

/// Store whose every call fails, as a database that is down.
#[derive(Debug, Clone, Default)]
pub struct UnavailableStore;

impl TokenStore for UnavailableStore {
    async fn find_current(
        &self,
        _service_name: &str,
        _now: DateTime<Utc>,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_owned()))
    }

    async fn find_latest(&self, _service_name: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_owned()))
    }

    async fn upsert(&self, _record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_owned()))
    }

    async fn close(&self) {}
}
