use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cache::token::CredentialRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence capability behind the credential manager.
///
/// Implementations must make `upsert` atomic: token, expiry, `updated_at`
/// and the active flag of a service row change together or not at all.
pub trait TokenStore: Send + Sync + 'static {
    /// Newest active record of `service_name` with `expires_at > now`.
    fn find_current(
        &self,
        service_name: &str,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<CredentialRecord>, StoreError>> + Send;

    /// Newest record of `service_name`, ignoring the active flag and expiry.
    fn find_latest(
        &self,
        service_name: &str,
    ) -> impl std::future::Future<Output = Result<Option<CredentialRecord>, StoreError>> + Send;

    /// Insert or replace the row keyed by `record.service_name`.
    /// `created_at` of an existing row is kept.
    fn upsert(
        &self,
        record: &CredentialRecord,
    ) -> impl std::future::Future<Output = Result<CredentialRecord, StoreError>> + Send;

    fn close(&self) -> impl std::future::Future<Output = ()> + Send;
}
