use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::helpers::time::minutes_until;

/// One row of `magento_tokens`: the cached bearer token for a service identity.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CredentialRecord {
    pub service_name: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Record for a token issued at `issued_at`, valid in cache for `cached_for`.
    /// `None` when the expiry falls outside the representable date range.
    pub fn issued(
        service_name: &str,
        access_token: String,
        issued_at: DateTime<Utc>,
        cached_for: Duration,
    ) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(cached_for)?;
        Some(Self {
            service_name: service_name.to_owned(),
            access_token,
            expires_at,
            is_active: true,
            created_at: issued_at,
            updated_at: issued_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Active and not yet expired.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }
}

/// Diagnostic view over the latest record of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub has_token: bool,
    pub is_active: bool,
    pub is_expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub minutes_until_expiry: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl TokenStatus {
    pub fn absent() -> Self {
        Self {
            has_token: false,
            is_active: false,
            is_expired: true,
            expires_at: None,
            minutes_until_expiry: 0,
            last_updated: None,
        }
    }

    pub fn from_record(record: &CredentialRecord, now: DateTime<Utc>) -> Self {
        Self {
            has_token: true,
            is_active: record.is_active,
            is_expired: record.is_expired(now),
            expires_at: Some(record.expires_at),
            minutes_until_expiry: minutes_until(record.expires_at, now),
            last_updated: Some(record.updated_at),
        }
    }
}
