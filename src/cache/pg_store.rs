use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::cache::store::{StoreError, TokenStore};
use crate::cache::token::CredentialRecord;
use crate::config::service::StoreConfig;

const SELECT_CURRENT: &str = r#"
    SELECT service_name, access_token, expires_at, is_active, created_at, updated_at
    FROM magento_tokens
    WHERE service_name = $1
      AND is_active = true
      AND expires_at > $2
    ORDER BY updated_at DESC
    LIMIT 1
"#;

const SELECT_LATEST: &str = r#"
    SELECT service_name, access_token, expires_at, is_active, created_at, updated_at
    FROM magento_tokens
    WHERE service_name = $1
    ORDER BY updated_at DESC
    LIMIT 1
"#;

const UPSERT: &str = r#"
    INSERT INTO magento_tokens (service_name, access_token, expires_at, is_active, created_at, updated_at)
    VALUES ($1, $2, $3, true, $4, $4)
    ON CONFLICT (service_name)
    DO UPDATE SET
        access_token = EXCLUDED.access_token,
        expires_at = EXCLUDED.expires_at,
        updated_at = EXCLUDED.updated_at,
        is_active = true
    RETURNING service_name, access_token, expires_at, is_active, created_at, updated_at
"#;

/// Postgres-backed token store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        info!("token store connected, max connections: {}", config.max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        info!("token store migrations applied");
        Ok(())
    }
}

impl TokenStore for PgTokenStore {
    async fn find_current(
        &self,
        service_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRecord>(SELECT_CURRENT)
            .bind(service_name)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_latest(&self, service_name: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRecord>(SELECT_LATEST)
            .bind(service_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let row = sqlx::query_as::<_, CredentialRecord>(UPSERT)
            .bind(&record.service_name)
            .bind(&record.access_token)
            .bind(record.expires_at)
            .bind(record.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("token store connection pool closed");
    }
}
