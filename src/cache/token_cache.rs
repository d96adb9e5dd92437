use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::store::{StoreError, TokenStore};
use crate::cache::token::CredentialRecord;

/// In-process token store: service_name -> record.
/// Not durable; tokens are lost with the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<RwLock<HashMap<String, CredentialRecord>>>,
}

impl MemoryTokenStore {
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn find_current(
        &self,
        service_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let map = self.inner.read().await;
        Ok(map
            .get(service_name)
            .filter(|record| record.is_current(now))
            .cloned())
    }

    async fn find_latest(&self, service_name: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.inner.read().await.get(service_name).cloned())
    }

    async fn upsert(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let mut map = self.inner.write().await;
        let stored = match map.get(&record.service_name) {
            Some(existing) => CredentialRecord {
                created_at: existing.created_at,
                is_active: true,
                ..record.clone()
            },
            None => CredentialRecord { is_active: true, ..record.clone() },
        };
        map.insert(stored.service_name.to_owned(), stored.clone());
        Ok(stored)
    }

    async fn close(&self) {}
}
