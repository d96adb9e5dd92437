#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration, Utc};
    use httpmock::MockServer;

    use crate::cache::store::{StoreError, TokenStore};
    use crate::cache::token::CredentialRecord;
    use crate::cache::token_cache::MemoryTokenStore;
    use crate::credentials::manager::CredentialManager;
    use crate::errors::CredentialError;
    use crate::tests::common::{
        build_manager, expired_record, magento_config, mock_issuer, valid_record, UnavailableStore,
        SERVICE, TOKEN_PATH,
    };

    const UNUSED_API: &str = "http://127.0.0.1:9/rest/V1";

    #[tokio::test]
    async fn valid_record_is_reused_without_issuing() {
        let issuer = MockServer::start_async().await;
        let issue = mock_issuer(&issuer, 200, "\"never-used\"").await;

        let store = MemoryTokenStore::default();
        store.upsert(&valid_record("cached-token")).await.unwrap();
        let manager = build_manager(store, &issuer, UNUSED_API);

        let token = manager.resolve_token(SERVICE).await.unwrap();
        assert_eq!(token, "cached-token");
        let token = manager.resolve_token(SERVICE).await.unwrap();
        assert_eq!(token, "cached-token");
        assert_eq!(issue.hits_async().await, 0);
    }

    #[tokio::test]
    async fn missing_record_issues_once_and_strips_quotes() {
        let issuer = MockServer::start_async().await;
        let issue = mock_issuer(&issuer, 200, "\"abc123\"").await;
        let manager = build_manager(MemoryTokenStore::default(), &issuer, UNUSED_API);

        let token = manager.resolve_token(SERVICE).await.unwrap();
        assert_eq!(token, "abc123");
        assert_eq!(issue.hits_async().await, 1);

        let stored = manager.store().find_latest(SERVICE).await.unwrap().unwrap();
        assert_eq!(stored.access_token, "abc123");
        assert!(stored.is_active);
        assert_eq!(stored.expires_at - stored.updated_at, Duration::minutes(50));

        // second resolution is served from the store
        assert_eq!(manager.resolve_token(SERVICE).await.unwrap(), "abc123");
        assert_eq!(issue.hits_async().await, 1);
    }

    #[tokio::test]
    async fn expired_record_forces_reissue() {
        let issuer = MockServer::start_async().await;
        let issue = mock_issuer(&issuer, 200, "\"renewed\"").await;

        let store = MemoryTokenStore::default();
        let stale = expired_record("stale");
        store.upsert(&stale).await.unwrap();
        let manager = build_manager(store, &issuer, UNUSED_API);

        assert_eq!(manager.resolve_token(SERVICE).await.unwrap(), "renewed");
        assert_eq!(issue.hits_async().await, 1);

        let stored = manager.store().find_latest(SERVICE).await.unwrap().unwrap();
        assert_eq!(stored.access_token, "renewed");
        assert_eq!(stored.created_at, stale.created_at);
        assert!(stored.expires_at > stale.expires_at);
        assert_eq!(stored.expires_at - stored.updated_at, Duration::minutes(50));
    }

    #[tokio::test]
    async fn inactive_record_is_never_returned() {
        let issuer = MockServer::start_async().await;
        let issue = mock_issuer(&issuer, 200, "\"reactivated\"").await;

        let mut inactive = valid_record("disabled");
        inactive.is_active = false;
        // upsert always activates the row, so the store hands it out directly
        let inactive_store = InactiveStore { record: inactive, inner: MemoryTokenStore::default() };
        let manager = build_manager(inactive_store, &issuer, UNUSED_API);

        assert_eq!(manager.resolve_token(SERVICE).await.unwrap(), "reactivated");
        assert_eq!(issue.hits_async().await, 1);
    }

    #[tokio::test]
    async fn store_outage_falls_back_to_issuance() {
        let issuer = MockServer::start_async().await;
        let issue = mock_issuer(&issuer, 200, "\"uncached\"").await;
        let manager = build_manager(UnavailableStore, &issuer, UNUSED_API);

        // lookup and upsert both fail, the issued token is still handed out
        assert_eq!(manager.resolve_token(SERVICE).await.unwrap(), "uncached");
        assert_eq!(manager.resolve_token(SERVICE).await.unwrap(), "uncached");
        assert_eq!(issue.hits_async().await, 2);
    }

    #[tokio::test]
    async fn issuer_rejection_surfaces_status_and_body() {
        let issuer = MockServer::start_async().await;
        let issue = mock_issuer(&issuer, 401, r#"{"message":"The account sign-in was incorrect"}"#).await;
        let manager = build_manager(MemoryTokenStore::default(), &issuer, UNUSED_API);

        let err = manager.resolve_token(SERVICE).await.unwrap_err();
        match &err {
            CredentialError::Issuance { status, body, .. } => {
                assert_eq!(status.map(|s| s.as_u16()), Some(401));
                assert!(body.as_deref().unwrap().contains("sign-in was incorrect"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(issue.hits_async().await, 1);
        assert!(manager.store().is_empty().await);
    }

    #[tokio::test]
    async fn unreachable_issuer_is_an_issuance_error() {
        let config = magento_config(
            "http://127.0.0.1:9/rest/all/V1/integration/admin/token".to_owned(),
            UNUSED_API.to_owned(),
        );
        let manager = CredentialManager::from_config(&config, MemoryTokenStore::default()).unwrap();

        let err = manager.issue_token(SERVICE).await.unwrap_err();
        assert!(matches!(err, CredentialError::Issuance { status: None, .. }));
    }

    #[tokio::test]
    async fn oversized_lifetime_fails_issuance_without_panicking() {
        let issuer = MockServer::start_async().await;
        let _issue = mock_issuer(&issuer, 200, "\"abc123\"").await;
        let mut config = magento_config(issuer.url(TOKEN_PATH), UNUSED_API.to_owned());
        config.token_lifetime_minutes = 1_000_000_000_000;
        let manager = CredentialManager::from_config(&config, MemoryTokenStore::default()).unwrap();

        let err = manager.issue_token(SERVICE).await.unwrap_err();
        match &err {
            CredentialError::Issuance { status, message, .. } => {
                assert_eq!(*status, None);
                assert!(message.contains("overflows the expiry timestamp"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(manager.store().is_empty().await);
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let issuer = MockServer::start_async().await;
        let _issue = mock_issuer(&issuer, 200, "\"\"").await;
        let manager = build_manager(MemoryTokenStore::default(), &issuer, UNUSED_API);

        let err = manager.issue_token(SERVICE).await.unwrap_err();
        assert!(matches!(err, CredentialError::Issuance { .. }));
        assert!(manager.store().is_empty().await);
    }

    /// Serves one fixed inactive record for reads, delegates writes.
    struct InactiveStore {
        record: CredentialRecord,
        inner: MemoryTokenStore,
    }

    impl TokenStore for InactiveStore {
        async fn find_current(
            &self,
            _service_name: &str,
            _now: DateTime<Utc>,
        ) -> Result<Option<CredentialRecord>, StoreError> {
            // ignores the active filter on purpose
            Ok(Some(self.record.clone()))
        }

        async fn find_latest(&self, service_name: &str) -> Result<Option<CredentialRecord>, StoreError> {
            self.inner.find_latest(service_name).await
        }

        async fn upsert(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
            self.inner.upsert(record).await
        }

        async fn close(&self) {}
    }
}
