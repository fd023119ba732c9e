//! Access-token lifecycle for one stored user.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info, warn};

use super::db::{self, StoredUser};
use crate::services::ServiceError;
use crate::services::TokenProvider;
use crate::services::spotify::AccountsClient;
use crate::services::spotify::dto::TokenResponse;

/// Tokens are refreshed this long before the reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the accounts service omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError>;
}

#[async_trait]
impl TokenRefresher for AccountsClient {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        AccountsClient::refresh(self, refresh_token).await
    }
}

#[derive(Debug, Clone)]
struct CachedTokens {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

/// [`TokenProvider`] backed by a stored user.
///
/// Serves the cached access token until it is about to expire, then uses the
/// refresh token and writes the rotated tokens back to the database.
pub struct TokenManager {
    pool: SqlitePool,
    user_id: i64,
    refresher: Arc<dyn TokenRefresher>,
    cache: Mutex<CachedTokens>,
}

impl TokenManager {
    pub fn new(pool: SqlitePool, user: &StoredUser, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            pool,
            user_id: user.id,
            refresher,
            cache: Mutex::new(CachedTokens {
                access_token: user.access_token.clone(),
                refresh_token: user.refresh_token.clone(),
                expires_at: user.token_expires_at,
            }),
        }
    }

    /// Expiry of the cached access token.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.cache.lock().expires_at
    }

    async fn do_refresh(&self) -> Result<String, ServiceError> {
        let refresh_token = self.cache.lock().refresh_token.clone();

        let response = self.refresher.refresh(&refresh_token).await.map_err(|e| match e {
            ServiceError::ServiceUnavailable(_) => e,
            other => {
                warn!(user_id = self.user_id, error = %other, "Token refresh rejected");
                ServiceError::AuthExpired
            }
        })?;

        let lifetime = response.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);
        let tokens = CachedTokens {
            access_token: response.access_token,
            refresh_token: response.refresh_token.unwrap_or(refresh_token),
            expires_at: Utc::now() + Duration::seconds(lifetime),
        };

        if let Err(e) = db::update_tokens(
            &self.pool,
            self.user_id,
            &tokens.access_token,
            &tokens.refresh_token,
            tokens.expires_at,
        )
        .await
        {
            // The new token still works for this process
            warn!(user_id = self.user_id, error = %e, "Failed to persist refreshed tokens");
        }

        info!(user_id = self.user_id, "Refreshed access token");
        let access = tokens.access_token.clone();
        *self.cache.lock() = tokens;
        Ok(access)
    }
}

#[async_trait]
impl TokenProvider for TokenManager {
    async fn access_token(&self) -> Result<String, ServiceError> {
        let cached = {
            let cache = self.cache.lock();
            (cache.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now())
                .then(|| cache.access_token.clone())
        };
        match cached {
            Some(token) => Ok(token),
            None => {
                debug!(user_id = self.user_id, "Access token expired");
                self.do_refresh().await
            }
        }
    }

    async fn refresh(&self) -> Result<String, ServiceError> {
        self.do_refresh().await
    }
}

/// Provider for a token that is used as-is and cannot be refreshed.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, ServiceError> {
        Ok(self.0.clone())
    }

    async fn refresh(&self) -> Result<String, ServiceError> {
        Err(ServiceError::AuthExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::db::{UserTokens, get_user, upsert_user};
    use crate::test_utils::temp_db;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockRefresher {
        result: Result<TokenResponse, ServiceError>,
        calls: AtomicUsize,
    }

    impl MockRefresher {
        fn ok(access: &str, rotated: Option<&str>) -> Self {
            Self {
                result: Ok(TokenResponse {
                    access_token: access.into(),
                    token_type: Some("Bearer".into()),
                    expires_in: Some(3600),
                    refresh_token: rotated.map(String::from),
                    scope: None,
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: ServiceError) -> Self {
            Self {
                result: Err(error),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenRefresher for MockRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<TokenResponse, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    async fn stored_user(pool: &SqlitePool, expires_in: Duration) -> StoredUser {
        upsert_user(
            pool,
            &UserTokens {
                spotify_user_id: "listener",
                display_name: None,
                email: None,
                access_token: "old-access",
                refresh_token: "old-refresh",
                token_expires_at: Utc::now() + expires_in,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_is_served_from_cache() {
        let (pool, _dir) = temp_db().await;
        let user = stored_user(&pool, Duration::hours(1)).await;
        let refresher = Arc::new(MockRefresher::ok("new-access", None));
        let manager = TokenManager::new(pool, &user, refresher.clone());

        assert_eq!(manager.access_token().await.unwrap(), "old-access");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_persisted() {
        let (pool, _dir) = temp_db().await;
        let user = stored_user(&pool, Duration::seconds(-10)).await;
        let refresher = Arc::new(MockRefresher::ok("new-access", Some("new-refresh")));
        let manager = TokenManager::new(pool.clone(), &user, refresher.clone());

        assert_eq!(manager.access_token().await.unwrap(), "new-access");
        assert_eq!(manager.access_token().await.unwrap(), "new-access");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert!(manager.expires_at() > Utc::now());

        let stored = get_user(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored.access_token, "new-access");
        assert_eq!(stored.refresh_token, "new-refresh");
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_not_rotated() {
        let (pool, _dir) = temp_db().await;
        let user = stored_user(&pool, Duration::hours(1)).await;
        let manager = TokenManager::new(
            pool.clone(),
            &user,
            Arc::new(MockRefresher::ok("new-access", None)),
        );

        manager.refresh().await.unwrap();

        let stored = get_user(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token, "old-refresh");
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_auth_expired() {
        let (pool, _dir) = temp_db().await;
        let user = stored_user(&pool, Duration::seconds(-10)).await;
        let manager = TokenManager::new(
            pool,
            &user,
            Arc::new(MockRefresher::failing(ServiceError::Api {
                status: 403,
                message: "forbidden".into(),
            })),
        );

        assert!(matches!(
            manager.access_token().await,
            Err(ServiceError::AuthExpired)
        ));
    }

    #[tokio::test]
    async fn test_unavailable_accounts_service_propagates() {
        let (pool, _dir) = temp_db().await;
        let user = stored_user(&pool, Duration::seconds(-10)).await;
        let manager = TokenManager::new(
            pool,
            &user,
            Arc::new(MockRefresher::failing(ServiceError::ServiceUnavailable(
                "down".into(),
            ))),
        );

        assert!(matches!(
            manager.refresh().await,
            Err(ServiceError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_static_token_cannot_refresh() {
        let token = StaticToken("abc".into());
        assert_eq!(token.access_token().await.unwrap(), "abc");
        assert!(matches!(token.refresh().await, Err(ServiceError::AuthExpired)));
    }
}
