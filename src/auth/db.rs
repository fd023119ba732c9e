//! Database operations for authorized users.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::model::UserContext;

/// A Spotify account with its stored OAuth tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: i64,
    pub spotify_user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
}

impl StoredUser {
    /// Identity to pass through a generation request.
    pub fn context(&self) -> UserContext {
        UserContext {
            user_id: self.id,
            spotify_user_id: self.spotify_user_id.clone(),
            display_name: self.display_name.clone(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at <= now
    }
}

/// Fields written on login.
#[derive(Debug, Clone)]
pub struct UserTokens<'a> {
    pub spotify_user_id: &'a str,
    pub display_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub access_token: &'a str,
    pub refresh_token: &'a str,
    pub token_expires_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    spotify_user_id: String,
    display_name: Option<String>,
    email: Option<String>,
    access_token: String,
    refresh_token: String,
    token_expires_at: String,
}

impl From<UserRow> for StoredUser {
    fn from(row: UserRow) -> Self {
        StoredUser {
            id: row.id,
            spotify_user_id: row.spotify_user_id,
            display_name: row.display_name,
            email: row.email,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            // Unparseable expiry forces a refresh on first use
            token_expires_at: row
                .token_expires_at
                .parse()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

const USER_COLUMNS: &str =
    "id, spotify_user_id, display_name, email, access_token, refresh_token, token_expires_at";

/// Insert a user or update the existing row for the same Spotify account.
pub async fn upsert_user(pool: &SqlitePool, tokens: &UserTokens<'_>) -> sqlx::Result<StoredUser> {
    let now = Utc::now().to_rfc3339();
    let row: UserRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO users (
            spotify_user_id, display_name, email,
            access_token, refresh_token, token_expires_at,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(spotify_user_id) DO UPDATE SET
            display_name = excluded.display_name,
            email = excluded.email,
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            token_expires_at = excluded.token_expires_at,
            updated_at = excluded.updated_at
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(tokens.spotify_user_id)
    .bind(tokens.display_name)
    .bind(tokens.email)
    .bind(tokens.access_token)
    .bind(tokens.refresh_token)
    .bind(tokens.token_expires_at.to_rfc3339())
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Get a user by local id.
pub async fn get_user(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<StoredUser>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Into::into))
}

/// The most recently logged-in (or refreshed) user.
pub async fn latest_user(pool: &SqlitePool) -> sqlx::Result<Option<StoredUser>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY updated_at DESC, id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

/// Store refreshed tokens.
pub async fn update_tokens(
    pool: &SqlitePool,
    id: i64,
    access_token: &str,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET access_token = ?, refresh_token = ?, token_expires_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_db;
    use chrono::Duration;

    fn tokens<'a>(spotify_id: &'a str, access: &'a str) -> UserTokens<'a> {
        UserTokens {
            spotify_user_id: spotify_id,
            display_name: Some("Listener"),
            email: None,
            access_token: access,
            refresh_token: "refresh",
            token_expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let (pool, _dir) = temp_db().await;

        let user = upsert_user(&pool, &tokens("spotify-1", "a1")).await.unwrap();
        assert_eq!(user.spotify_user_id, "spotify-1");
        assert_eq!(user.access_token, "a1");

        let fetched = get_user(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(fetched, user);
        assert!(get_user(&pool, user.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_same_account_updates_in_place() {
        let (pool, _dir) = temp_db().await;

        let first = upsert_user(&pool, &tokens("spotify-1", "a1")).await.unwrap();
        let second = upsert_user(&pool, &tokens("spotify-1", "a2")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.access_token, "a2");
    }

    #[tokio::test]
    async fn test_latest_user() {
        let (pool, _dir) = temp_db().await;
        assert!(latest_user(&pool).await.unwrap().is_none());

        upsert_user(&pool, &tokens("spotify-1", "a1")).await.unwrap();
        let second = upsert_user(&pool, &tokens("spotify-2", "b1")).await.unwrap();

        assert_eq!(latest_user(&pool).await.unwrap().unwrap().id, second.id);
    }

    #[tokio::test]
    async fn test_update_tokens() {
        let (pool, _dir) = temp_db().await;
        let user = upsert_user(&pool, &tokens("spotify-1", "a1")).await.unwrap();
        let expires = Utc::now() + Duration::hours(2);

        assert!(update_tokens(&pool, user.id, "a2", "r2", expires).await.unwrap());

        let fetched = get_user(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(fetched.access_token, "a2");
        assert_eq!(fetched.refresh_token, "r2");
        assert_eq!(fetched.token_expires_at.timestamp(), expires.timestamp());
    }

    #[test]
    fn test_context_and_expiry() {
        let now = Utc::now();
        let user = StoredUser {
            id: 3,
            spotify_user_id: "sp".into(),
            display_name: None,
            email: None,
            access_token: "a".into(),
            refresh_token: "r".into(),
            token_expires_at: now,
        };
        assert!(user.is_expired(now));
        assert!(!user.is_expired(now - Duration::seconds(1)));
        assert_eq!(user.context().user_id, 3);
        assert_eq!(user.context().label(), "sp");
    }
}
