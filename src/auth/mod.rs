//! Spotify authorization.
//!
//! Users log in once through the authorization-code flow; their tokens are
//! stored in the `users` table. A [`TokenManager`] then keeps the access
//! token fresh for the duration of a command.

mod db;
mod manager;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::info;

use crate::services::ServiceError;
use crate::services::spotify::dto::{TokenResponse, UserProfile};
use crate::services::spotify::{AccountsClient, SpotifyClient};

pub use db::{StoredUser, UserTokens, get_user, latest_user, update_tokens, upsert_user};
pub use manager::{StaticToken, TokenManager, TokenRefresher};

/// Errors from logging in or loading a user.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not logged in; run `playlist-agent auth login <code>` first")]
    NotLoggedIn,

    #[error("No user with id {0}")]
    UnknownUser(i64),

    #[error("Token response did not include a refresh token")]
    NoRefreshToken,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Complete the authorization-code flow and store the user.
pub async fn login(
    pool: &SqlitePool,
    accounts: &AccountsClient,
    code: &str,
    redirect_uri: &str,
    timeout: StdDuration,
) -> Result<StoredUser, AuthError> {
    let tokens = accounts.exchange_code(code.trim(), redirect_uri).await?;

    let token = StaticToken(tokens.access_token.clone());
    let spotify = SpotifyClient::new(Arc::new(token), timeout)?;
    let profile = spotify.current_user().await?;

    store_login(pool, &profile, tokens).await
}

/// Persist the result of a successful code exchange.
pub async fn store_login(
    pool: &SqlitePool,
    profile: &UserProfile,
    tokens: TokenResponse,
) -> Result<StoredUser, AuthError> {
    let refresh_token = tokens.refresh_token.ok_or(AuthError::NoRefreshToken)?;
    let expires_at = Utc::now() + Duration::seconds(tokens.expires_in.unwrap_or(3600));

    let user = upsert_user(
        pool,
        &UserTokens {
            spotify_user_id: &profile.id,
            display_name: profile.display_name.as_deref(),
            email: profile.email.as_deref(),
            access_token: &tokens.access_token,
            refresh_token: &refresh_token,
            token_expires_at: expires_at,
        },
    )
    .await?;

    info!(user_id = user.id, spotify_user_id = %user.spotify_user_id, "Logged in");
    Ok(user)
}

/// Load a user by id, or the most recent login when `id` is `None`.
pub async fn load_user(pool: &SqlitePool, id: Option<i64>) -> Result<StoredUser, AuthError> {
    match id {
        Some(id) => get_user(pool, id).await?.ok_or(AuthError::UnknownUser(id)),
        None => latest_user(pool).await?.ok_or(AuthError::NotLoggedIn),
    }
}
