//! Spotify HTTP clients
//!
//! [`SpotifyClient`] talks to the Web API on behalf of one user.
//! [`AccountsClient`] talks to the accounts service (code exchange and
//! refresh-token grant).
//!
//! See: https://developer.spotify.com/documentation/web-api
//!
//! ## Token handling
//! Every Web API call fetches the current token from a [`TokenProvider`].
//! A 401 triggers exactly one forced refresh and one retry; a second 401
//! surfaces as [`ServiceError::AuthExpired`]. Nothing else is retried here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use super::{adapter, dto};
use crate::model::{Artist, CreatedPlaylist, PlaylistSummary, Track, UserContext};
use crate::services::domain::ServiceError;
use crate::services::traits::TokenProvider;

/// Web API root
const API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Accounts service root
const ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";

/// The following endpoint returns at most 50 artists per page
pub const MAX_FOLLOWED_PAGE: u32 = 50;

/// The add-items endpoint accepts at most 100 URIs per call
const MAX_ITEMS_PER_ADD: usize = 100;

/// Upper bound on playlist pages walked when listing the library
const MAX_PLAYLIST_PAGES: usize = 20;

/// Scopes requested during login
pub const SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "user-follow-read",
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
];

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ServiceError> {
    reqwest::Client::builder()
        .gzip(true)
        .timeout(timeout)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(|e| ServiceError::NotConfigured(format!("HTTP client: {}", e)))
}

/// Turn a non-success response into a [`ServiceError`], reading the
/// Web API error envelope when there is one.
async fn error_from_response(response: reqwest::Response) -> ServiceError {
    let status = response.status();
    let message = match response.json::<dto::ApiErrorResponse>().await {
        Ok(body) => body.error.message,
        Err(_) => status.canonical_reason().unwrap_or("Unknown").to_string(),
    };
    ServiceError::from_status(status, message)
}

/// Spotify Web API client for a single user
pub struct SpotifyClient {
    http_client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl SpotifyClient {
    /// Create a client that authenticates through `tokens`
    pub fn new(tokens: Arc<dyn TokenProvider>, timeout: Duration) -> Result<Self, ServiceError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: API_BASE_URL.to_string(),
            tokens,
        })
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(tokens: Arc<dyn TokenProvider>, base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
            tokens,
        }
    }

    /// Artists the user follows (first page only, at most 50)
    pub async fn followed_artists(&self, limit: u32) -> Result<Vec<Artist>, ServiceError> {
        let limit = limit.clamp(1, MAX_FOLLOWED_PAGE);
        let url = format!("{}/me/following", self.base_url);
        let response = self
            .send(|token| {
                self.http_client
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[("type", "artist".to_string()), ("limit", limit.to_string())])
            })
            .await?;

        let body = parse::<dto::FollowedArtistsResponse>(response).await?;
        if body.artists.next.is_some() {
            tracing::debug!(
                "User follows more than {} artists; only the first page is used",
                limit
            );
        }
        Ok(adapter::to_artists(body))
    }

    /// An artist's top tracks in `country`
    pub async fn artist_top_tracks(
        &self,
        artist_id: &str,
        country: &str,
    ) -> Result<Vec<Track>, ServiceError> {
        let url = format!(
            "{}/artists/{}/top-tracks",
            self.base_url,
            urlencoding::encode(artist_id)
        );
        let response = self
            .send(|token| {
                self.http_client
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[("market", country)])
            })
            .await?;

        let body = parse::<dto::TopTracksResponse>(response).await?;
        Ok(adapter::to_tracks(body, artist_id))
    }

    /// Profile of the token's owner
    pub async fn current_user(&self) -> Result<dto::UserProfile, ServiceError> {
        let url = format!("{}/me", self.base_url);
        let response = self
            .send(|token| self.http_client.get(&url).bearer_auth(token))
            .await?;
        parse(response).await
    }

    /// Create a private playlist and fill it with `track_ids` in order
    pub async fn create_playlist(
        &self,
        user: &UserContext,
        name: &str,
        description: &str,
        track_ids: &[String],
    ) -> Result<CreatedPlaylist, ServiceError> {
        let url = format!(
            "{}/users/{}/playlists",
            self.base_url,
            urlencoding::encode(&user.spotify_user_id)
        );
        let body = dto::CreatePlaylistBody {
            name,
            description,
            public: false,
        };
        let response = self
            .send(|token| self.http_client.post(&url).bearer_auth(token).json(&body))
            .await?;
        let created = adapter::to_created_playlist(parse(response).await?);

        let uris: Vec<String> = track_ids.iter().map(|id| adapter::track_uri(id)).collect();
        if let Err(e) = self.add_items(&created.id, &uris).await {
            // Don't leave a half-filled playlist behind
            if let Err(cleanup) = self.unfollow_playlist(&created.id).await {
                tracing::warn!(
                    "Could not remove partial playlist {}: {}",
                    created.id,
                    cleanup
                );
            }
            return Err(e);
        }

        tracing::info!(
            "Created playlist {:?} ({}) with {} tracks",
            name,
            created.id,
            uris.len()
        );
        Ok(created)
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), ServiceError> {
        let url = format!(
            "{}/playlists/{}/tracks",
            self.base_url,
            urlencoding::encode(playlist_id)
        );
        for batch in uris.chunks(MAX_ITEMS_PER_ADD) {
            let body = dto::AddItemsBody {
                uris: batch.to_vec(),
            };
            self.send(|token| self.http_client.post(&url).bearer_auth(token).json(&body))
                .await?;
        }
        Ok(())
    }

    /// Every playlist in the user's library
    pub async fn user_playlists(&self) -> Result<Vec<PlaylistSummary>, ServiceError> {
        let mut next = Some(format!("{}/me/playlists?limit=50", self.base_url));
        let mut playlists = Vec::new();

        for _ in 0..MAX_PLAYLIST_PAGES {
            let Some(url) = next.take() else { break };
            let response = self
                .send(|token| self.http_client.get(&url).bearer_auth(token))
                .await?;
            let page = parse::<dto::Page<dto::PlaylistObject>>(response).await?;
            next = page.next.clone();
            playlists.extend(adapter::to_playlist_summaries(page));
        }

        Ok(playlists)
    }

    /// Remove a playlist from the user's library
    pub async fn unfollow_playlist(&self, playlist_id: &str) -> Result<(), ServiceError> {
        let url = format!(
            "{}/playlists/{}/followers",
            self.base_url,
            urlencoding::encode(playlist_id)
        );
        self.send(|token| self.http_client.delete(&url).bearer_auth(token))
            .await?;
        Ok(())
    }

    /// Send an authorized request, refreshing the token once on 401
    async fn send<F>(&self, build: F) -> Result<reqwest::Response, ServiceError>
    where
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let token = self.tokens.access_token().await?;
        let response = build(&token)
            .send()
            .await
            .map_err(ServiceError::from_transport)?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("Access token rejected, refreshing and retrying once");
            let token = self.tokens.refresh().await?;
            let retried = build(&token)
                .send()
                .await
                .map_err(ServiceError::from_transport)?;
            if retried.status() == StatusCode::UNAUTHORIZED {
                return Err(ServiceError::AuthExpired);
            }
            retried
        } else {
            response
        };

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Parse a JSON body into a DTO
async fn parse<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::Parse(e.to_string()))
}

/// Spotify accounts service client (OAuth authorization-code flow)
pub struct AccountsClient {
    http_client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl AccountsClient {
    /// Create a client with the app's credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: ACCOUNTS_BASE_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    /// URL the user opens to grant access
    pub fn authorize_url(&self, redirect_uri: &str) -> String {
        format!(
            "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&SCOPES.join(" "))
        )
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<dto::TokenResponse, ServiceError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    /// Get a new access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<dto::TokenResponse, ServiceError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<dto::TokenResponse, ServiceError> {
        let response = self
            .http_client
            .post(format!("{}/api/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(ServiceError::from_transport)?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            // invalid_grant / invalid_client: the stored grant is unusable
            return Err(ServiceError::AuthExpired);
        }
        if !status.is_success() {
            return Err(ServiceError::from_status(
                status,
                status.canonical_reason().unwrap_or("Unknown"),
            ));
        }
        parse(response).await
    }
}
