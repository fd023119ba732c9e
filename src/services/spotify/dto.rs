//! Spotify Web API Data Transfer Objects
//!
//! These types match what the Spotify Web API returns for the endpoints we
//! call. Only the fields we read are declared; serde ignores the rest.
//! DO NOT use these types outside the spotify module - convert to domain types.
//!
//! API Reference: https://developer.spotify.com/documentation/web-api

use serde::{Deserialize, Serialize};

/// `GET /me/following?type=artist`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FollowedArtistsResponse {
    pub artists: CursorPage<ArtistObject>,
}

/// Cursor-paginated list (used by the following endpoint)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CursorPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// URL of the next page, if any (not followed)
    pub next: Option<String>,
    pub total: Option<u32>,
}

/// Offset-paginated list (used by the playlists endpoint)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next: Option<String>,
    pub total: Option<u32>,
}

/// Full artist object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
}

/// Simplified artist (as embedded in tracks)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimpleArtist {
    pub id: Option<String>,
    pub name: String,
}

/// `GET /artists/{id}/top-tracks`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopTracksResponse {
    #[serde(default)]
    pub tracks: Vec<TrackObject>,
}

/// Full track object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackObject {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub explicit: bool,
    pub album: Option<AlbumObject>,
    #[serde(default)]
    pub artists: Vec<SimpleArtist>,
    pub popularity: Option<u32>,
}

/// Simplified album (as embedded in tracks)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumObject {
    pub id: Option<String>,
    pub name: Option<String>,
    /// "YYYY", "YYYY-MM" or "YYYY-MM-DD"
    pub release_date: Option<String>,
    pub release_date_precision: Option<String>,
}

/// `GET /me`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// `POST /users/{id}/playlists` request body
#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistBody<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}

/// `POST /playlists/{id}/tracks` request body
#[derive(Debug, Clone, Serialize)]
pub struct AddItemsBody {
    pub uris: Vec<String>,
}

/// Playlist object (created or listed)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistObject {
    pub id: String,
    pub name: String,
    pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

/// Accounts service token response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Lifetime in seconds
    pub expires_in: Option<i64>,
    /// Only present when the accounts service rotates the refresh token
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Error envelope returned by the Web API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================
