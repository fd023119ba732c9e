//! Trait definitions for external service clients.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.
//!
//! # Example
//!
//! ```ignore
//! use playlist_agent::services::traits::MusicService;
//!
//! // In production code:
//! async fn count<T: MusicService>(client: &T) -> usize {
//!     client.followed_artists(50).await.map(|a| a.len()).unwrap_or(0)
//! }
//!
//! // In tests:
//! struct MockMusic { ... }
//! impl MusicService for MockMusic { ... }
//! ```

use async_trait::async_trait;

use super::domain::{ExtractedParams, ServiceError};
use crate::model::{Artist, CreatedPlaylist, PlaylistSummary, Track, UserContext};

/// Supplies a valid access credential for the music service.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, refreshed first if it is known to be expired.
    async fn access_token(&self) -> Result<String, ServiceError>;

    /// Force a refresh after the service rejected the current token.
    async fn refresh(&self) -> Result<String, ServiceError>;
}

/// The music service the pipeline sources tracks from and publishes to.
#[async_trait]
pub trait MusicService: Send + Sync {
    /// Artists the user follows, first page only (at most `limit`).
    async fn followed_artists(&self, limit: u32) -> Result<Vec<Artist>, ServiceError>;

    /// An artist's popular tracks in the given market, in service order.
    async fn artist_top_tracks(
        &self,
        artist_id: &str,
        country: &str,
    ) -> Result<Vec<Track>, ServiceError>;

    /// Create a playlist for `user` containing `track_ids` in order.
    async fn create_playlist(
        &self,
        user: &UserContext,
        name: &str,
        description: &str,
        track_ids: &[String],
    ) -> Result<CreatedPlaylist, ServiceError>;

    /// Playlists in the user's library.
    async fn user_playlists(&self) -> Result<Vec<PlaylistSummary>, ServiceError>;

    /// Remove a playlist from the user's library.
    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<(), ServiceError>;
}

/// Turns free text into structured playlist parameters.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Extract parameters from `text`. `known_rulesets` lists ruleset names
    /// the model may pick from.
    async fn extract(
        &self,
        text: &str,
        known_rulesets: &[String],
    ) -> Result<ExtractedParams, ServiceError>;
}

// Implement traits for real clients

#[async_trait]
impl MusicService for super::spotify::SpotifyClient {
    async fn followed_artists(&self, limit: u32) -> Result<Vec<Artist>, ServiceError> {
        self.followed_artists(limit).await
    }

    async fn artist_top_tracks(
        &self,
        artist_id: &str,
        country: &str,
    ) -> Result<Vec<Track>, ServiceError> {
        self.artist_top_tracks(artist_id, country).await
    }

    async fn create_playlist(
        &self,
        user: &UserContext,
        name: &str,
        description: &str,
        track_ids: &[String],
    ) -> Result<CreatedPlaylist, ServiceError> {
        self.create_playlist(user, name, description, track_ids)
            .await
    }

    async fn user_playlists(&self) -> Result<Vec<PlaylistSummary>, ServiceError> {
        self.user_playlists().await
    }

    async fn unfollow_playlist(&self, playlist_id: &str) -> Result<(), ServiceError> {
        self.unfollow_playlist(playlist_id).await
    }
}

#[async_trait]
impl ExtractionService for super::gemini::GeminiClient {
    async fn extract(
        &self,
        text: &str,
        known_rulesets: &[String],
    ) -> Result<ExtractedParams, ServiceError> {
        self.extract(text, known_rulesets).await
    }
}
