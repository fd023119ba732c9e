//! Core data models for playlist generation.
//!
//! Defines the entities that flow through the generation pipeline:
//! [`GenerationRequest`], [`Artist`], [`Track`], [`SelectedTrack`] and
//! [`PlaylistResult`], plus the request-scoped [`UserContext`].
//!
//! Artists and tracks are sourced fresh from the music service on every run
//! and are never persisted. Rulesets live in [`crate::rulesets`].

use serde::Serialize;

/// Number of songs used when the request does not name a count.
pub const DEFAULT_NUM_SONGS: u32 = 20;

/// Parameters for a single playlist generation.
///
/// Built once per user submission. Fields are private so the request
/// cannot be mutated after the intent parser hands it off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    num_songs: u32,
    is_daily_drive: bool,
    allow_explicit: bool,
    ruleset_name: Option<String>,
    guidelines: String,
    music_only: bool,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            num_songs: DEFAULT_NUM_SONGS,
            is_daily_drive: false,
            allow_explicit: true,
            ruleset_name: None,
            guidelines: String::new(),
            music_only: false,
        }
    }
}

impl GenerationRequest {
    /// Create a request. A `num_songs` of zero is replaced by the default.
    pub fn new(
        num_songs: u32,
        is_daily_drive: bool,
        allow_explicit: bool,
        ruleset_name: Option<String>,
        guidelines: impl Into<String>,
        music_only: bool,
    ) -> Self {
        let num_songs = if num_songs == 0 {
            DEFAULT_NUM_SONGS
        } else {
            num_songs
        };
        let ruleset_name = ruleset_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Self {
            num_songs,
            is_daily_drive,
            allow_explicit,
            ruleset_name,
            guidelines: guidelines.into(),
            music_only,
        }
    }

    /// A request with every field at its default and the given guidelines.
    pub fn from_guidelines(guidelines: impl Into<String>) -> Self {
        Self {
            guidelines: guidelines.into(),
            ..Default::default()
        }
    }

    pub fn num_songs(&self) -> u32 {
        self.num_songs
    }

    pub fn is_daily_drive(&self) -> bool {
        self.is_daily_drive
    }

    pub fn allow_explicit(&self) -> bool {
        self.allow_explicit
    }

    pub fn ruleset_name(&self) -> Option<&str> {
        self.ruleset_name.as_deref()
    }

    pub fn guidelines(&self) -> &str {
        &self.guidelines
    }

    pub fn music_only(&self) -> bool {
        self.music_only
    }
}

/// An artist as reported by the music service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    /// Service artist ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Genre tags attached to the artist
    pub genres: Vec<String>,
}

/// A track as reported by the music service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Service track ID
    pub id: String,
    /// Track title
    pub name: String,
    /// ID of the primary artist
    pub artist_id: String,
    /// Year of the album release, if the service reported a usable date
    pub release_year: Option<i32>,
    /// Explicit-content flag
    pub is_explicit: bool,
}

/// How a track made it through the explicit-content policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// The track satisfied the policy.
    Accepted,
    /// Every draw for the artist was explicit; the last one was kept anyway.
    AcceptedAfterExhaustion,
}

/// A track chosen by the selector, with the context the filter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTrack {
    pub track: Track,
    /// Genres of the artist the track was sourced from
    pub artist_genres: Vec<String>,
    pub outcome: PickOutcome,
}

/// A playlist created on the external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPlaylist {
    pub id: String,
    pub url: String,
}

/// A playlist already in the user's library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
}

/// Summary of a finished generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistResult {
    pub playlist_id: String,
    pub name: String,
    pub spotify_url: String,
    /// Number of requested tracks delivered (the intro track is not counted)
    pub tracks_count: usize,
    pub rulesets_applied: Vec<String>,
}

/// Identity of the user a request runs on behalf of.
///
/// Passed explicitly through every call that needs it; there is no
/// process-wide "active user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    /// Local database ID
    pub user_id: i64,
    /// ID of the user on the music service
    pub spotify_user_id: String,
    pub display_name: Option<String>,
}

impl UserContext {
    /// Name suitable for console output.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or(self.spotify_user_id.as_str())
    }
}
