//! Playlist generation pipeline.
//!
//! ```text
//! request ──► resolve ruleset ──► followed artists ──► select ──► filter ──► assemble ──► create
//! ```
//!
//! The external create call is always the last step, so a failure anywhere
//! earlier leaves nothing behind on the music service.
//!
//! # Example
//!
//! ```ignore
//! use playlist_agent::generator::{GeneratorSettings, PlaylistGenerator};
//!
//! let generator = PlaylistGenerator::new(music, pool, GeneratorSettings::from_config(&config));
//! let result = generator.generate_playlist(&user, &request).await?;
//! println!("{} ({} tracks)", result.spotify_url, result.tracks_count);
//! ```

pub mod assembler;
pub mod intent;
pub mod intro;
pub mod selector;

use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::sqlite::SqlitePool;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::model::{GenerationRequest, PlaylistResult, UserContext};
use crate::rulesets::{self, RulesetError, filter};
use crate::services::{MusicService, ServiceError};

pub use assembler::AssembledPlaylist;
pub use intent::{IntentParser, RequestOverrides};
pub use intro::IntroTracks;
pub use selector::SelectorSettings;

/// Errors that abort a generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("You don't follow any artists on Spotify")]
    NoArtistsFound,

    #[error("No tracks matched the request")]
    NoTracksFound,

    #[error("Spotify authorization expired; log in again")]
    AuthExpired,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Service(ServiceError),

    #[error("Ruleset storage: {0}")]
    Storage(#[from] RulesetError),
}

impl From<ServiceError> for GenerationError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::AuthExpired => GenerationError::AuthExpired,
            ServiceError::ServiceUnavailable(msg) => GenerationError::ServiceUnavailable(msg),
            other => GenerationError::Service(other),
        }
    }
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub selector: SelectorSettings,
    pub followed_artist_limit: u32,
    pub ruleset_oversample: u32,
    pub replace_daily_drive: bool,
    pub intros: IntroTracks,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl GeneratorSettings {
    pub fn from_config(config: &Config) -> Self {
        let generation = &config.generation;
        Self {
            selector: SelectorSettings {
                max_artists: generation.max_artists,
                explicit_attempts: generation.explicit_attempts,
                market: generation.market.clone(),
                fetch_concurrency: generation.fetch_concurrency,
            },
            followed_artist_limit: generation.followed_artist_limit,
            ruleset_oversample: generation.ruleset_oversample.max(1),
            replace_daily_drive: generation.replace_daily_drive,
            intros: IntroTracks::with_overrides(&config.daily_drive.intro_tracks),
        }
    }
}

/// Runs the generation pipeline for one request at a time.
pub struct PlaylistGenerator {
    music: Arc<dyn MusicService>,
    pool: SqlitePool,
    settings: GeneratorSettings,
}

impl PlaylistGenerator {
    pub fn new(music: Arc<dyn MusicService>, pool: SqlitePool, settings: GeneratorSettings) -> Self {
        Self {
            music,
            pool,
            settings,
        }
    }

    /// Generate and publish a playlist for `user`.
    ///
    /// May succeed with fewer tracks than requested when the candidate pool
    /// is small.
    pub async fn generate_playlist(
        &self,
        user: &UserContext,
        request: &GenerationRequest,
    ) -> Result<PlaylistResult, GenerationError> {
        let mut rng = StdRng::from_os_rng();
        self.generate_on(user, request, Local::now().date_naive(), &mut rng)
            .await
    }

    /// Build the playlist without creating it.
    pub async fn preview(
        &self,
        request: &GenerationRequest,
    ) -> Result<AssembledPlaylist, GenerationError> {
        let mut rng = StdRng::from_os_rng();
        self.prepare(request, Local::now().date_naive(), &mut rng)
            .await
    }

    /// [`generate_playlist`](Self::generate_playlist) with an explicit date
    /// and random source.
    pub async fn generate_on<R: Rng + ?Sized>(
        &self,
        user: &UserContext,
        request: &GenerationRequest,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<PlaylistResult, GenerationError> {
        let playlist = self.prepare(request, today, rng).await?;
        let replace = request.is_daily_drive() && self.settings.replace_daily_drive;
        Ok(assembler::publish(self.music.as_ref(), user, playlist, replace).await?)
    }

    /// Everything up to, but not including, the create call.
    pub async fn prepare<R: Rng + ?Sized>(
        &self,
        request: &GenerationRequest,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<AssembledPlaylist, GenerationError> {
        info!(
            num_songs = request.num_songs(),
            daily_drive = request.is_daily_drive(),
            allow_explicit = request.allow_explicit(),
            ruleset = ?request.ruleset_name(),
            "Generating playlist"
        );

        // One snapshot per generation
        let snapshot = rulesets::list_rulesets(&self.pool, true).await?;
        let resolved = rulesets::resolve(&snapshot, request.ruleset_name(), request.guidelines());
        let ruleset = match resolved {
            Ok(ruleset) => ruleset,
            Err(e) => {
                warn!(error = %e, "Continuing without a ruleset");
                None
            }
        };
        if let Some(r) = &ruleset {
            info!(ruleset = %r.name, criteria = %r.criteria.describe(), "Applying ruleset");
        }

        let artists = self
            .music
            .followed_artists(self.settings.followed_artist_limit)
            .await?;
        if artists.is_empty() {
            return Err(GenerationError::NoArtistsFound);
        }
        debug!(count = artists.len(), "Fetched followed artists");

        let num_songs = request.num_songs() as usize;
        let target = match &ruleset {
            Some(_) => num_songs * self.settings.ruleset_oversample as usize,
            None => num_songs,
        };

        let selected = selector::select(
            self.music.as_ref(),
            artists,
            target,
            request.allow_explicit(),
            &self.settings.selector,
            rng,
        )
        .await?;

        let before = selected.len();
        let filtered = filter::apply(selected, ruleset.as_ref(), today.year());
        if ruleset.is_some() {
            debug!(before, after = filtered.len(), "Ruleset filter applied");
        }

        let rulesets_applied = ruleset.into_iter().map(|r| r.name).collect();
        let playlist = assembler::assemble(
            filtered,
            request,
            rulesets_applied,
            today.weekday(),
            &self.settings.intros,
        );

        if playlist.tracks.is_empty() {
            return Err(GenerationError::NoTracksFound);
        }
        if playlist.tracks_count() < num_songs {
            warn!(
                requested = num_songs,
                selected = playlist.tracks_count(),
                "Not enough candidates for the requested count"
            );
        }
        Ok(playlist)
    }
}
