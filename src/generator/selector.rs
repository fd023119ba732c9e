//! Random track selection from followed artists.
//!
//! Artists are shuffled and at most `max_artists` are kept. Their top tracks
//! are fetched, then the selector walks the artists round-robin and draws
//! one not-yet-picked track per visit until the target is reached or every
//! artist runs dry. A short result is not padded.
//!
//! When explicit tracks are not allowed, an explicit draw is redrawn up to
//! `explicit_attempts` times in total. If every draw is explicit the last
//! one is kept as [`PickOutcome::AcceptedAfterExhaustion`] and the artist is
//! retired, so such an artist contributes at most one explicit track.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::model::{Artist, PickOutcome, SelectedTrack, Track};
use crate::services::{MusicService, ServiceError};

/// Selection limits.
#[derive(Debug, Clone)]
pub struct SelectorSettings {
    pub max_artists: usize,
    pub explicit_attempts: u32,
    pub market: String,
    pub fetch_concurrency: usize,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            max_artists: 10,
            explicit_attempts: 5,
            market: "US".to_string(),
            fetch_concurrency: 4,
        }
    }
}

/// Remaining candidates of one artist.
struct ArtistPool {
    genres: Vec<String>,
    tracks: Vec<Track>,
}

/// Select up to `target` tracks from `artists`.
///
/// # Errors
///
/// Authorization and availability failures from the music service are
/// returned. Any other per-artist lookup failure skips that artist.
pub async fn select<R: Rng + ?Sized>(
    music: &dyn MusicService,
    mut artists: Vec<Artist>,
    target: usize,
    allow_explicit: bool,
    settings: &SelectorSettings,
    rng: &mut R,
) -> Result<Vec<SelectedTrack>, ServiceError> {
    if target == 0 || artists.is_empty() {
        return Ok(Vec::new());
    }

    artists.shuffle(rng);
    let mut seen_artists = HashSet::new();
    artists.retain(|a| seen_artists.insert(a.id.clone()));
    artists.truncate(settings.max_artists.max(1));

    let mut pools = fetch_pools(music, &artists, settings).await?;
    let picked = round_robin(
        &mut pools,
        target,
        allow_explicit,
        settings.explicit_attempts.max(1),
        rng,
    );

    debug!(
        artists = artists.len(),
        target,
        selected = picked.len(),
        "Selection complete"
    );
    Ok(picked)
}

/// Fetch top tracks concurrently, keeping artist order. Tracks already
/// offered by an earlier artist are dropped.
async fn fetch_pools(
    music: &dyn MusicService,
    artists: &[Artist],
    settings: &SelectorSettings,
) -> Result<Vec<ArtistPool>, ServiceError> {
    let market = settings.market.as_str();
    let results: Vec<_> = stream::iter(artists)
        .map(|artist| async move { (artist, music.artist_top_tracks(&artist.id, market).await) })
        .buffered(settings.fetch_concurrency.max(1))
        .collect()
        .await;

    let mut seen_tracks = HashSet::new();
    let mut pools = Vec::with_capacity(results.len());
    for (artist, result) in results {
        let tracks = match result {
            Ok(tracks) => tracks,
            Err(e @ (ServiceError::AuthExpired | ServiceError::ServiceUnavailable(_))) => {
                return Err(e);
            }
            Err(e) => {
                warn!(artist = %artist.name, error = %e, "Skipping artist, top tracks unavailable");
                continue;
            }
        };

        let tracks: Vec<Track> = tracks
            .into_iter()
            .filter(|t| seen_tracks.insert(t.id.clone()))
            .collect();
        if tracks.is_empty() {
            debug!(artist = %artist.name, "Artist has no tracks");
            continue;
        }
        pools.push(ArtistPool {
            genres: artist.genres.clone(),
            tracks,
        });
    }
    Ok(pools)
}

fn round_robin<R: Rng + ?Sized>(
    pools: &mut [ArtistPool],
    target: usize,
    allow_explicit: bool,
    explicit_attempts: u32,
    rng: &mut R,
) -> Vec<SelectedTrack> {
    let available: usize = pools.iter().map(|p| p.tracks.len()).sum();
    let mut picked = Vec::with_capacity(target.min(available));
    let mut active: Vec<usize> = (0..pools.len()).collect();

    while picked.len() < target && !active.is_empty() {
        let mut i = 0;
        while i < active.len() && picked.len() < target {
            let pool = &mut pools[active[i]];
            let mut retire = true;
            if let Some((track, outcome)) =
                draw(&mut pool.tracks, allow_explicit, explicit_attempts, rng)
            {
                retire = outcome == PickOutcome::AcceptedAfterExhaustion || pool.tracks.is_empty();
                picked.push(SelectedTrack {
                    track,
                    artist_genres: pool.genres.clone(),
                    outcome,
                });
            }

            if retire {
                active.remove(i);
            } else {
                i += 1;
            }
        }
    }
    picked
}

/// Remove and return one random track.
fn draw<R: Rng + ?Sized>(
    tracks: &mut Vec<Track>,
    allow_explicit: bool,
    attempts: u32,
    rng: &mut R,
) -> Option<(Track, PickOutcome)> {
    if tracks.is_empty() {
        return None;
    }
    if allow_explicit {
        let index = rng.random_range(0..tracks.len());
        return Some((tracks.swap_remove(index), PickOutcome::Accepted));
    }

    for attempt in 1..=attempts {
        let index = rng.random_range(0..tracks.len());
        if !tracks[index].is_explicit {
            return Some((tracks.swap_remove(index), PickOutcome::Accepted));
        }
        if attempt == attempts {
            return Some((tracks.swap_remove(index), PickOutcome::AcceptedAfterExhaustion));
        }
    }
    None
}
