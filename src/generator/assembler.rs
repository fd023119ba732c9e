//! Final playlist assembly and publication.

use chrono::Weekday;
use tracing::{info, warn};

use super::intro::{IntroTracks, weekday_name};
use crate::model::{GenerationRequest, PlaylistResult, SelectedTrack, UserContext};
use crate::services::{MusicService, ServiceError};

/// Longest name derived from guidelines, in characters.
const MAX_NAME_CHARS: usize = 80;

/// Spotify rejects longer descriptions.
const MAX_DESCRIPTION_CHARS: usize = 300;

const FALLBACK_NAME: &str = "Generated Playlist";

/// A playlist ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPlaylist {
    pub name: String,
    pub description: String,
    /// Intro track first when present, then the selection
    pub track_ids: Vec<String>,
    pub intro_track: Option<String>,
    /// The trimmed selection, without the intro
    pub tracks: Vec<SelectedTrack>,
    pub rulesets_applied: Vec<String>,
}

impl AssembledPlaylist {
    /// Number of selected tracks, not counting the intro.
    pub fn tracks_count(&self) -> usize {
        self.tracks.len()
    }
}

/// Trim the filtered selection and add the intro for daily drives.
pub fn assemble(
    mut filtered: Vec<SelectedTrack>,
    request: &GenerationRequest,
    rulesets_applied: Vec<String>,
    weekday: Weekday,
    intros: &IntroTracks,
) -> AssembledPlaylist {
    filtered.truncate(request.num_songs() as usize);

    let intro_track = request
        .is_daily_drive()
        .then(|| intros.for_weekday(weekday).to_string());

    let track_ids = intro_track
        .iter()
        .cloned()
        .chain(filtered.iter().map(|s| s.track.id.clone()))
        .collect();

    AssembledPlaylist {
        name: playlist_name(request, weekday),
        description: description(request, &rulesets_applied),
        track_ids,
        intro_track,
        tracks: filtered,
        rulesets_applied,
    }
}

/// "Daily Drive - {Weekday}" for daily drives, otherwise the guidelines.
pub fn playlist_name(request: &GenerationRequest, weekday: Weekday) -> String {
    if request.is_daily_drive() {
        return daily_drive_name(weekday);
    }

    let guidelines = request.guidelines().trim();
    if guidelines.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    truncate_chars(guidelines, MAX_NAME_CHARS)
}

pub fn daily_drive_name(weekday: Weekday) -> String {
    format!("Daily Drive - {}", weekday_name(weekday))
}

fn description(request: &GenerationRequest, rulesets_applied: &[String]) -> String {
    let mut text = String::from("Generated by playlist-agent");
    let guidelines = request.guidelines().trim();
    if !guidelines.is_empty() {
        text.push_str(": ");
        text.push_str(guidelines);
    }
    if !rulesets_applied.is_empty() {
        text.push_str(" | Rulesets: ");
        text.push_str(&rulesets_applied.join(", "));
    }
    truncate_chars(&text, MAX_DESCRIPTION_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Create the playlist on the music service.
///
/// With `replace_existing`, other playlists in the user's library with the
/// same name are unfollowed once the new one exists. Failures there are
/// logged and do not fail the publish.
pub async fn publish(
    music: &dyn MusicService,
    user: &UserContext,
    playlist: AssembledPlaylist,
    replace_existing: bool,
) -> Result<PlaylistResult, ServiceError> {
    let created = music
        .create_playlist(user, &playlist.name, &playlist.description, &playlist.track_ids)
        .await?;

    if replace_existing {
        unfollow_previous(music, &playlist.name, &created.id).await;
    }

    info!(
        playlist_id = %created.id,
        name = %playlist.name,
        tracks = playlist.tracks_count(),
        "Created playlist"
    );

    Ok(PlaylistResult {
        playlist_id: created.id,
        name: playlist.name.clone(),
        spotify_url: created.url,
        tracks_count: playlist.tracks_count(),
        rulesets_applied: playlist.rulesets_applied,
    })
}

async fn unfollow_previous(music: &dyn MusicService, name: &str, keep_id: &str) {
    let existing = match music.user_playlists().await {
        Ok(playlists) => playlists,
        Err(e) => {
            warn!(error = %e, "Could not list playlists, keeping older copies");
            return;
        }
    };

    for old in existing
        .into_iter()
        .filter(|p| p.name == name && p.id != keep_id)
    {
        info!(playlist_id = %old.id, name = %old.name, "Replacing existing playlist");
        if let Err(e) = music.unfollow_playlist(&old.id).await {
            warn!(playlist_id = %old.id, error = %e, "Could not unfollow playlist");
        }
    }
}
