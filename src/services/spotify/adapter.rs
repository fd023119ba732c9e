//! Adapter layer: Convert Spotify DTOs to domain models
//!
//! This is the ONLY place where Spotify DTO types are converted to domain
//! types. If the Web API changes its response format, only this file and
//! dto.rs need to change.

use super::dto;
use crate::model::{Artist, CreatedPlaylist, PlaylistSummary, Track};

/// Convert the followed-artists page to domain artists.
pub fn to_artists(response: dto::FollowedArtistsResponse) -> Vec<Artist> {
    response
        .artists
        .items
        .into_iter()
        .map(|a| Artist {
            id: a.id,
            name: a.name,
            genres: a.genres,
        })
        .collect()
}

/// Convert a top-tracks response to domain tracks.
///
/// Tracks without an ID (local files) can't be added to a playlist and are
/// dropped. `artist_id` is the artist the tracks were requested for; it is
/// used when the track carries no artist ID of its own.
pub fn to_tracks(response: dto::TopTracksResponse, artist_id: &str) -> Vec<Track> {
    response
        .tracks
        .into_iter()
        .filter_map(|t| {
            let id = t.id?;
            let primary_artist = t
                .artists
                .first()
                .and_then(|a| a.id.clone())
                .unwrap_or_else(|| artist_id.to_string());
            let release_year = t
                .album
                .as_ref()
                .and_then(|a| a.release_date.as_deref())
                .and_then(parse_release_year);

            Some(Track {
                id,
                name: t.name,
                artist_id: primary_artist,
                release_year,
                is_explicit: t.explicit,
            })
        })
        .collect()
}

/// Convert a playlist object returned from creation.
pub fn to_created_playlist(playlist: dto::PlaylistObject) -> CreatedPlaylist {
    let url = playlist
        .external_urls
        .and_then(|u| u.spotify)
        .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", playlist.id));
    CreatedPlaylist {
        id: playlist.id,
        url,
    }
}

/// Convert a page of playlists to summaries.
pub fn to_playlist_summaries(page: dto::Page<dto::PlaylistObject>) -> Vec<PlaylistSummary> {
    page.items
        .into_iter()
        .map(|p| PlaylistSummary {
            id: p.id,
            name: p.name,
        })
        .collect()
}

/// Format a track ID as a playlist item URI.
pub fn track_uri(track_id: &str) -> String {
    if track_id.starts_with("spotify:") {
        track_id.to_string()
    } else {
        format!("spotify:track:{}", track_id)
    }
}

/// Parse the year from a release date ("YYYY", "YYYY-MM", "YYYY-MM-DD").
fn parse_release_year(date: &str) -> Option<i32> {
    let year = date.get(..4)?;
    if !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    year.parse().ok().filter(|y| *y > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_dto(id: Option<&str>, date: Option<&str>) -> dto::TrackObject {
        dto::TrackObject {
            id: id.map(String::from),
            name: "Song".to_string(),
            explicit: false,
            album: Some(dto::AlbumObject {
                id: None,
                name: None,
                release_date: date.map(String::from),
                release_date_precision: None,
            }),
            artists: vec![],
            popularity: None,
        }
    }

    #[test]
    fn test_parse_release_year_precisions() {
        assert_eq!(parse_release_year("1995"), Some(1995));
        assert_eq!(parse_release_year("1995-07"), Some(1995));
        assert_eq!(parse_release_year("1995-07-14"), Some(1995));
        assert_eq!(parse_release_year("0000"), None);
        assert_eq!(parse_release_year("95"), None);
        assert_eq!(parse_release_year("abcd-01-01"), None);
    }

    #[test]
    fn test_tracks_without_id_are_dropped() {
        let response = dto::TopTracksResponse {
            tracks: vec![track_dto(None, Some("2001")), track_dto(Some("t1"), Some("2001"))],
        };
        let tracks = to_tracks(response, "artist-a");
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "t1");
        assert_eq!(tracks[0].artist_id, "artist-a");
        assert_eq!(tracks[0].release_year, Some(2001));
    }

    #[test]
    fn test_missing_release_date_is_none() {
        let response = dto::TopTracksResponse {
            tracks: vec![track_dto(Some("t1"), None)],
        };
        assert_eq!(to_tracks(response, "a")[0].release_year, None);
    }

    #[test]
    fn test_created_playlist_url_fallback() {
        let created = to_created_playlist(dto::PlaylistObject {
            id: "pl1".into(),
            name: "Mix".into(),
            external_urls: None,
        });
        assert_eq!(created.url, "https://open.spotify.com/playlist/pl1");
    }

    #[test]
    fn test_track_uri() {
        assert_eq!(track_uri("abc"), "spotify:track:abc");
        assert_eq!(track_uri("spotify:track:abc"), "spotify:track:abc");
    }
}
