//! Test utilities and fixtures for playlist-agent tests.
//!
//! This module provides a temporary database plus builders for the domain
//! types that tests construct over and over.
//!
//! # Example
//!
//! ```ignore
//! use playlist_agent::test_utils::{temp_db, new_ruleset};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     create_ruleset(&pool, new_ruleset("mine", &["x"])).await.unwrap();
//! }
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::model::{PickOutcome, SelectedTrack, Track, UserContext};
use crate::rulesets::{NewRuleset, Ruleset, RulesetCriteria};

/// Creates a temporary database for testing.
///
/// The database is created in a temporary directory that is automatically
/// cleaned up when the returned `TempDir` is dropped. Migrations are run
/// automatically.
///
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = crate::db::db_url(Some(&db_path));

    let pool = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Input for an active ruleset with no criteria.
pub fn new_ruleset(name: &str, keywords: &[&str]) -> NewRuleset {
    NewRuleset {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        description: None,
        criteria: RulesetCriteria::default(),
        is_active: true,
    }
}

/// An in-memory active ruleset with no criteria.
pub fn ruleset(id: i64, name: &str, keywords: &[&str]) -> Ruleset {
    let created = DateTime::<Utc>::UNIX_EPOCH;
    Ruleset {
        id,
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        description: None,
        criteria: RulesetCriteria::default(),
        is_active: true,
        created_at: created,
        updated_at: created,
    }
}

/// A clean track with the given release year.
pub fn track_with_year(id: &str, artist_id: &str, year: i32) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Song {id}"),
        artist_id: artist_id.to_string(),
        release_year: Some(year),
        is_explicit: false,
    }
}

/// A selected clean track.
pub fn selected(id: &str, year: Option<i32>, genres: &[&str]) -> SelectedTrack {
    SelectedTrack {
        track: Track {
            release_year: year,
            ..track_with_year(id, "artist", 0)
        },
        artist_genres: genres.iter().map(|g| g.to_string()).collect(),
        outcome: PickOutcome::Accepted,
    }
}

/// The user requests run on behalf of in tests.
pub fn user_context() -> UserContext {
    UserContext {
        user_id: 1,
        spotify_user_id: "test-user".to_string(),
        display_name: Some("Test User".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (pool, _dir) = temp_db().await;

        let rulesets = crate::rulesets::list_rulesets(&pool, false).await.unwrap();
        assert!(rulesets.is_empty());
        assert!(crate::auth::latest_user(&pool).await.unwrap().is_none());
    }

    #[test]
    fn test_selected_defaults() {
        let s = selected("a", None, &["pop"]);
        assert_eq!(s.track.id, "a");
        assert_eq!(s.track.release_year, None);
        assert!(!s.track.is_explicit);
        assert_eq!(s.outcome, PickOutcome::Accepted);
    }
}
