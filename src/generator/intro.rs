//! Day-of-week intro tracks for daily drive playlists.

use std::collections::BTreeMap;

use chrono::Weekday;
use tracing::warn;

/// Built-in intro track per weekday, Monday first.
const DEFAULT_INTROS: [&str; 7] = [
    "2vQ5ujgkCvNcGWFMgVs6oP",
    "0mTTHvUi56OWKaSbkhZTbE",
    "3J5ULWw2zpD1ACWlutOd4b",
    "3Yq8N4JL6MibLRBdBtASJh",
    "2MdoNYtNcUU0cfjW0dAmZf",
    "4fK6E2UywZTJIa5kWnCD6x",
    "1o0nTEJAE2czHTyQ2Nc5Kg",
];

/// The intro table, with configured overrides applied.
#[derive(Debug, Clone)]
pub struct IntroTracks {
    by_day: [String; 7],
}

impl Default for IntroTracks {
    fn default() -> Self {
        Self {
            by_day: DEFAULT_INTROS.map(String::from),
        }
    }
}

impl IntroTracks {
    /// Apply overrides keyed by weekday name ("monday", "Tue", ...).
    /// Unknown keys and empty values are ignored.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut intros = Self::default();
        for (day, track_id) in overrides {
            let track_id = track_id.trim();
            match day.parse::<Weekday>() {
                Ok(weekday) if !track_id.is_empty() => {
                    intros.by_day[weekday.num_days_from_monday() as usize] = track_id.to_string();
                }
                Ok(_) => {}
                Err(_) => warn!(key = %day, "Ignoring intro track for unknown weekday"),
            }
        }
        intros
    }

    /// Track ID for `weekday`.
    pub fn for_weekday(&self, weekday: Weekday) -> &str {
        &self.by_day[weekday.num_days_from_monday() as usize]
    }
}

/// English day name, e.g. "Monday".
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
