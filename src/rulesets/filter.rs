//! Applies a ruleset's criteria to selected tracks.

use super::types::{Ruleset, RulesetCriteria};
use crate::model::SelectedTrack;

/// Keep the tracks that satisfy every criterion of `ruleset`, in order.
///
/// `current_year` anchors `years_back`. Without a ruleset the input is
/// returned unchanged.
pub fn apply(
    selected: Vec<SelectedTrack>,
    ruleset: Option<&Ruleset>,
    current_year: i32,
) -> Vec<SelectedTrack> {
    let Some(ruleset) = ruleset else {
        return selected;
    };
    selected
        .into_iter()
        .filter(|s| passes(&ruleset.criteria, s, current_year))
        .collect()
}

/// Whether a single track satisfies `criteria`.
pub fn passes(criteria: &RulesetCriteria, selected: &SelectedTrack, current_year: i32) -> bool {
    passes_year(criteria, selected.track.release_year, current_year)
        && passes_genre(criteria, &selected.artist_genres)
}

fn passes_year(criteria: &RulesetCriteria, year: Option<i32>, current_year: i32) -> bool {
    if !criteria.has_year_constraint() {
        return true;
    }
    let Some(year) = year else {
        return false;
    };

    criteria.min_year.is_none_or(|min| year >= min)
        && criteria.max_year.is_none_or(|max| year <= max)
        && criteria
            .years_back
            .is_none_or(|back| year >= current_year - back)
}

fn passes_genre(criteria: &RulesetCriteria, artist_genres: &[String]) -> bool {
    let wanted = criteria.genres();
    if wanted.is_empty() {
        return true;
    }
    artist_genres
        .iter()
        .any(|g| wanted.iter().any(|w| w.trim().eq_ignore_ascii_case(g.trim())))
}
