//! Ruleset types.
//!
//! - [`Ruleset`]: a persisted, named filter definition
//! - [`RulesetCriteria`]: the year/genre constraints, stored as JSON
//! - [`NewRuleset`] / [`RulesetUpdate`]: inputs for create and partial update

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Year and genre constraints of a ruleset.
///
/// Serialized as the JSON object stored in the `criteria` column, e.g.
/// `{"max_year": 2010}` or `{"years_back": 5, "genre_filter": ["rock"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesetCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_back: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_filter: Option<Vec<String>>,
}

impl RulesetCriteria {
    /// True if no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.min_year.is_none()
            && self.max_year.is_none()
            && self.years_back.is_none()
            && self.genres().is_empty()
    }

    /// Whether any year constraint is set.
    pub fn has_year_constraint(&self) -> bool {
        self.min_year.is_some() || self.max_year.is_some() || self.years_back.is_some()
    }

    /// Genre filter, empty when unset.
    pub fn genres(&self) -> &[String] {
        self.genre_filter.as_deref().unwrap_or(&[])
    }

    /// Human-readable summary, e.g. "1990-2000, genres: rock".
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match (self.min_year, self.max_year) {
            (Some(min), Some(max)) => parts.push(format!("{}-{}", min, max)),
            (Some(min), None) => parts.push(format!("from {}", min)),
            (None, Some(max)) => parts.push(format!("up to {}", max)),
            (None, None) => {}
        }
        if let Some(years) = self.years_back {
            parts.push(format!("last {} years", years));
        }
        if !self.genres().is_empty() {
            parts.push(format!("genres: {}", self.genres().join(", ")));
        }
        if parts.is_empty() {
            "no constraints".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// A named filter definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    /// Database ID; also the stable matching order
    pub id: i64,
    /// Unique name
    pub name: String,
    /// Trigger keywords matched against request guidelines
    pub keywords: Vec<String>,
    pub description: Option<String>,
    pub criteria: RulesetCriteria,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRuleset {
    pub name: String,
    pub keywords: Vec<String>,
    pub description: Option<String>,
    pub criteria: RulesetCriteria,
    pub is_active: bool,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesetUpdate {
    pub name: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub description: Option<String>,
    pub criteria: Option<RulesetCriteria>,
    pub is_active: Option<bool>,
}

impl RulesetUpdate {
    /// True if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &RulesetUpdate::default()
    }
}

/// Errors from ruleset storage.
#[derive(Debug, thiserror::Error)]
pub enum RulesetError {
    #[error("Ruleset with name '{0}' already exists")]
    DuplicateName(String),

    #[error("Ruleset '{0}' not found")]
    NotFound(String),

    #[error("Invalid ruleset: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed stored JSON: {0}")]
    Json(#[from] serde_json::Error),
}
