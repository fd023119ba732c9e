//! User-defined rulesets.
//!
//! A ruleset is a named set of trigger keywords plus year/genre criteria.
//! At most one ruleset applies to a generation request.
//!
//! # Overview
//!
//! This module provides:
//! - [`Ruleset`] and [`RulesetCriteria`]: the persisted definition
//! - Database operations (create, get, list, update, delete, seed)
//! - [`resolve`]: choose the ruleset for a request
//! - [`filter::apply`]: drop tracks that violate the criteria
//!
//! # Example
//!
//! ```ignore
//! use playlist_agent::rulesets::{list_rulesets, resolve, filter};
//!
//! let rulesets = list_rulesets(&pool, true).await?;
//! let ruleset = resolve(&rulesets, None, "retro road trip")?;
//! let kept = filter::apply(selected, ruleset.as_ref(), 2024);
//! ```

mod db;
pub mod filter;
mod resolver;
mod types;

pub use types::{NewRuleset, Ruleset, RulesetCriteria, RulesetError, RulesetUpdate};

pub use resolver::{ResolveError, RulesetMatch, matching_rulesets, resolve};

pub use db::{
    create_ruleset, default_rulesets, delete_ruleset, get_ruleset, get_ruleset_by_name,
    list_rulesets, seed_defaults, update_ruleset,
};
