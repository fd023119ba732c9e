//! Picks the single ruleset that applies to a request.
//!
//! An explicit name wins. Otherwise the first active ruleset (in the order
//! given, which storage keeps by id) with a keyword appearing in the
//! guidelines is chosen. Matching is a case-insensitive substring test.

use super::types::Ruleset;

/// Errors from resolving a ruleset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("No active ruleset named '{0}'")]
    NotFound(String),
}

/// A keyword match.
#[derive(Debug, Clone)]
pub struct RulesetMatch<'a> {
    pub ruleset: &'a Ruleset,
    /// Keywords of the ruleset found in the text
    pub matched_keywords: Vec<&'a str>,
}

/// Resolve at most one ruleset for a request.
///
/// # Errors
///
/// [`ResolveError::NotFound`] if `ruleset_name` is given but no active
/// ruleset has that name.
pub fn resolve(
    rulesets: &[Ruleset],
    ruleset_name: Option<&str>,
    guidelines: &str,
) -> Result<Option<Ruleset>, ResolveError> {
    if let Some(name) = ruleset_name.map(str::trim).filter(|n| !n.is_empty()) {
        return rulesets
            .iter()
            .find(|r| r.is_active && r.name == name)
            .cloned()
            .map(Some)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()));
    }

    let text = guidelines.to_lowercase();
    Ok(rulesets
        .iter()
        .filter(|r| r.is_active)
        .find(|r| !matched_keywords(r, &text).is_empty())
        .cloned())
}

/// Every active ruleset with at least one keyword in `guidelines`, in order.
pub fn matching_rulesets<'a>(rulesets: &'a [Ruleset], guidelines: &str) -> Vec<RulesetMatch<'a>> {
    let text = guidelines.to_lowercase();
    rulesets
        .iter()
        .filter(|r| r.is_active)
        .filter_map(|ruleset| {
            let matched_keywords = matched_keywords(ruleset, &text);
            (!matched_keywords.is_empty()).then_some(RulesetMatch {
                ruleset,
                matched_keywords,
            })
        })
        .collect()
}

/// `lowered` must already be lowercase.
fn matched_keywords<'a>(ruleset: &'a Ruleset, lowered: &str) -> Vec<&'a str> {
    ruleset
        .keywords
        .iter()
        .filter(|k| !k.trim().is_empty() && lowered.contains(&k.trim().to_lowercase()))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ruleset;

    fn seeded() -> Vec<Ruleset> {
        vec![
            ruleset(1, "throwback", &["throwback", "retro", "oldies", "classic", "nostalgic"]),
            ruleset(2, "fresh", &["fresh", "new", "recent", "latest", "current"]),
        ]
    }

    #[test]
    fn test_resolve_by_name() {
        let resolved = resolve(&seeded(), Some("throwback"), "anything").unwrap();
        assert_eq!(resolved.unwrap().name, "throwback");
    }

    #[test]
    fn test_resolve_by_keyword() {
        let resolved = resolve(&seeded(), None, "some retro vibes").unwrap();
        assert_eq!(resolved.unwrap().name, "throwback");
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let resolved = resolve(&seeded(), None, "RETRO Friday").unwrap();
        assert_eq!(resolved.unwrap().name, "throwback");
    }

    #[test]
    fn test_first_match_wins_in_order() {
        // Both rulesets match; the lower id comes first
        let resolved = resolve(&seeded(), None, "new classic hits").unwrap();
        assert_eq!(resolved.unwrap().name, "throwback");
    }

    #[test]
    fn test_no_match() {
        assert_eq!(resolve(&seeded(), None, "chill evening").unwrap(), None);
        assert_eq!(resolve(&seeded(), None, "").unwrap(), None);
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let result = resolve(&seeded(), Some("nineties"), "retro");
        assert_eq!(result, Err(ResolveError::NotFound("nineties".into())));
    }

    #[test]
    fn test_inactive_rulesets_are_ignored() {
        let mut rulesets = seeded();
        rulesets[0].is_active = false;

        assert!(matches!(
            resolve(&rulesets, Some("throwback"), ""),
            Err(ResolveError::NotFound(_))
        ));
        assert_eq!(resolve(&rulesets, None, "retro").unwrap(), None);
    }

    #[test]
    fn test_blank_name_falls_back_to_keywords() {
        let resolved = resolve(&seeded(), Some("  "), "latest bangers").unwrap();
        assert_eq!(resolved.unwrap().name, "fresh");
    }

    #[test]
    fn test_matching_rulesets_reports_keywords() {
        let rulesets = seeded();
        let matches = matching_rulesets(&rulesets, "new retro classics");

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].ruleset.name, "throwback");
        assert_eq!(matches[0].matched_keywords, vec!["retro", "classic"]);
        assert_eq!(matches[1].matched_keywords, vec!["new"]);
    }
}
