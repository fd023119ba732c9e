//! Ruleset management commands.

use anyhow::bail;
use sqlx::sqlite::SqlitePool;
use tokio::runtime::Runtime;

use super::{Context, RulesetFields};
use crate::error::ResultExt;
use crate::rulesets::{
    self, NewRuleset, Ruleset, RulesetCriteria, RulesetError, RulesetUpdate,
};

/// List rulesets in matching order
pub fn cmd_rulesets_list(rt: &Runtime, ctx: &Context, active_only: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = ctx.pool().await?;
        let all = rulesets::list_rulesets(&pool, active_only).await?;

        if all.is_empty() {
            println!("No rulesets. Run `playlist-agent rulesets seed` to add the defaults.");
            return Ok(());
        }

        for ruleset in &all {
            let state = if ruleset.is_active { "" } else { " (inactive)" };
            println!(
                "{:>3}  {}{}  [{}]  {}",
                ruleset.id,
                ruleset.name,
                state,
                ruleset.keywords.join(", "),
                ruleset.criteria.describe()
            );
        }
        anyhow::Ok(())
    })
}

/// Show one ruleset
pub fn cmd_rulesets_show(rt: &Runtime, ctx: &Context, name: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = ctx.pool().await?;
        let ruleset = find(&pool, name).await?;
        print_ruleset(&ruleset);
        anyhow::Ok(())
    })
}

/// Create a ruleset
pub fn cmd_rulesets_add(
    rt: &Runtime,
    ctx: &Context,
    name: &str,
    fields: &RulesetFields,
    active: bool,
) -> anyhow::Result<()> {
    let keywords = match &fields.keywords {
        Some(k) if !k.is_empty() => k.clone(),
        _ => bail!("--keywords is required when adding a ruleset"),
    };

    rt.block_on(async {
        let pool = ctx.pool().await?;
        let created = rulesets::create_ruleset(
            &pool,
            NewRuleset {
                name: name.to_string(),
                keywords,
                description: fields.description.clone(),
                criteria: merge_criteria(RulesetCriteria::default(), fields),
                is_active: active,
            },
        )
        .await
        .with_context(format!("creating ruleset {}", name))?;

        println!("Created ruleset {}", created.name);
        print_ruleset(&created);
        anyhow::Ok(())
    })
}

/// Update a ruleset
pub fn cmd_rulesets_update(
    rt: &Runtime,
    ctx: &Context,
    name: &str,
    rename: Option<String>,
    fields: &RulesetFields,
    active: Option<bool>,
    clear_criteria: bool,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = ctx.pool().await?;
        let existing = find(&pool, name).await?;

        let criteria_changed = clear_criteria || has_criteria(fields);
        let base = if clear_criteria {
            RulesetCriteria::default()
        } else {
            existing.criteria.clone()
        };

        let update = RulesetUpdate {
            name: rename,
            keywords: fields.keywords.clone(),
            description: fields.description.clone(),
            criteria: criteria_changed.then(|| merge_criteria(base, fields)),
            is_active: active,
        };
        if update.is_empty() {
            println!("Nothing to change.");
            return Ok(());
        }

        let updated = rulesets::update_ruleset(&pool, existing.id, update)
            .await
            .with_context(format!("updating ruleset {}", existing.name))?;
        println!("Updated ruleset {}", updated.name);
        print_ruleset(&updated);
        anyhow::Ok(())
    })
}

/// Delete a ruleset
pub fn cmd_rulesets_remove(rt: &Runtime, ctx: &Context, name: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = ctx.pool().await?;
        let ruleset = find(&pool, name).await?;
        rulesets::delete_ruleset(&pool, ruleset.id).await?;
        println!("Removed ruleset {}", ruleset.name);
        anyhow::Ok(())
    })
}

/// Show which rulesets a description would trigger
pub fn cmd_rulesets_match(rt: &Runtime, ctx: &Context, text: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = ctx.pool().await?;
        let active = rulesets::list_rulesets(&pool, true).await?;
        let matches = rulesets::matching_rulesets(&active, text);

        if matches.is_empty() {
            println!("No ruleset matches \"{}\"", text);
            return Ok(());
        }

        for (i, m) in matches.iter().enumerate() {
            let marker = if i == 0 { "*" } else { " " };
            println!(
                "{} {}  matched: {}  ({})",
                marker,
                m.ruleset.name,
                m.matched_keywords.join(", "),
                m.ruleset.criteria.describe()
            );
        }
        if matches.len() > 1 {
            println!("* applied; only the first match is used");
        }
        anyhow::Ok(())
    })
}

/// Insert the built-in rulesets if the table is empty
pub fn cmd_rulesets_seed(rt: &Runtime, ctx: &Context) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = ctx.pool().await?;
        match rulesets::seed_defaults(&pool).await? {
            0 => println!("Rulesets already exist; nothing seeded."),
            n => println!("Seeded {} rulesets.", n),
        }
        anyhow::Ok(())
    })
}

async fn find(pool: &SqlitePool, name: &str) -> Result<Ruleset, RulesetError> {
    rulesets::get_ruleset_by_name(pool, name)
        .await?
        .ok_or_else(|| RulesetError::NotFound(name.to_string()))
}

fn has_criteria(fields: &RulesetFields) -> bool {
    fields.min_year.is_some()
        || fields.max_year.is_some()
        || fields.years_back.is_some()
        || !fields.genres.is_empty()
}

/// Overlay the criteria given on the command line onto `base`.
fn merge_criteria(base: RulesetCriteria, fields: &RulesetFields) -> RulesetCriteria {
    RulesetCriteria {
        min_year: fields.min_year.or(base.min_year),
        max_year: fields.max_year.or(base.max_year),
        years_back: fields.years_back.or(base.years_back),
        genre_filter: if fields.genres.is_empty() {
            base.genre_filter
        } else {
            Some(fields.genres.clone())
        },
    }
}

fn print_ruleset(ruleset: &Ruleset) {
    println!("Name:        {}", ruleset.name);
    println!("Active:      {}", ruleset.is_active);
    println!("Keywords:    {}", ruleset.keywords.join(", "));
    println!("Criteria:    {}", ruleset.criteria.describe());
    if let Some(description) = &ruleset.description {
        println!("Description: {}", description);
    }
    println!("Updated:     {}", ruleset.updated_at.format("%Y-%m-%d %H:%M"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unspecified_criteria() {
        let base = RulesetCriteria {
            min_year: Some(1990),
            max_year: Some(2000),
            genre_filter: Some(vec!["rock".into()]),
            ..Default::default()
        };
        let fields = RulesetFields {
            max_year: Some(2005),
            ..Default::default()
        };

        let merged = merge_criteria(base, &fields);
        assert_eq!(merged.min_year, Some(1990));
        assert_eq!(merged.max_year, Some(2005));
        assert_eq!(merged.genres(), ["rock".to_string()]);
        assert!(has_criteria(&fields));
        assert!(!has_criteria(&RulesetFields::default()));
    }

    #[test]
    fn test_merge_replaces_genres() {
        let base = RulesetCriteria {
            genre_filter: Some(vec!["rock".into()]),
            ..Default::default()
        };
        let fields = RulesetFields {
            genres: vec!["jazz".into()],
            ..Default::default()
        };
        assert_eq!(merge_criteria(base, &fields).genres(), ["jazz".to_string()]);
    }
}
