//! Database operations for rulesets.
//!
//! Keywords and criteria are stored as JSON text. Listing is always ordered
//! by id, which is also the order keyword matching walks.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::info;

use super::types::{NewRuleset, Ruleset, RulesetCriteria, RulesetError, RulesetUpdate};

// ============================================================================
// Database Row Types
// ============================================================================

/// Database row for the rulesets table.
#[derive(Debug, sqlx::FromRow)]
struct RulesetRow {
    id: i64,
    name: String,
    keywords: String,
    description: Option<String>,
    criteria: String,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<RulesetRow> for Ruleset {
    type Error = RulesetError;

    fn try_from(row: RulesetRow) -> Result<Self, Self::Error> {
        Ok(Ruleset {
            id: row.id,
            name: row.name,
            keywords: serde_json::from_str(&row.keywords)?,
            description: row.description,
            criteria: serde_json::from_str(&row.criteria)?,
            is_active: row.is_active,
            created_at: row.created_at.parse().unwrap_or_else(|_| Utc::now()),
            updated_at: row.updated_at.parse().unwrap_or_else(|_| Utc::now()),
        })
    }
}

fn from_rows(rows: Vec<RulesetRow>) -> Result<Vec<Ruleset>, RulesetError> {
    rows.into_iter().map(Ruleset::try_from).collect()
}

// ============================================================================
// Validation
// ============================================================================

/// Trim keywords, drop empty ones and duplicates (case-insensitive).
fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let keyword = keyword.trim().to_string();
        if !keyword.is_empty() && !out.iter().any(|k| k.eq_ignore_ascii_case(&keyword)) {
            out.push(keyword);
        }
    }
    out
}

fn validate_name(name: &str) -> Result<String, RulesetError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RulesetError::Invalid("name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn validate_criteria(criteria: &RulesetCriteria) -> Result<(), RulesetError> {
    if let (Some(min), Some(max)) = (criteria.min_year, criteria.max_year)
        && min > max
    {
        return Err(RulesetError::Invalid(format!(
            "min_year {} is after max_year {}",
            min, max
        )));
    }
    if let Some(years) = criteria.years_back
        && years < 0
    {
        return Err(RulesetError::Invalid("years_back must not be negative".into()));
    }
    Ok(())
}

async fn name_taken(
    pool: &SqlitePool,
    name: &str,
    except_id: Option<i64>,
) -> Result<bool, RulesetError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM rulesets WHERE name = ? AND id IS NOT ?")
        .bind(name)
        .bind(except_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

// ============================================================================
// CRUD Operations
// ============================================================================

/// Create a ruleset.
///
/// # Errors
///
/// [`RulesetError::DuplicateName`] if the name is taken,
/// [`RulesetError::Invalid`] for an empty name or contradictory years.
pub async fn create_ruleset(pool: &SqlitePool, new: NewRuleset) -> Result<Ruleset, RulesetError> {
    let name = validate_name(&new.name)?;
    validate_criteria(&new.criteria)?;
    if name_taken(pool, &name, None).await? {
        return Err(RulesetError::DuplicateName(name));
    }

    let now = Utc::now().to_rfc3339();
    let keywords = serde_json::to_string(&normalize_keywords(new.keywords))?;
    let criteria = serde_json::to_string(&new.criteria)?;

    let row: RulesetRow = sqlx::query_as(
        r#"
        INSERT INTO rulesets (name, keywords, description, criteria, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&keywords)
    .bind(&new.description)
    .bind(&criteria)
    .bind(new.is_active)
    .bind(&now)
    .bind(&now)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// Get a ruleset by id.
pub async fn get_ruleset(pool: &SqlitePool, id: i64) -> Result<Option<Ruleset>, RulesetError> {
    let row: Option<RulesetRow> = sqlx::query_as("SELECT * FROM rulesets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Ruleset::try_from).transpose()
}

/// Get a ruleset by exact name.
pub async fn get_ruleset_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<Ruleset>, RulesetError> {
    let row: Option<RulesetRow> = sqlx::query_as("SELECT * FROM rulesets WHERE name = ?")
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;
    row.map(Ruleset::try_from).transpose()
}

/// List rulesets ordered by id.
pub async fn list_rulesets(
    pool: &SqlitePool,
    active_only: bool,
) -> Result<Vec<Ruleset>, RulesetError> {
    let sql = if active_only {
        "SELECT * FROM rulesets WHERE is_active = 1 ORDER BY id"
    } else {
        "SELECT * FROM rulesets ORDER BY id"
    };
    let rows: Vec<RulesetRow> = sqlx::query_as(sql).fetch_all(pool).await?;
    from_rows(rows)
}

/// Apply a partial update.
///
/// # Errors
///
/// [`RulesetError::NotFound`] if no ruleset has this id,
/// [`RulesetError::DuplicateName`] if renaming onto an existing name.
pub async fn update_ruleset(
    pool: &SqlitePool,
    id: i64,
    update: RulesetUpdate,
) -> Result<Ruleset, RulesetError> {
    let mut current = get_ruleset(pool, id)
        .await?
        .ok_or_else(|| RulesetError::NotFound(id.to_string()))?;
    if update.is_empty() {
        return Ok(current);
    }

    if let Some(name) = update.name {
        let name = validate_name(&name)?;
        if name_taken(pool, &name, Some(id)).await? {
            return Err(RulesetError::DuplicateName(name));
        }
        current.name = name;
    }
    if let Some(keywords) = update.keywords {
        current.keywords = normalize_keywords(keywords);
    }
    if let Some(description) = update.description {
        current.description = (!description.trim().is_empty()).then_some(description);
    }
    if let Some(criteria) = update.criteria {
        validate_criteria(&criteria)?;
        current.criteria = criteria;
    }
    if let Some(active) = update.is_active {
        current.is_active = active;
    }

    let row: RulesetRow = sqlx::query_as(
        r#"
        UPDATE rulesets
        SET name = ?, keywords = ?, description = ?, criteria = ?, is_active = ?, updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&current.name)
    .bind(serde_json::to_string(&current.keywords)?)
    .bind(&current.description)
    .bind(serde_json::to_string(&current.criteria)?)
    .bind(current.is_active)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// Delete a ruleset.
///
/// # Returns
///
/// True if a record was deleted, false if none existed.
pub async fn delete_ruleset(pool: &SqlitePool, id: i64) -> Result<bool, RulesetError> {
    let result = sqlx::query("DELETE FROM rulesets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Seed Data
// ============================================================================

/// The built-in rulesets.
pub fn default_rulesets() -> Vec<NewRuleset> {
    let keywords = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
    vec![
        NewRuleset {
            name: "throwback".into(),
            keywords: keywords(&["throwback", "retro", "oldies", "classic", "nostalgic"]),
            description: Some("Songs released in 2010 or earlier".into()),
            criteria: RulesetCriteria {
                max_year: Some(2010),
                ..Default::default()
            },
            is_active: true,
        },
        NewRuleset {
            name: "fresh".into(),
            keywords: keywords(&["fresh", "new", "recent", "latest", "current"]),
            description: Some("Songs from the last five years".into()),
            criteria: RulesetCriteria {
                years_back: Some(5),
                ..Default::default()
            },
            is_active: true,
        },
    ]
}

/// Insert the built-in rulesets if the table is empty.
///
/// # Returns
///
/// The number of rulesets inserted (0 when any ruleset already exists).
pub async fn seed_defaults(pool: &SqlitePool) -> Result<usize, RulesetError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rulesets")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    let defaults = default_rulesets();
    let inserted = defaults.len();
    for ruleset in defaults {
        create_ruleset(pool, ruleset).await?;
    }
    info!(count = inserted, "Seeded default rulesets");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{new_ruleset, temp_db};

    #[tokio::test]
    async fn test_create_and_get() {
        let (pool, _dir) = temp_db().await;

        let created = create_ruleset(&pool, new_ruleset("nineties", &["90s", "nineties"]))
            .await
            .unwrap();
        assert_eq!(created.name, "nineties");
        assert_eq!(created.keywords, vec!["90s", "nineties"]);

        let by_id = get_ruleset(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(by_id, created);
        let by_name = get_ruleset_by_name(&pool, "nineties").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert!(get_ruleset_by_name(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let (pool, _dir) = temp_db().await;
        create_ruleset(&pool, new_ruleset("mine", &["a"])).await.unwrap();

        let result = create_ruleset(&pool, new_ruleset("mine", &["b"])).await;
        assert!(matches!(result, Err(RulesetError::DuplicateName(n)) if n == "mine"));
    }

    #[tokio::test]
    async fn test_invalid_year_range_rejected() {
        let (pool, _dir) = temp_db().await;
        let mut ruleset = new_ruleset("backwards", &["x"]);
        ruleset.criteria.min_year = Some(2000);
        ruleset.criteria.max_year = Some(1990);

        assert!(matches!(
            create_ruleset(&pool, ruleset).await,
            Err(RulesetError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn test_keywords_normalized() {
        let (pool, _dir) = temp_db().await;
        let created = create_ruleset(
            &pool,
            new_ruleset("norm", &[" Retro ", "", "retro", "oldies"]),
        )
        .await
        .unwrap();
        assert_eq!(created.keywords, vec!["Retro", "oldies"]);
    }

    #[tokio::test]
    async fn test_list_ordered_by_id_and_active_filter() {
        let (pool, _dir) = temp_db().await;
        let first = create_ruleset(&pool, new_ruleset("zeta", &["z"])).await.unwrap();
        let mut inactive = new_ruleset("alpha", &["a"]);
        inactive.is_active = false;
        create_ruleset(&pool, inactive).await.unwrap();
        let third = create_ruleset(&pool, new_ruleset("beta", &["b"])).await.unwrap();

        let all = list_rulesets(&pool, false).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "beta"]);

        let active = list_rulesets(&pool, true).await.unwrap();
        let ids: Vec<_> = active.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (pool, _dir) = temp_db().await;
        let created = create_ruleset(&pool, new_ruleset("old", &["a"])).await.unwrap();

        let updated = update_ruleset(
            &pool,
            created.id,
            RulesetUpdate {
                name: Some("new".into()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "new");
        assert!(!updated.is_active);
        assert_eq!(updated.keywords, created.keywords);
        assert_eq!(updated.criteria, created.criteria);
    }

    #[tokio::test]
    async fn test_update_rename_conflict() {
        let (pool, _dir) = temp_db().await;
        create_ruleset(&pool, new_ruleset("taken", &["a"])).await.unwrap();
        let other = create_ruleset(&pool, new_ruleset("other", &["b"])).await.unwrap();

        let result = update_ruleset(
            &pool,
            other.id,
            RulesetUpdate {
                name: Some("taken".into()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(RulesetError::DuplicateName(_))));

        // Renaming to its own name is fine
        let same = update_ruleset(
            &pool,
            other.id,
            RulesetUpdate {
                name: Some("other".into()),
                ..Default::default()
            },
        )
        .await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing() {
        let (pool, _dir) = temp_db().await;
        let result = update_ruleset(&pool, 42, RulesetUpdate::default()).await;
        assert!(matches!(result, Err(RulesetError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (pool, _dir) = temp_db().await;
        let created = create_ruleset(&pool, new_ruleset("gone", &["a"])).await.unwrap();

        assert!(delete_ruleset(&pool, created.id).await.unwrap());
        assert!(!delete_ruleset(&pool, created.id).await.unwrap());
        assert!(get_ruleset(&pool, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_only_into_empty_table() {
        let (pool, _dir) = temp_db().await;

        assert_eq!(seed_defaults(&pool).await.unwrap(), 2);
        assert_eq!(seed_defaults(&pool).await.unwrap(), 0);

        let rulesets = list_rulesets(&pool, true).await.unwrap();
        let throwback = &rulesets[0];
        assert_eq!(throwback.name, "throwback");
        assert_eq!(throwback.criteria.max_year, Some(2010));
        assert!(throwback.keywords.contains(&"retro".to_string()));
        assert_eq!(rulesets[1].name, "fresh");
        assert_eq!(rulesets[1].criteria.years_back, Some(5));
    }

    #[tokio::test]
    async fn test_seed_skipped_when_user_rulesets_exist() {
        let (pool, _dir) = temp_db().await;
        create_ruleset(&pool, new_ruleset("mine", &["x"])).await.unwrap();

        assert_eq!(seed_defaults(&pool).await.unwrap(), 0);
        assert_eq!(list_rulesets(&pool, false).await.unwrap().len(), 1);
    }
}
