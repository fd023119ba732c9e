//! Database connection setup.
//!
//! Uses SQLx with SQLite for lightweight, embedded storage of rulesets and
//! authorized users. Table-specific queries live next to their types in
//! [`crate::rulesets`] and [`crate::auth`].
//!
//! # Example
//!
//! ```ignore
//! use playlist_agent::db::{db_url, init_db};
//!
//! let pool = init_db(&db_url(None)).await?;
//! ```

use std::path::Path;

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "playlist_agent.db";

/// Build a SQLite database URL from an optional path.
///
/// If no path is provided, uses [`DEFAULT_DB_NAME`] in the current directory.
pub fn db_url(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("sqlite:{}", p.display()),
        None => format!("sqlite:{}", DEFAULT_DB_NAME),
    }
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist, establishes a connection
/// pool with up to 5 connections, and runs all pending migrations.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_db_url() {
        assert_eq!(db_url(None), "sqlite:playlist_agent.db");
        assert_eq!(
            db_url(Some(&PathBuf::from("/data/agent.db"))),
            "sqlite:/data/agent.db"
        );
    }

    #[tokio::test]
    async fn test_init_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let url = db_url(Some(&dir.path().join("fresh.db")));

        let pool = init_db(&url).await.unwrap();
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('rulesets', 'users') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
        assert_eq!(names, vec!["rulesets", "users"]);

        // Running again against the same file is a no-op
        drop(pool);
        init_db(&url).await.unwrap();
    }
}
