//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while the CLI
//! uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level application error enum
//! - Module-specific errors ([`GenerationError`], [`RulesetError`],
//!   [`AuthError`], [`ConfigError`], [`ServiceError`]) for detailed handling
//!
//! # Example
//!
//! ```ignore
//! use playlist_agent::error::{Result, ResultExt};
//!
//! async fn open(url: &str) -> Result<SqlitePool> {
//!     init_db(url).await.with_context("opening database")
//! }
//! ```

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::generator::GenerationError;
use crate::rulesets::RulesetError;
use crate::services::ServiceError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
///
/// Aggregates errors from all subsystems for unified handling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// External service error
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Playlist generation error
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Ruleset storage error
    #[error(transparent)]
    Ruleset(#[from] RulesetError),

    /// Authorization error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().context(ctx))
    }
}
