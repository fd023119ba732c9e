//! CLI command definitions and dispatch.
//!
//! Each subcommand group is implemented in its own submodule:
//! - `generate`: Natural-language playlist generation
//! - `rulesets`: Ruleset management and matching
//! - `auth`: Spotify authorization
//! - `config`: Config file helpers

mod auth;
mod config;
mod generate;
mod rulesets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use sqlx::sqlite::SqlitePool;
use tokio::runtime::Runtime;

use crate::auth::{StoredUser, TokenManager};
use crate::config::{self as app_config, Config, ConfigError};
use crate::db;
use crate::error::{self, ResultExt};
use crate::services::spotify::{AccountsClient, SpotifyClient};

pub use auth::{cmd_auth_login, cmd_auth_status, cmd_auth_url};
pub use config::{cmd_config_init, cmd_config_path};
pub use generate::cmd_generate;
pub use rulesets::{
    cmd_rulesets_add, cmd_rulesets_list, cmd_rulesets_match, cmd_rulesets_remove,
    cmd_rulesets_seed, cmd_rulesets_show, cmd_rulesets_update,
};

/// Playlist Agent CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Spotify client ID
    #[arg(long, global = true, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub spotify_client_id: Option<String>,

    /// Spotify client secret
    #[arg(long, global = true, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    /// Gemini API key
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a playlist from a description
    Generate {
        /// What the playlist should sound like, e.g. "15 retro songs for a road trip"
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        /// Number of songs (overrides the description)
        #[arg(short, long)]
        num_songs: Option<u32>,
        /// Make a daily drive playlist with a weekday intro track
        #[arg(long)]
        daily_drive: bool,
        /// Avoid explicit tracks
        #[arg(long)]
        no_explicit: bool,
        /// Apply this ruleset instead of matching keywords
        #[arg(short, long)]
        ruleset: Option<String>,
        /// Show the selection without creating a playlist
        #[arg(long)]
        dry_run: bool,
        /// Local user id (default: most recent login)
        #[arg(long)]
        user: Option<i64>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage rulesets
    Rulesets {
        #[command(subcommand)]
        action: RulesetCommand,
    },
    /// Spotify authorization
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },
    /// Config file helpers
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

/// Ruleset subcommands
#[derive(Subcommand)]
pub enum RulesetCommand {
    /// List rulesets in matching order
    List {
        /// Only show active rulesets
        #[arg(long)]
        active_only: bool,
    },
    /// Show one ruleset
    Show { name: String },
    /// Create a ruleset
    Add {
        name: String,
        #[command(flatten)]
        fields: RulesetFields,
        /// Create the ruleset disabled
        #[arg(long)]
        inactive: bool,
    },
    /// Change a ruleset; only the given fields are updated
    Update {
        name: String,
        /// New name
        #[arg(long)]
        rename: Option<String>,
        #[command(flatten)]
        fields: RulesetFields,
        /// Enable or disable
        #[arg(long)]
        active: Option<bool>,
        /// Remove all year and genre constraints before applying new ones
        #[arg(long)]
        clear_criteria: bool,
    },
    /// Delete a ruleset
    Remove { name: String },
    /// Show which rulesets a description would trigger
    Match {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Insert the built-in rulesets if none exist
    Seed,
}

/// Ruleset fields shared by `add` and `update`
#[derive(Args, Debug, Default)]
pub struct RulesetFields {
    /// Trigger keywords, comma separated
    #[arg(long, value_delimiter = ',')]
    pub keywords: Option<Vec<String>>,
    /// Earliest release year
    #[arg(long)]
    pub min_year: Option<i32>,
    /// Latest release year
    #[arg(long)]
    pub max_year: Option<i32>,
    /// Only releases from the last N years
    #[arg(long)]
    pub years_back: Option<i32>,
    /// Required artist genre (repeatable)
    #[arg(long = "genre")]
    pub genres: Vec<String>,
    /// Free-text description
    #[arg(long)]
    pub description: Option<String>,
}

/// Auth subcommands
#[derive(Subcommand)]
pub enum AuthCommand {
    /// Print the URL that grants this tool access
    Url,
    /// Exchange the code from the redirect for tokens
    Login { code: String },
    /// Show the stored login
    Status,
}

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let ctx = Context::new(cli);

    match &cli.command {
        Commands::Generate {
            prompt,
            num_songs,
            daily_drive,
            no_explicit,
            ruleset,
            dry_run,
            user,
            json,
        } => cmd_generate(
            &rt,
            &ctx,
            &prompt.join(" "),
            crate::generator::RequestOverrides {
                num_songs: *num_songs,
                daily_drive: *daily_drive,
                no_explicit: *no_explicit,
                ruleset: ruleset.clone(),
            },
            *dry_run,
            *user,
            *json,
        ),
        Commands::Rulesets { action } => match action {
            RulesetCommand::List { active_only } => cmd_rulesets_list(&rt, &ctx, *active_only),
            RulesetCommand::Show { name } => cmd_rulesets_show(&rt, &ctx, name),
            RulesetCommand::Add {
                name,
                fields,
                inactive,
            } => cmd_rulesets_add(&rt, &ctx, name, fields, !*inactive),
            RulesetCommand::Update {
                name,
                rename,
                fields,
                active,
                clear_criteria,
            } => cmd_rulesets_update(
                &rt,
                &ctx,
                name,
                rename.clone(),
                fields,
                *active,
                *clear_criteria,
            ),
            RulesetCommand::Remove { name } => cmd_rulesets_remove(&rt, &ctx, name),
            RulesetCommand::Match { text } => cmd_rulesets_match(&rt, &ctx, &text.join(" ")),
            RulesetCommand::Seed => cmd_rulesets_seed(&rt, &ctx),
        },
        Commands::Auth { action } => match action {
            AuthCommand::Url => cmd_auth_url(&ctx),
            AuthCommand::Login { code } => cmd_auth_login(&rt, &ctx, code),
            AuthCommand::Status => cmd_auth_status(&rt, &ctx),
        },
        Commands::Config { action } => match action {
            ConfigCommand::Path => cmd_config_path(&ctx),
            ConfigCommand::Init { force } => cmd_config_init(&ctx, *force),
        },
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Loaded configuration with command-line overrides applied.
pub(crate) struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl Context {
    fn new(cli: &Cli) -> Self {
        let config_path = cli.config.clone().or_else(app_config::config_path);
        let mut config = match &config_path {
            Some(path) => app_config::load_from(path),
            None => app_config::load(),
        };

        if let Some(db) = &cli.db {
            config.database.path = Some(db.clone());
        }
        let credentials = &mut config.credentials;
        if cli.spotify_client_id.is_some() {
            credentials.spotify_client_id = cli.spotify_client_id.clone();
        }
        if cli.spotify_client_secret.is_some() {
            credentials.spotify_client_secret = cli.spotify_client_secret.clone();
        }
        if cli.gemini_api_key.is_some() {
            credentials.gemini_api_key = cli.gemini_api_key.clone();
        }

        Self {
            config,
            config_path,
        }
    }

    /// Open the database, running migrations.
    pub async fn pool(&self) -> error::Result<SqlitePool> {
        let url = db::db_url(self.config.database.path.as_deref());
        db::init_db(&url)
            .await
            .with_context(format!("opening database {}", url))
    }

    /// Accounts client from the configured app credentials.
    pub fn accounts(&self) -> error::Result<AccountsClient> {
        let credentials = &self.config.credentials;
        let id = credentials
            .spotify_client_id
            .as_deref()
            .ok_or(ConfigError::Missing("spotify_client_id (or SPOTIFY_CLIENT_ID)"))?;
        let secret = credentials
            .spotify_client_secret
            .as_deref()
            .ok_or(ConfigError::Missing("spotify_client_secret (or SPOTIFY_CLIENT_SECRET)"))?;
        Ok(AccountsClient::new(id, secret, self.config.http.timeout())?)
    }

    /// Spotify client acting for `user`, refreshing tokens as needed.
    pub fn spotify(&self, pool: &SqlitePool, user: &StoredUser) -> error::Result<SpotifyClient> {
        let tokens = TokenManager::new(pool.clone(), user, Arc::new(self.accounts()?));
        Ok(SpotifyClient::new(Arc::new(tokens), self.config.http.timeout())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "playlist-agent",
            "generate",
            "retro",
            "road",
            "trip",
            "-n",
            "12",
            "--no-explicit",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                prompt,
                num_songs,
                no_explicit,
                dry_run,
                daily_drive,
                ..
            } => {
                assert_eq!(prompt.join(" "), "retro road trip");
                assert_eq!(num_songs, Some(12));
                assert!(no_explicit);
                assert!(dry_run);
                assert!(!daily_drive);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_ruleset_add() {
        let cli = Cli::try_parse_from([
            "playlist-agent",
            "rulesets",
            "add",
            "nineties",
            "--keywords",
            "90s,nineties",
            "--min-year",
            "1990",
            "--max-year",
            "1999",
            "--genre",
            "grunge",
            "--genre",
            "britpop",
        ])
        .unwrap();

        match cli.command {
            Commands::Rulesets {
                action:
                    RulesetCommand::Add {
                        name,
                        fields,
                        inactive,
                    },
            } => {
                assert_eq!(name, "nineties");
                assert_eq!(fields.keywords, Some(vec!["90s".into(), "nineties".into()]));
                assert_eq!(fields.min_year, Some(1990));
                assert_eq!(fields.genres, vec!["grunge", "britpop"]);
                assert!(!inactive);
            }
            _ => panic!("expected rulesets add"),
        }
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let ctx = Context {
            config: Config::default(),
            config_path: None,
        };
        assert!(matches!(
            ctx.accounts(),
            Err(error::Error::Config(ConfigError::Missing(_)))
        ));
    }

    #[test]
    fn test_global_db_flag() {
        let cli = Cli::try_parse_from([
            "playlist-agent",
            "rulesets",
            "list",
            "--db",
            "/tmp/x.db",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    }
}
