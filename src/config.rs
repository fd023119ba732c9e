//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\playlist-agent\config.toml
//! - macOS: ~/Library/Application Support/playlist-agent/config.toml
//! - Linux: ~/.config/playlist-agent/config.toml
//!
//! Every section is optional; missing fields take their defaults. Credentials
//! can also be supplied through environment variables on the command line.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::gemini::DEFAULT_MODEL;
use crate::services::spotify::MAX_FOLLOWED_PAGE;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials
    pub credentials: Credentials,

    /// Playlist generation settings
    pub generation: GenerationConfig,

    /// Daily drive intro tracks
    pub daily_drive: DailyDriveConfig,

    /// HTTP client settings
    pub http: HttpConfig,

    /// Database location
    pub database: DatabaseConfig,
}

/// API credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Spotify application client ID
    pub spotify_client_id: Option<String>,

    /// Spotify application client secret
    pub spotify_client_secret: Option<String>,

    /// Redirect URI registered with the Spotify application
    pub spotify_redirect_uri: String,

    /// Gemini API key; without it requests are not parsed by the model
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    pub gemini_model: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            spotify_client_id: None,
            spotify_client_secret: None,
            spotify_redirect_uri: "http://127.0.0.1:8888/callback".to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Playlist generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Market (ISO 3166-1 alpha-2) for top-track lookups
    pub market: String,

    /// Artists sampled per playlist
    pub max_artists: usize,

    /// Draws per pick before an explicit track is accepted anyway
    pub explicit_attempts: u32,

    /// Followed artists requested from the service (capped at 50)
    pub followed_artist_limit: u32,

    /// Upper bound for the requested song count
    pub max_songs: u32,

    /// Selection multiplier when a ruleset will filter the result
    pub ruleset_oversample: u32,

    /// Concurrent top-track requests
    pub fetch_concurrency: usize,

    /// Unfollow an existing daily drive with the same name before creating
    pub replace_daily_drive: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            market: "US".to_string(),
            max_artists: 10,
            explicit_attempts: 5,
            followed_artist_limit: MAX_FOLLOWED_PAGE,
            max_songs: 100,
            ruleset_oversample: 3,
            fetch_concurrency: 4,
            replace_daily_drive: false,
        }
    }
}

/// Daily drive settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyDriveConfig {
    /// Intro track ID per weekday ("monday" .. "sunday"), overriding the
    /// built-in table
    pub intro_tracks: BTreeMap<String, String>,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 15 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Database settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file (default: playlist_agent.db in the working directory)
    pub path: Option<PathBuf>,
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("playlist-agent"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from disk
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file
pub fn load_from(path: &std::path::Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to a specific file
pub fn save_to(config: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),

    #[error("Missing setting: {0}")]
    Missing(&'static str),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[credentials]"));
        assert!(toml.contains("[generation]"));
        assert!(toml.contains("[http]"));
        assert!(toml.contains("market = \"US\""));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[credentials]
gemini_api_key = "my-key"

[generation]
market = "GB"

[daily_drive.intro_tracks]
monday = "abc123"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.credentials.gemini_api_key.as_deref(), Some("my-key"));
        assert_eq!(config.credentials.gemini_model, DEFAULT_MODEL);
        assert_eq!(config.generation.market, "GB");
        assert_eq!(config.generation.max_artists, 10);
        assert_eq!(config.generation.explicit_attempts, 5);
        assert!(!config.generation.replace_daily_drive);
        assert_eq!(config.daily_drive.intro_tracks["monday"], "abc123");
        assert_eq!(config.http.timeout(), Duration::from_secs(15));
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.generation.fetch_concurrency = 8;
        config.database.path = Some(PathBuf::from("/tmp/agent.db"));
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path);
        assert_eq!(loaded.generation.fetch_concurrency, 8);
        assert_eq!(loaded.database.path, Some(PathBuf::from("/tmp/agent.db")));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let config = load_from(&path);
        assert_eq!(config.generation.market, "US");
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let http = HttpConfig { timeout_secs: 0 };
        assert_eq!(http.timeout(), Duration::from_secs(1));
    }
}
