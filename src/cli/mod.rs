//! Command-line interface for playlist-agent.
//!
//! This module provides commands for generating playlists, managing
//! rulesets, and authorizing with Spotify.

mod commands;

pub use commands::{Cli, Commands, run_command};
