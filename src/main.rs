//! Playlist Agent - natural-language playlist generation for Spotify.
//!
//! Describe a playlist in plain words; the agent extracts the parameters,
//! samples tracks from the artists you follow, applies your rulesets, and
//! publishes the result to your Spotify library.

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod model;
pub mod rulesets;
pub mod services;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("playlist_agent=info".parse()?))
        .init();

    cli::run_command(&args)
}
