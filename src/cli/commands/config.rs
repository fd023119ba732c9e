//! Config file commands.

use anyhow::bail;

use super::Context;
use crate::config;

/// Print the config file location
pub fn cmd_config_path(ctx: &Context) -> anyhow::Result<()> {
    match &ctx.config_path {
        Some(path) => {
            let state = if path.exists() { "" } else { " (not created yet)" };
            println!("{}{}", path.display(), state);
        }
        None => println!("No config directory available on this system"),
    }
    Ok(())
}

/// Write a default config file
pub fn cmd_config_init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let Some(path) = &ctx.config_path else {
        return Err(config::ConfigError::NoConfigDir.into());
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    config::save_to(&config::Config::default(), path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
