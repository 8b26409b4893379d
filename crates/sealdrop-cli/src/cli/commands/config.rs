//! Config command handlers.

use anyhow::{Context, Result};
use sealdrop_core::config::{Config, paths};

pub fn path() {
    println!("{}", paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn set_server(url: &str) -> Result<()> {
    Config::save_base_url(url).context("save server base URL")?;
    println!("Server set to {url}");
    Ok(())
}
