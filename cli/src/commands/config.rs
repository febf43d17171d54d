//! Config command - print or persist the effective configuration.

use std::path::Path;

use anyhow::{Context, Result};
use portwatch_core::Config;

pub async fn show(config: &Config, path: Option<&Path>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    let store = super::store(path)?;
    println!("Config file:          {}", store.path().display());
    println!("Host interval:        {}s", config.host_refresh_interval);
    println!("Container interval:   {}s", config.container_refresh_interval);
    println!("Default range:        {}-{}", config.range_start, config.range_end);
    println!("Probe timeout:        {}s", config.probe_timeout);
    println!("Command timeout:      {}s", config.command_timeout);
    println!("Kill grace period:    {}ms", config.kill_grace_period);
    println!("Docker binary:        {}", config.docker_binary);
    println!(
        "Docker API:           {}",
        if config.docker_api { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Persist `config`, filling in every default the file omitted.
pub async fn save(config: &Config, path: Option<&Path>) -> Result<()> {
    let store = super::store(path)?;
    store
        .save(config)
        .await
        .with_context(|| format!("Failed to write {}", store.path().display()))?;
    eprintln!("Saved configuration to {}", store.path().display());
    Ok(())
}
