//! Container commands - stop and restart.

use anyhow::{bail, Result};
use portwatch_core::Config;

pub async fn stop(config: &Config, container: &str) -> Result<()> {
    let engine = super::engine(config).await;
    match engine.stop_container(container).await {
        Ok(()) => {
            println!("Stopped container {}", container);
            Ok(())
        }
        Err(e) => bail!("{} ({})", e, e.kind()),
    }
}

pub async fn restart(config: &Config, container: &str) -> Result<()> {
    let engine = super::engine(config).await;
    match engine.restart_container(container).await {
        Ok(()) => {
            println!("Restarted container {}", container);
            Ok(())
        }
        Err(e) => bail!("{} ({})", e, e.kind()),
    }
}
