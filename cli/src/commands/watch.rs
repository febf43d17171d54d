//! Watch command - poll both scanners and reprint on change.

use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use portwatch_core::{Config, PortViewRecord};
use tracing::debug;

use crate::output;
use crate::ViewArgs;

pub async fn run(
    config: &Config,
    view: &ViewArgs,
    interval: Option<u64>,
    container_interval: Option<u64>,
    json: bool,
) -> Result<()> {
    let host_every = interval
        .map(|s| Duration::from_secs(s.max(1)))
        .unwrap_or_else(|| config.host_interval());
    let container_every = container_interval
        .map(|s| Duration::from_secs(s.max(1)))
        .unwrap_or_else(|| config.container_interval());

    let engine = super::engine(config).await;
    let query = view.query(config);
    let mut changes = engine.subscribe();
    let polling = engine.spawn_polling(host_every, container_every);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last: Option<Vec<PortViewRecord>> = None;
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                debug!("Interrupted");
                break;
            }
        }

        let mut records = engine.view(&query);
        records.retain(|r| r.matches_search(view.search()));
        if last.as_ref() == Some(&records) {
            continue;
        }

        let summary = engine.summary(records.len());
        if json {
            output::print_json_line(&records, &summary)?;
        } else {
            println!("== {} ==", Local::now().format("%Y-%m-%d %H:%M:%S"));
            output::print_table(&records);
            println!("{}\n", summary);
        }
        last = Some(records);
    }

    polling.stop().await;
    Ok(())
}
