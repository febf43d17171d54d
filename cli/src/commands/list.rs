//! List command - one scan-and-merge pass over a port range.

use anyhow::Result;
use portwatch_core::Config;

use crate::output;
use crate::ViewArgs;

pub async fn run(config: &Config, view: &ViewArgs, json: bool) -> Result<()> {
    let engine = super::engine(config).await;
    engine.refresh().await;

    let mut records = engine.view(&view.query(config));
    records.retain(|r| r.matches_search(view.search()));
    let summary = engine.summary(records.len());

    if json {
        output::print_json(&records, &summary)?;
    } else {
        output::print_table(&records);
        println!();
        println!("{}", summary);
    }
    Ok(())
}
