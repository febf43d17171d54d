//! Kill command - terminate a process by PID or by the port it owns.

use anyhow::{bail, Result};
use portwatch_core::Config;

pub async fn run(config: &Config, pid: Option<u32>, port: Option<u16>, yes: bool) -> Result<()> {
    let engine = super::engine(config).await;
    engine.refresh().await;

    let pid = match (pid, port) {
        (Some(pid), _) => pid,
        (None, Some(port)) => {
            let Some((owner, record)) = engine
                .find_owner(port)
                .and_then(|r| r.pid().map(|pid| (pid, r)))
            else {
                bail!("No process with a known PID owns port {}", port);
            };
            println!(
                "Port {} is owned by {} (PID {})",
                port, record.binding.process_name, owner
            );
            owner
        }
        (None, None) => bail!("Specify a PID or --port"),
    };

    let records = engine.records_for_pid(pid);
    if let Some(record) = records.iter().find(|r| r.kill_affects_containers()) {
        let what = if record.has_container() {
            format!("container {}", record.container_name)
        } else {
            format!("the container runtime ({})", record.binding.process_name)
        };
        eprintln!(
            "Warning: PID {} backs {}. Killing it may stop containers or the runtime.",
            pid, what
        );
        if !yes {
            bail!("Refusing to kill PID {} without --yes", pid);
        }
    }

    match engine.kill_process(pid).await {
        Ok(()) => {
            println!("Killed process {}", pid);
            Ok(())
        }
        Err(e) => bail!("{} ({})", e, e.kind()),
    }
}
