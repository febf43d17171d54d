//! PortWatch Engine - snapshot holders, polling loops and actions.
//!
//! The engine keeps the latest host bindings and the latest container index
//! behind separate locks. Each is replaced wholesale by its own scanner;
//! the view is computed on demand from whichever snapshots are current.
//!
//! # Staleness
//! The two snapshots are not taken together. A view may combine a host scan
//! and a container scan from different instants, up to one container
//! interval apart. Callers must treat container attribution as advisory.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::adapters::{DockerPorts, HostPortScanner, ProcessKiller};
use crate::context::ScanContext;
use crate::domain::reconcile::enrich;
use crate::domain::{
    reconcile, ContainerIndex, PortBinding, PortViewRecord, Protocol, RangeQuery, ScanSummary,
};
use crate::error::ActionResult;
use crate::ports::{ContainerControlPort, ContainerScannerPort, HostScannerPort, ProcessKillerPort};

/// Engine wired to the real backends.
pub type DefaultEngine = PortWatchEngine<HostPortScanner, DockerPorts, ProcessKiller>;

/// The main PortWatch engine.
///
/// Scans never fail; actions return [`ActionResult`]. Every snapshot
/// replacement bumps a generation counter that [`subscribe`](Self::subscribe)
/// exposes, so a presentation layer can redraw on change.
pub struct PortWatchEngine<H, C, K> {
    host: H,
    containers: C,
    killer: K,

    bindings: RwLock<Arc<Vec<PortBinding>>>,
    index: RwLock<Arc<ContainerIndex>>,

    generation: watch::Sender<u64>,
}

impl DefaultEngine {
    /// Build an engine over the real backends described by `ctx`.
    pub async fn from_context(ctx: &Arc<ScanContext>) -> Self {
        Self::new(
            HostPortScanner::new(ctx).await,
            DockerPorts::new(ctx),
            ProcessKiller::from_context(ctx),
        )
    }
}

impl<H, C, K> PortWatchEngine<H, C, K>
where
    H: HostScannerPort,
    C: ContainerScannerPort,
    K: ProcessKillerPort,
{
    pub fn new(host: H, containers: C, killer: K) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            host,
            containers,
            killer,
            bindings: RwLock::new(Arc::new(Vec::new())),
            index: RwLock::new(Arc::new(ContainerIndex::new())),
            generation,
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Run a host scan and publish it. Returns the number of bindings.
    pub async fn refresh_hosts(&self) -> usize {
        let bindings = self.host.scan().await;
        let count = bindings.len();
        *self.bindings.write() = Arc::new(bindings);
        self.generation.send_modify(|g| *g += 1);
        debug!(count, "Host snapshot replaced");
        count
    }

    /// Run a container scan and publish it. Returns the number of mappings.
    pub async fn refresh_containers(&self) -> usize {
        let index = self.containers.scan().await;
        let count = index.mapping_count();
        *self.index.write() = Arc::new(index);
        self.generation.send_modify(|g| *g += 1);
        debug!(count, "Container snapshot replaced");
        count
    }

    /// Refresh both snapshots concurrently.
    pub async fn refresh(&self) {
        tokio::join!(self.refresh_hosts(), self.refresh_containers());
    }

    /// Latest host bindings.
    pub fn bindings(&self) -> Arc<Vec<PortBinding>> {
        self.bindings.read().clone()
    }

    /// Latest container index.
    pub fn index(&self) -> Arc<ContainerIndex> {
        self.index.read().clone()
    }

    /// Receiver that changes whenever a snapshot is replaced.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    /// Reconciled view of the current snapshots.
    pub fn view(&self, query: &RangeQuery) -> Vec<PortViewRecord> {
        let bindings = self.bindings();
        let index = self.index();
        reconcile(&bindings, &index, query)
    }

    /// Counters for a view of `displayed` records.
    pub fn summary(&self, displayed: usize) -> ScanSummary {
        ScanSummary {
            total_found: self.bindings.read().len(),
            total_displayed: displayed,
            mapping_count: self.index.read().mapping_count(),
        }
    }

    /// Current bindings owned by `pid`, with container attribution.
    pub fn records_for_pid(&self, pid: u32) -> Vec<PortViewRecord> {
        let mut records: Vec<PortViewRecord> = self
            .bindings()
            .iter()
            .filter(|b| b.pid == Some(pid))
            .cloned()
            .map(PortViewRecord::bound)
            .collect();
        enrich(&mut records, &self.index());
        records
    }

    /// The binding that owns `port`, TCP before UDP, if it has a known PID.
    pub fn find_owner(&self, port: u16) -> Option<PortViewRecord> {
        let query = RangeQuery::new(port, port).with_only_used(true);
        let records = self.view(&query);
        Protocol::ALL.iter().find_map(|protocol| {
            records
                .iter()
                .find(|r| r.protocol() == *protocol && r.pid().is_some())
                .cloned()
        })
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Terminate a process, then rescan the host.
    pub async fn kill_process(&self, pid: u32) -> ActionResult<()> {
        self.killer.terminate(pid).await?;
        info!(pid, "Process terminated");
        self.refresh_hosts().await;
        Ok(())
    }

    pub fn is_running(&self, pid: u32) -> bool {
        self.killer.is_running(pid)
    }
}

impl<H, C, K> PortWatchEngine<H, C, K>
where
    H: HostScannerPort,
    C: ContainerScannerPort + ContainerControlPort,
    K: ProcessKillerPort,
{
    /// Stop a container, then rescan both snapshots.
    pub async fn stop_container(&self, container_id: &str) -> ActionResult<()> {
        self.containers.stop(container_id).await?;
        info!(container_id, "Container stopped");
        self.refresh().await;
        Ok(())
    }

    /// Restart a container, then rescan both snapshots.
    pub async fn restart_container(&self, container_id: &str) -> ActionResult<()> {
        self.containers.restart(container_id).await?;
        info!(container_id, "Container restarted");
        self.refresh().await;
        Ok(())
    }
}

impl<H, C, K> PortWatchEngine<H, C, K>
where
    H: HostScannerPort + 'static,
    C: ContainerScannerPort + 'static,
    K: ProcessKillerPort + 'static,
{
    /// Start the host and container polling loops.
    ///
    /// Each loop scans immediately, then once per period. A scan in flight
    /// always runs to completion; stopping takes effect between scans.
    pub fn spawn_polling(self: &Arc<Self>, host_every: Duration, container_every: Duration) -> PollingHandle {
        let (shutdown, _) = watch::channel(false);

        let host_loop = {
            let engine = Arc::clone(self);
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                let mut ticker = interval(host_every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = stop.changed() => break,
                    }
                    engine.refresh_hosts().await;
                }
                debug!("Host polling stopped");
            })
        };

        let container_loop = {
            let engine = Arc::clone(self);
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                let mut ticker = interval(container_every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = stop.changed() => break,
                    }
                    engine.refresh_containers().await;
                }
                debug!("Container polling stopped");
            })
        };

        PollingHandle {
            shutdown,
            tasks: vec![host_loop, container_loop],
        }
    }
}

/// Handle to the running polling loops.
pub struct PollingHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollingHandle {
    /// Signal both loops and wait for any in-flight scan to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}
