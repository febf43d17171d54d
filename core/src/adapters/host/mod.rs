//! Host port enumeration.
//!
//! The socket table is read directly when the platform allows it. When that
//! backend is missing or reports nothing, the platform's command-line tool
//! is scraped instead. Both paths produce the same `PortBinding` records.

mod cli;
mod lsof;
mod netstat;
mod socket_table;
mod ss;
mod utils;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::ScanContext;
use crate::domain::PortBinding;
use crate::error::Result;
use crate::ports::HostScannerPort;

pub use cli::{CommandLineScanner, SocketTool};
pub use lsof::parse_lsof_output;
pub use netstat::parse_netstat_output;
pub use socket_table::SocketTableScanner;
pub use ss::parse_ss_output;
pub use utils::Utils;

/// State reported for UDP sockets, which have none of their own.
pub(crate) const UDP_STATE: &str = "LISTEN";

/// One way of reading host bindings.
///
/// Unlike [`HostScannerPort`], a backend reports its failures so the
/// composite can decide whether to fall back.
pub trait HostBackend: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    fn scan(&self) -> impl Future<Output = Result<Vec<PortBinding>>> + Send;
}

/// Host scanner: socket table first, command-line tool second.
pub struct HostPortScanner<P = SocketTableScanner, F = CommandLineScanner> {
    primary: Option<P>,
    fallback: F,
}

impl HostPortScanner {
    /// Check the socket table once and pick the backends.
    pub async fn new(ctx: &Arc<ScanContext>) -> Self {
        let primary = SocketTableScanner::detect(ctx.names().clone()).await;
        let fallback = CommandLineScanner::new(
            SocketTool::for_platform(),
            ctx.names().clone(),
            ctx.command_timeout(),
        );
        debug!(
            socket_table = primary.is_some(),
            fallback = fallback.name(),
            "Host scanner backends selected"
        );
        Self::with_backends(primary, fallback)
    }
}

impl<P: HostBackend, F: HostBackend> HostPortScanner<P, F> {
    /// Compose explicit backends; `None` skips straight to the fallback.
    pub fn with_backends(primary: Option<P>, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: HostBackend, F: HostBackend> HostScannerPort for HostPortScanner<P, F> {
    async fn scan(&self) -> Vec<PortBinding> {
        if let Some(primary) = &self.primary {
            match primary.scan().await {
                Ok(bindings) if !bindings.is_empty() => return bindings,
                Ok(_) => debug!(backend = primary.name(), "Primary returned nothing, falling back"),
                Err(e) => warn!(backend = primary.name(), error = %e, "Primary scan failed, falling back"),
            }
        }

        match self.fallback.scan().await {
            Ok(bindings) => bindings,
            Err(e) => {
                warn!(backend = self.fallback.name(), error = %e, "Host scan produced no data");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend returning a fixed outcome and counting calls.
    struct FixedBackend {
        outcome: Option<Vec<PortBinding>>,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn ok(bindings: Vec<PortBinding>) -> Self {
            Self {
                outcome: Some(bindings),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                outcome: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HostBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn scan(&self) -> Result<Vec<PortBinding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .ok_or_else(|| Error::CommandFailed("backend down".to_string()))
        }
    }

    fn listener(port: u16) -> PortBinding {
        PortBinding::new(port, Protocol::Tcp, "LISTEN").with_process(Some(port as u32), "app")
    }

    #[tokio::test]
    async fn test_non_empty_primary_wins() {
        let scanner = HostPortScanner::with_backends(
            Some(FixedBackend::ok(vec![listener(22)])),
            FixedBackend::ok(vec![listener(80)]),
        );
        let bindings = scanner.scan().await;
        assert_eq!(bindings, vec![listener(22)]);
        assert_eq!(scanner.fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_primary_uses_fallback() {
        let scanner = HostPortScanner::with_backends(
            Some(FixedBackend::ok(vec![])),
            FixedBackend::ok(vec![listener(80)]),
        );
        assert_eq!(scanner.scan().await, vec![listener(80)]);
        assert_eq!(scanner.fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_primary_uses_fallback() {
        let scanner = HostPortScanner::with_backends(
            Some(FixedBackend::failing()),
            FixedBackend::ok(vec![listener(80)]),
        );
        assert_eq!(scanner.scan().await, vec![listener(80)]);
    }

    #[tokio::test]
    async fn test_missing_primary_uses_fallback() {
        let scanner = HostPortScanner::<FixedBackend, _>::with_backends(
            None,
            FixedBackend::ok(vec![listener(443)]),
        );
        assert_eq!(scanner.scan().await, vec![listener(443)]);
    }

    #[tokio::test]
    async fn test_new_scans_without_blocking_runtime() {
        let ctx = ScanContext::shared(&crate::config::Config::default());
        let scanner = HostPortScanner::new(&ctx).await;
        assert!(scanner.scan().await.iter().all(|b| b.port != 0));
    }

    #[tokio::test]
    async fn test_total_failure_is_empty() {
        let scanner =
            HostPortScanner::with_backends(Some(FixedBackend::failing()), FixedBackend::failing());
        assert!(scanner.scan().await.is_empty());
        assert_eq!(scanner.primary.as_ref().map(FixedBackend::calls), Some(1));
        assert_eq!(scanner.fallback.calls(), 1);
    }
}
