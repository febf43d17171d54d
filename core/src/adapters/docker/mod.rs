//! Container port enumeration and lifecycle actions.
//!
//! The daemon API is tried first. If any part of an API pass fails, the
//! runtime's CLI is used instead, but only when `docker version` answers
//! within the liveness timeout.

mod api;
mod cli;
mod parsers;

use std::future::Future;
use std::sync::Arc;

use bollard::errors::Error as BollardError;
use tracing::{debug, warn};

use crate::context::ScanContext;
use crate::domain::{ContainerIndex, ContainerPortMapping};
use crate::error::{ActionError, ActionResult, Result};
use crate::ports::{ContainerControlPort, ContainerScannerPort};

pub use api::DockerApi;
pub use cli::DockerCli;
pub use parsers::parse_ps_output;

/// One source of published-port mappings.
pub trait ContainerBackend: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Whether the backend can answer at all right now.
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    fn mappings(&self) -> impl Future<Output = Result<Vec<ContainerPortMapping>>> + Send;
}

impl ContainerBackend for DockerApi {
    fn name(&self) -> &str {
        "docker api"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn mappings(&self) -> Result<Vec<ContainerPortMapping>> {
        DockerApi::mappings(self).await
    }
}

impl ContainerBackend for DockerCli {
    fn name(&self) -> &str {
        self.binary()
    }

    async fn is_available(&self) -> bool {
        DockerCli::is_available(self).await
    }

    async fn mappings(&self) -> Result<Vec<ContainerPortMapping>> {
        DockerCli::mappings(self).await
    }
}

/// Container backend combining the API client and the CLI.
pub struct DockerPorts<A = DockerApi, L = DockerCli> {
    api: Option<A>,
    cli: L,
}

impl DockerPorts {
    pub fn new(ctx: &Arc<ScanContext>) -> Self {
        Self::with_backends(
            ctx.docker().cloned().map(DockerApi::new),
            DockerCli::new(
                ctx.docker_binary(),
                ctx.probe_timeout(),
                ctx.command_timeout(),
            ),
        )
    }
}

impl<A: ContainerBackend, L: ContainerBackend> DockerPorts<A, L> {
    /// Compose explicit backends; `None` leaves only the CLI.
    pub fn with_backends(api: Option<A>, cli: L) -> Self {
        Self { api, cli }
    }

    async fn collect(&self) -> Vec<ContainerPortMapping> {
        if let Some(api) = &self.api {
            match api.mappings().await {
                Ok(mappings) => return mappings,
                Err(e) => debug!(backend = api.name(), error = %e, "API pass failed, trying CLI"),
            }
        }

        if !self.cli.is_available().await {
            return Vec::new();
        }

        match self.cli.mappings().await {
            Ok(mappings) => mappings,
            Err(e) => {
                warn!(binary = self.cli.name(), error = %e, "docker ps failed");
                Vec::new()
            }
        }
    }
}

impl<A: ContainerBackend, L: ContainerBackend> ContainerScannerPort for DockerPorts<A, L> {
    async fn scan(&self) -> ContainerIndex {
        let index: ContainerIndex = self.collect().await.into_iter().collect();
        debug!(mappings = index.mapping_count(), "Container index rebuilt");
        index
    }
}

impl ContainerControlPort for DockerPorts {
    async fn stop(&self, container_id: &str) -> ActionResult<()> {
        if let Some(api) = &self.api {
            match api.stop(container_id).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if let Some(err) = definitive_api_error(container_id, &e) {
                        return Err(err);
                    }
                    debug!(container_id, error = %e, "API stop failed, trying CLI");
                }
            }
        }
        self.cli.stop(container_id).await
    }

    async fn restart(&self, container_id: &str) -> ActionResult<()> {
        if let Some(api) = &self.api {
            match api.restart(container_id).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    if let Some(err) = definitive_api_error(container_id, &e) {
                        return Err(err);
                    }
                    debug!(container_id, error = %e, "API restart failed, trying CLI");
                }
            }
        }
        self.cli.restart(container_id).await
    }
}

/// Daemon answers that the CLI would only repeat.
///
/// Transport errors return `None` so the CLI gets its turn.
fn definitive_api_error(container_id: &str, error: &BollardError) -> Option<ActionError> {
    let target = format!("container {}", container_id);
    match error {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => Some(ActionError::not_found(target)),
        BollardError::DockerResponseServerError {
            status_code: 403, ..
        } => Some(ActionError::permission_denied(target)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend with a fixed answer that counts `mappings` calls.
    struct FixedBackend {
        available: bool,
        outcome: Option<Vec<ContainerPortMapping>>,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn new(available: bool, outcome: Option<Vec<ContainerPortMapping>>) -> Self {
            Self {
                available,
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ContainerBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn mappings(&self) -> Result<Vec<ContainerPortMapping>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .ok_or_else(|| Error::CommandFailed("daemon unreachable".to_string()))
        }
    }

    fn web(host_port: u16) -> ContainerPortMapping {
        ContainerPortMapping {
            container_id: "abc123".to_string(),
            container_name: "web".to_string(),
            image: "nginx:latest".to_string(),
            host_ip: String::new(),
            host_port,
            container_port: 80,
            protocol: Protocol::Tcp,
        }
    }

    #[tokio::test]
    async fn test_api_mappings_win() {
        let ports = DockerPorts::with_backends(
            Some(FixedBackend::new(true, Some(vec![web(8080)]))),
            FixedBackend::new(true, Some(vec![web(9090)])),
        );
        let index = ports.scan().await;
        assert_eq!(index.get(Protocol::Tcp, 8080).map(<[_]>::len), Some(1));
        assert!(index.get(Protocol::Tcp, 9090).is_none());
        assert_eq!(ports.cli.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_error_uses_live_cli() {
        let ports = DockerPorts::with_backends(
            Some(FixedBackend::new(true, None)),
            FixedBackend::new(true, Some(vec![web(9090)])),
        );
        let index = ports.scan().await;
        assert_eq!(index.get(Protocol::Tcp, 9090).map(<[_]>::len), Some(1));
        assert_eq!(ports.cli.calls(), 1);
    }

    #[tokio::test]
    async fn test_api_error_with_dead_cli_is_empty() {
        let ports = DockerPorts::with_backends(
            Some(FixedBackend::new(true, None)),
            FixedBackend::new(false, Some(vec![web(9090)])),
        );
        assert!(ports.scan().await.is_empty());
        assert_eq!(ports.cli.calls(), 0);
    }

    #[tokio::test]
    async fn test_cli_failure_is_empty() {
        let ports = DockerPorts::<FixedBackend, _>::with_backends(None, FixedBackend::new(true, None));
        assert!(ports.scan().await.is_empty());
        assert_eq!(ports.cli.calls(), 1);
    }

    #[test]
    fn test_definitive_api_error() {
        let err = BollardError::DockerResponseServerError {
            status_code: 404,
            message: "No such container: web".to_string(),
        };
        assert_eq!(
            definitive_api_error("web", &err),
            Some(ActionError::not_found("container web"))
        );

        let err = BollardError::DockerResponseServerError {
            status_code: 403,
            message: "forbidden".to_string(),
        };
        assert_eq!(definitive_api_error("web", &err).map(|e| e.kind()), Some("permission denied"));

        let err = BollardError::DockerResponseServerError {
            status_code: 500,
            message: "boom".to_string(),
        };
        assert_eq!(definitive_api_error("web", &err), None);
    }

    #[tokio::test]
    async fn test_unavailable_runtime_gives_empty_index() {
        let ports = DockerPorts::with_backends(
            None::<DockerApi>,
            DockerCli::new(
                "/nonexistent/docker",
                Duration::from_millis(200),
                Duration::from_millis(200),
            ),
        );
        assert!(ports.scan().await.is_empty());
    }
}
