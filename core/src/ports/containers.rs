//! Container runtime ports (interfaces).

use crate::domain::ContainerIndex;
use crate::error::ActionResult;

/// Port for enumerating container port-publish mappings.
///
/// Like host scanning, this never fails: an unreachable runtime yields an
/// empty index.
pub trait ContainerScannerPort: Send + Sync {
    /// Build a fresh index of published ports of running containers.
    fn scan(&self) -> impl std::future::Future<Output = ContainerIndex> + Send;
}

/// Port for container lifecycle actions.
pub trait ContainerControlPort: Send + Sync {
    /// Stop a running container.
    fn stop(&self, container_id: &str) -> impl std::future::Future<Output = ActionResult<()>> + Send;

    /// Restart a container.
    fn restart(
        &self,
        container_id: &str,
    ) -> impl std::future::Future<Output = ActionResult<()>> + Send;
}
