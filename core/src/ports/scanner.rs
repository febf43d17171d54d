//! Host port scanner port (interface).

use crate::domain::PortBinding;

/// Port for enumerating OS-level port bindings.
///
/// Implementations hide which backend produced the data (socket table API
/// or a command-line tool). Scanning never fails: a backend that cannot
/// produce data yields an empty list.
pub trait HostScannerPort: Send + Sync {
    /// Scan all TCP and UDP bindings on the host.
    fn scan(&self) -> impl std::future::Future<Output = Vec<PortBinding>> + Send;
}
