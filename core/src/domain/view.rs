//! Per-port view records produced by reconciliation.

use serde::{Deserialize, Serialize};

use super::{ContainerPortMapping, PortBinding, Protocol};

/// State label carried by synthetic-free records.
pub const FREE_STATE: &str = "FREE";

/// One row of the reconciled port view.
///
/// A record is either backed by a real OS binding or is synthetic-free.
/// Synthetic-free records have no pid, an empty remote address and a local
/// address of `*:<port>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortViewRecord {
    #[serde(flatten)]
    pub binding: PortBinding,

    /// True when no OS binding existed for this (protocol, port).
    pub is_free: bool,

    /// Display name of the primary container, with " (+N)" when N more
    /// mappings share the key. Empty when no container publishes the port.
    #[serde(default)]
    pub container_name: String,

    #[serde(default)]
    pub container_id: String,

    #[serde(default)]
    pub image: String,

    /// Container-internal port of the primary mapping.
    #[serde(default)]
    pub container_port: Option<u16>,
}

impl PortViewRecord {
    /// Wrap a real OS binding.
    pub fn bound(binding: PortBinding) -> Self {
        Self {
            binding,
            is_free: false,
            container_name: String::new(),
            container_id: String::new(),
            image: String::new(),
            container_port: None,
        }
    }

    /// Placeholder for a port with no observed binding.
    pub fn free(port: u16, protocol: Protocol) -> Self {
        let binding = PortBinding::new(port, protocol, FREE_STATE)
            .with_addresses(format!("*:{}", port), "");
        Self {
            is_free: true,
            ..Self::bound(binding)
        }
    }

    /// Copy the primary mapping onto this record.
    ///
    /// `extra` is the number of further mappings sharing the key; it only
    /// affects the displayed name.
    pub fn attach_container(&mut self, primary: &ContainerPortMapping, extra: usize) {
        self.container_name = if extra > 0 {
            format!("{} (+{})", primary.container_name, extra)
        } else {
            primary.container_name.clone()
        };
        self.container_id = primary.container_id.clone();
        self.image = primary.image.clone();
        self.container_port = Some(primary.container_port);
    }

    pub fn port(&self) -> u16 {
        self.binding.port
    }

    pub fn protocol(&self) -> Protocol {
        self.binding.protocol
    }

    pub fn pid(&self) -> Option<u32> {
        self.binding.pid
    }

    pub fn has_container(&self) -> bool {
        !self.container_name.is_empty()
    }

    /// Status label for display: the OS state, or FREE.
    pub fn status_label(&self) -> &str {
        if self.is_free {
            FREE_STATE
        } else {
            &self.binding.state
        }
    }

    /// Container column text, e.g. `web (8080->80/tcp) @ nginx:latest`.
    pub fn container_label(&self) -> String {
        if !self.has_container() {
            return String::new();
        }
        let cport = self
            .container_port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        let image = if self.image.is_empty() {
            String::new()
        } else {
            format!(" @ {}", self.image)
        };
        format!(
            "{} ({}->{}/{}){}",
            self.container_name,
            self.port(),
            cport,
            self.protocol().as_str().to_lowercase(),
            image
        )
    }

    /// Local URL for container-backed records.
    pub fn browser_url(&self) -> Option<String> {
        self.has_container()
            .then(|| format!("http://localhost:{}", self.port()))
    }

    /// Whether killing the owning process may take down the container runtime.
    pub fn kill_affects_containers(&self) -> bool {
        let name = self.binding.process_name.to_lowercase();
        !self.container_id.is_empty() || name.contains("docker")
    }

    /// Check if this record matches a free-text search query.
    ///
    /// Searches across port, protocol, status, PID, process name, addresses,
    /// container name and image.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let query_lower = query.to_lowercase();
        let b = &self.binding;
        b.port.to_string().contains(&query_lower)
            || b.protocol.as_str().to_lowercase().contains(&query_lower)
            || self.status_label().to_lowercase().contains(&query_lower)
            || b.pid.map(|p| p.to_string().contains(&query_lower)).unwrap_or(false)
            || b.process_name.to_lowercase().contains(&query_lower)
            || b.local_address.to_lowercase().contains(&query_lower)
            || b.remote_address.to_lowercase().contains(&query_lower)
            || self.container_name.to_lowercase().contains(&query_lower)
            || self.image.to_lowercase().contains(&query_lower)
    }
}

/// Human-readable counters for status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Raw OS bindings found by the last host scan.
    pub total_found: usize,
    /// Records in the current view.
    pub total_displayed: usize,
    /// Container mappings in the last container index.
    pub mapping_count: usize,
}

impl ScanSummary {
    pub fn host_message(&self) -> String {
        format!("Found {} active entries (network)", self.total_found)
    }

    pub fn container_message(&self) -> String {
        if self.mapping_count > 0 {
            format!("Docker: {} mappings detected", self.mapping_count)
        } else {
            "Docker: no mappings or runtime unavailable".to_string()
        }
    }

    pub fn view_message(&self) -> String {
        format!("Displaying: {}", self.total_displayed)
    }
}

impl std::fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.host_message(),
            self.container_message(),
            self.view_message()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::mapping;

    #[test]
    fn test_free_record_shape() {
        let record = PortViewRecord::free(8080, Protocol::Tcp);
        assert!(record.is_free);
        assert_eq!(record.pid(), None);
        assert_eq!(record.binding.local_address, "*:8080");
        assert_eq!(record.binding.remote_address, "");
        assert_eq!(record.status_label(), "FREE");
        assert!(!record.has_container());
    }

    #[test]
    fn test_attach_container_suffix() {
        let mut record = PortViewRecord::free(8080, Protocol::Tcp);
        record.attach_container(&mapping("web", Protocol::Tcp, 8080, 80), 2);
        assert_eq!(record.container_name, "web (+2)");
        assert_eq!(record.container_id, "web-id");
        assert_eq!(record.image, "web:latest");
        assert_eq!(record.container_port, Some(80));
    }

    #[test]
    fn test_container_label_and_url() {
        let mut record = PortViewRecord::free(8080, Protocol::Tcp);
        assert_eq!(record.container_label(), "");
        assert_eq!(record.browser_url(), None);

        record.attach_container(&mapping("web", Protocol::Tcp, 8080, 80), 0);
        assert_eq!(record.container_label(), "web (8080->80/tcp) @ web:latest");
        assert_eq!(record.browser_url().as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_kill_warning() {
        let binding = PortBinding::new(2375, Protocol::Tcp, "LISTEN")
            .with_process(Some(42), "com.docker.backend");
        assert!(PortViewRecord::bound(binding).kill_affects_containers());

        let binding = PortBinding::new(22, Protocol::Tcp, "LISTEN").with_process(Some(1), "sshd");
        assert!(!PortViewRecord::bound(binding).kill_affects_containers());
    }

    #[test]
    fn test_matches_search() {
        let binding = PortBinding::new(3000, Protocol::Tcp, "LISTEN")
            .with_process(Some(1234), "node")
            .with_addresses("127.0.0.1:3000", "");
        let mut record = PortViewRecord::bound(binding);
        record.attach_container(&mapping("api", Protocol::Tcp, 3000, 3000), 0);

        assert!(record.matches_search("node"));
        assert!(record.matches_search("3000"));
        assert!(record.matches_search("1234"));
        assert!(record.matches_search("listen"));
        assert!(record.matches_search("tcp"));
        assert!(record.matches_search("API"));
        assert!(record.matches_search("latest"));
        assert!(record.matches_search(""));
        assert!(!record.matches_search("nginx"));
    }

    #[test]
    fn test_summary_messages() {
        let summary = ScanSummary {
            total_found: 3,
            total_displayed: 12,
            mapping_count: 0,
        };
        assert_eq!(summary.host_message(), "Found 3 active entries (network)");
        assert_eq!(
            summary.container_message(),
            "Docker: no mappings or runtime unavailable"
        );
        assert_eq!(summary.view_message(), "Displaying: 12");
    }
}
