//! Container port-publish mappings and their lookup index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Protocol;

/// Length of the short container id shown to users.
pub const SHORT_ID_LEN: usize = 12;

/// A container runtime's declaration that a host port forwards into a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerPortMapping {
    /// Short container id.
    pub container_id: String,
    /// Container display name (without the leading '/').
    pub container_name: String,
    /// Image reference: first repo tag, or a short image id.
    pub image: String,
    /// Host-side bind address; empty means all interfaces.
    pub host_ip: String,
    pub host_port: u16,
    pub container_port: u16,
    pub protocol: Protocol,
}

impl ContainerPortMapping {
    pub fn key(&self) -> (Protocol, u16) {
        (self.protocol, self.host_port)
    }
}

/// Shorten a container or image id for display.
///
/// Strips a `sha256:` prefix and truncates to [`SHORT_ID_LEN`] characters.
pub fn short_id(id: &str) -> String {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    id.chars().take(SHORT_ID_LEN).collect()
}

/// Container mappings grouped by (protocol, host port).
///
/// Every key keeps all of its mappings in insertion order; the first one is
/// the primary used for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerIndex {
    entries: HashMap<(Protocol, u16), Vec<ContainerPortMapping>>,
}

impl ContainerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mapping under its (protocol, host port) key.
    pub fn insert(&mut self, mapping: ContainerPortMapping) {
        self.entries.entry(mapping.key()).or_default().push(mapping);
    }

    /// Mappings published on a key, primary first.
    pub fn get(&self, protocol: Protocol, port: u16) -> Option<&[ContainerPortMapping]> {
        self.entries
            .get(&(protocol, port))
            .map(Vec::as_slice)
            .filter(|m| !m.is_empty())
    }

    /// Number of distinct (protocol, host port) keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of mappings across all keys.
    pub fn mapping_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl FromIterator<ContainerPortMapping> for ContainerIndex {
    fn from_iter<I: IntoIterator<Item = ContainerPortMapping>>(iter: I) -> Self {
        let mut index = ContainerIndex::new();
        for mapping in iter {
            index.insert(mapping);
        }
        index
    }
}

#[cfg(test)]
pub(crate) fn mapping(name: &str, protocol: Protocol, host_port: u16, container_port: u16) -> ContainerPortMapping {
    ContainerPortMapping {
        container_id: format!("{}-id", name),
        container_name: name.to_string(),
        image: format!("{}:latest", name),
        host_ip: "0.0.0.0".to_string(),
        host_port,
        container_port,
        protocol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_preserves_insertion_order() {
        let index: ContainerIndex = vec![
            mapping("web", Protocol::Tcp, 8080, 80),
            mapping("web2", Protocol::Tcp, 8080, 80),
            mapping("dns", Protocol::Udp, 53, 53),
        ]
        .into_iter()
        .collect();

        assert_eq!(index.len(), 2);
        assert_eq!(index.mapping_count(), 3);

        let web = index.get(Protocol::Tcp, 8080).unwrap();
        assert_eq!(web[0].container_name, "web");
        assert_eq!(web[1].container_name, "web2");

        assert!(index.get(Protocol::Udp, 8080).is_none());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("sha256:0123456789abcdef0123"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }
}
