//! Reconciliation of host bindings with container mappings.
//!
//! Pure, in-memory and infallible: given the latest host bindings, the
//! latest container index and a [`RangeQuery`], [`reconcile`] produces the
//! ordered view (TCP block ascending, then UDP block ascending).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ContainerIndex, ContainerPortMapping, PortBinding, PortViewRecord, Protocol};

/// Default range shown when nothing else is configured.
pub const DEFAULT_RANGE: (u16, u16) = (1, 1024);

/// Lowest port a view may contain.
pub const MIN_PORT: u16 = 1;

/// Range and filter flags for one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    /// First bound; may be greater than `end`.
    pub start: u16,
    /// Second bound; may be less than `start`.
    pub end: u16,
    /// Suppress synthetic-free records.
    #[serde(default)]
    pub only_used: bool,
    /// Keep only records attributed to a container.
    #[serde(default)]
    pub only_container: bool,
}

impl Default for RangeQuery {
    fn default() -> Self {
        Self::new(DEFAULT_RANGE.0, DEFAULT_RANGE.1)
    }
}

impl RangeQuery {
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            start,
            end,
            only_used: false,
            only_container: false,
        }
    }

    pub fn with_only_used(mut self, enabled: bool) -> Self {
        self.only_used = enabled;
        self
    }

    pub fn with_only_container(mut self, enabled: bool) -> Self {
        self.only_container = enabled;
        self
    }

    /// Bounds ordered so that `low <= high`, with port 0 raised to 1.
    pub fn bounds(&self) -> (u16, u16) {
        let start = self.start.max(MIN_PORT);
        let end = self.end.max(MIN_PORT);
        (start.min(end), start.max(end))
    }
}

/// Build the reconciled view for `query`.
pub fn reconcile(
    bindings: &[PortBinding],
    index: &ContainerIndex,
    query: &RangeQuery,
) -> Vec<PortViewRecord> {
    let used = dedupe(bindings);
    let (low, high) = query.bounds();

    let mut records = Vec::new();
    for protocol in Protocol::ALL {
        for port in low..=high {
            match used.get(&(protocol, port)) {
                Some(binding) => records.push(PortViewRecord::bound((*binding).clone())),
                None if !query.only_used => records.push(PortViewRecord::free(port, protocol)),
                None => {}
            }
        }
    }

    enrich(&mut records, index);

    if query.only_container {
        records.retain(PortViewRecord::has_container);
    }
    records
}

/// First binding per (protocol, port); later duplicates are ignored.
fn dedupe(bindings: &[PortBinding]) -> HashMap<(Protocol, u16), &PortBinding> {
    let mut used = HashMap::with_capacity(bindings.len());
    for binding in bindings {
        used.entry(binding.key()).or_insert(binding);
    }
    used
}

/// Attach container attribution to every record that has a mapping.
pub fn enrich(records: &mut [PortViewRecord], index: &ContainerIndex) {
    if index.is_empty() {
        return;
    }
    for record in records.iter_mut() {
        if let Some((primary, rest)) =
            lookup(index, record.protocol(), record.port()).and_then(|m| m.split_first())
        {
            record.attach_container(primary, rest.len());
        }
    }
}

/// Mappings for a key, with UDP falling back to the TCP mapping of the same port.
///
/// Runtimes sometimes report only the TCP half of a dual mapping. This is a
/// heuristic: an unrelated TCP service on the same port number will be
/// attributed to the UDP record too.
pub fn lookup(index: &ContainerIndex, protocol: Protocol, port: u16) -> Option<&[ContainerPortMapping]> {
    index.get(protocol, port).or_else(|| match protocol {
        Protocol::Udp => index.get(Protocol::Tcp, port),
        Protocol::Tcp => None,
    })
}
