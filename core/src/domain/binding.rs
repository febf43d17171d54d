//! OS-observed port bindings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a binding or container mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Sweep order used by the reconciliation engine.
    pub const ALL: [Protocol; 2] = [Protocol::Tcp, Protocol::Udp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    /// Case-insensitive; accepts the `tcp6`/`udp6` spellings some tools emit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TCP" | "TCP4" | "TCP6" => Ok(Protocol::Tcp),
            "UDP" | "UDP4" | "UDP6" => Ok(Protocol::Udp),
            other => Err(format!("unknown protocol: {}", other)),
        }
    }
}

// ============================================================================
// PortBinding
// ============================================================================

/// A single OS-level socket binding.
///
/// Bindings are rebuilt wholesale on every host scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortBinding {
    /// Local port number.
    pub port: u16,
    pub protocol: Protocol,
    /// Connection state as reported by the OS ("LISTEN", "ESTABLISHED", ...).
    pub state: String,
    /// Owning process, when the OS disclosed it.
    pub pid: Option<u32>,
    /// Best-effort process name; "PID <n>" when the lookup failed.
    pub process_name: String,
    /// Local endpoint, e.g. "0.0.0.0:22" or "[::1]:8080".
    pub local_address: String,
    /// Remote endpoint, empty for listeners.
    pub remote_address: String,
}

impl PortBinding {
    pub fn new(port: u16, protocol: Protocol, state: impl Into<String>) -> Self {
        Self {
            port,
            protocol,
            state: state.into(),
            pid: None,
            process_name: String::new(),
            local_address: String::new(),
            remote_address: String::new(),
        }
    }

    /// Attach the owning process.
    pub fn with_process(mut self, pid: Option<u32>, name: impl Into<String>) -> Self {
        self.pid = pid.filter(|p| *p > 0);
        self.process_name = name.into();
        self
    }

    /// Attach local and remote endpoints.
    pub fn with_addresses(mut self, local: impl Into<String>, remote: impl Into<String>) -> Self {
        self.local_address = local.into();
        self.remote_address = remote.into();
        self
    }

    /// Deduplication key used by the reconciliation engine.
    pub fn key(&self) -> (Protocol, u16) {
        (self.protocol, self.port)
    }
}

impl std::fmt::Display for PortBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.protocol, self.local_address, self.state)?;
        match self.pid {
            Some(pid) => write!(f, " (PID: {}, Process: {})", pid, self.process_name),
            None => Ok(()),
        }
    }
}

/// Placeholder name for a process whose name could not be resolved.
pub fn pid_placeholder(pid: u32) -> String {
    format!("PID {}", pid)
}
