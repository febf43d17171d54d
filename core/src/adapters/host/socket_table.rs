//! Primary host backend: the OS socket table via `netstat2`.

use std::net::SocketAddr;

use netstat2::{
    iterate_sockets_info, AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, SocketInfo,
};
use tracing::{debug, trace};

use crate::context::ProcessNames;
use crate::domain::{PortBinding, Protocol};
use crate::error::{Error, Result};

use super::{HostBackend, UDP_STATE};

fn address_flags() -> AddressFamilyFlags {
    AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6
}

fn protocol_flags() -> ProtocolFlags {
    ProtocolFlags::TCP | ProtocolFlags::UDP
}

/// Reads TCP and UDP sockets for both address families in one pass.
pub struct SocketTableScanner {
    names: ProcessNames,
}

impl SocketTableScanner {
    /// Check the socket table once on the blocking pool; `None` when this
    /// host cannot read it.
    pub async fn detect(names: ProcessNames) -> Option<Self> {
        let readable = tokio::task::spawn_blocking(|| {
            iterate_sockets_info(address_flags(), protocol_flags())
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .await;

        match readable {
            Ok(Ok(())) => Some(Self { names }),
            Ok(Err(e)) => {
                debug!(error = %e, "Socket table unavailable");
                None
            }
            Err(e) => {
                debug!(error = %e, "Socket table check task failed");
                None
            }
        }
    }

    /// Read the table. Blocking.
    pub fn read(&self) -> Result<Vec<PortBinding>> {
        let sockets = iterate_sockets_info(address_flags(), protocol_flags())
            .map_err(|e| Error::SocketTable(e.to_string()))?;

        let mut bindings = Vec::new();
        for socket in sockets {
            match socket {
                Ok(info) => {
                    if let Some(binding) = to_binding(&info) {
                        bindings.push(binding);
                    }
                }
                Err(e) => trace!(error = %e, "Skipping unreadable socket entry"),
            }
        }

        self.names.fill(&mut bindings);
        Ok(bindings)
    }
}

impl HostBackend for SocketTableScanner {
    fn name(&self) -> &'static str {
        "socket table"
    }

    /// Read the table on the blocking pool.
    async fn scan(&self) -> Result<Vec<PortBinding>> {
        let names = self.names.clone();
        tokio::task::spawn_blocking(move || Self { names }.read())
            .await
            .map_err(|e| Error::SocketTable(format!("Socket table task failed: {}", e)))?
    }
}

fn to_binding(info: &SocketInfo) -> Option<PortBinding> {
    let binding = match &info.protocol_socket_info {
        ProtocolSocketInfo::Tcp(tcp) => {
            let remote = if tcp.remote_port == 0 {
                String::new()
            } else {
                SocketAddr::new(tcp.remote_addr, tcp.remote_port).to_string()
            };
            PortBinding::new(tcp.local_port, Protocol::Tcp, tcp.state.to_string()).with_addresses(
                SocketAddr::new(tcp.local_addr, tcp.local_port).to_string(),
                remote,
            )
        }
        ProtocolSocketInfo::Udp(udp) => PortBinding::new(udp.local_port, Protocol::Udp, UDP_STATE)
            .with_addresses(SocketAddr::new(udp.local_addr, udp.local_port).to_string(), ""),
    };

    // Unbound sockets have no local address worth reporting.
    if binding.port == 0 {
        return None;
    }

    Some(binding.with_process(info.associated_pids.first().copied(), ""))
}
