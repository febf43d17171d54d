//! Parser for `docker ps --format "{{json .}}"` output.

use serde::Deserialize;
use tracing::trace;

use crate::adapters::host::Utils;
use crate::domain::{short_id, ContainerPortMapping, Protocol};

/// The fields of one `docker ps` JSON line that matter here.
#[derive(Debug, Default, Deserialize)]
struct PsLine {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Names", default)]
    names: String,
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Ports", default)]
    ports: String,
}

/// Parse `docker ps` JSON-lines output into mappings, in output order.
///
/// Each line is parsed on its own; a bad line or a bad port clause is
/// skipped without affecting the rest.
///
/// ```text
/// {"ID":"4f2a9c1e8b7d","Image":"nginx:latest","Names":"web","Ports":"0.0.0.0:8080->80/tcp, :::8080->80/tcp"}
/// ```
pub fn parse_ps_output(output: &str) -> Vec<ContainerPortMapping> {
    let mut mappings = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let ps: PsLine = match serde_json::from_str(line) {
            Ok(ps) => ps,
            Err(e) => {
                trace!(error = %e, line, "Skipping unparsable docker ps line");
                continue;
            }
        };

        let container_id = short_id(&ps.id);
        let container_name = ps.names.split(',').next().unwrap_or_default().trim().to_string();

        for clause in ps.ports.split(',') {
            match parse_port_clause(clause) {
                Some((host_ip, host_port, container_port, protocol)) => {
                    mappings.push(ContainerPortMapping {
                        container_id: container_id.clone(),
                        container_name: container_name.clone(),
                        image: ps.image.clone(),
                        host_ip,
                        host_port,
                        container_port,
                        protocol,
                    });
                }
                None => trace!(clause, "Skipping unpublished or malformed port clause"),
            }
        }
    }

    mappings
}

/// Parse `hostIP:hostPort->containerPort/protocol`.
fn parse_port_clause(clause: &str) -> Option<(String, u16, u16, Protocol)> {
    let (host, target) = clause.trim().split_once("->")?;
    let (host_ip, host_port) = Utils::split_endpoint(host)?;
    let (container_port, protocol) = target.split_once('/')?;
    let container_port = container_port.parse::<u16>().ok()?;
    let protocol = protocol.parse::<Protocol>().ok()?;
    Some((host_ip, host_port, container_port, protocol))
}
