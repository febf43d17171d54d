//! Parser for Linux `ss -Htuanp` output.

use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use crate::domain::{PortBinding, Protocol};

use super::utils::Utils;
use super::UDP_STATE;

fn users_regex() -> &'static Regex {
    static USERS: OnceLock<Regex> = OnceLock::new();
    USERS.get_or_init(|| {
        Regex::new(r#"users:\(\("(.+?)",pid=(\d+),fd=(\d+)\)"#).expect("ss users pattern is valid")
    })
}

/// Parse ss output into bindings.
///
/// Expected ss output format:
/// ```text
/// tcp   LISTEN 0      4096         0.0.0.0:22          0.0.0.0:*     users:(("sshd",pid=100,fd=3))
/// udp   UNCONN 0      0      127.0.0.53%lo:53          0.0.0.0:*     users:(("systemd-resolve",pid=500,fd=13))
/// ```
///
/// The process column is only present for sockets the caller may inspect.
pub fn parse_ss_output(output: &str) -> Vec<PortBinding> {
    let mut bindings = Vec::new();

    for line in output.lines() {
        if line.is_empty() {
            continue;
        }

        // Parse columns: [Netid] [State] [Recv-Q] [Send-Q] [Local] [Peer] [Process]
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 6 {
            trace!(line, "Skipping short ss line");
            continue;
        }

        let Ok(protocol) = components[0].parse::<Protocol>() else {
            continue;
        };

        let Some(port) = Utils::port_of(components[4]) else {
            trace!(line, "Skipping ss line without local port");
            continue;
        };

        let process = components[6..].join(" ");
        let (pid, process_name) = match users_regex().captures(&process) {
            Some(caps) => (caps[2].parse::<u32>().ok(), caps[1].to_string()),
            None => (None, String::new()),
        };

        bindings.push(
            PortBinding::new(port, protocol, normalize_state(protocol, components[1]))
                .with_process(pid, process_name)
                .with_addresses(components[4], components[5]),
        );
    }

    bindings
}

fn normalize_state(protocol: Protocol, state: &str) -> String {
    match (protocol, state) {
        (Protocol::Udp, "UNCONN") => UDP_STATE.to_string(),
        (_, "ESTAB") => "ESTABLISHED".to_string(),
        (_, other) => other.to_string(),
    }
}
