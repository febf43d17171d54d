//! Parser for Windows `netstat -ano` output.

use tracing::trace;

use crate::domain::{PortBinding, Protocol};

use super::utils::Utils;
use super::UDP_STATE;

/// Parse `netstat -ano` output into bindings.
///
/// Example output:
/// ```text
/// Active Connections
///
///   Proto  Local Address          Foreign Address        State           PID
///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
///   TCP    [::]:445               [::]:0                 LISTENING       4
///   UDP    0.0.0.0:5353           *:*                                    4321
/// ```
///
/// Process names are not part of this output; they are left empty for the
/// caller to resolve from the PID.
pub fn parse_netstat_output(output: &str) -> Vec<PortBinding> {
    let mut bindings = Vec::new();

    for line in output.lines() {
        let line = line.trim();

        let protocol = if line.starts_with("TCP") {
            Protocol::Tcp
        } else if line.starts_with("UDP") {
            Protocol::Udp
        } else {
            continue;
        };

        let parts: Vec<&str> = line.split_whitespace().collect();

        // TCP: Proto, Local, Foreign, State, PID
        // UDP: Proto, Local, Foreign, PID
        let (state, pid_field) = match protocol {
            Protocol::Tcp if parts.len() >= 5 => (normalize_state(parts[3]), parts[4]),
            Protocol::Udp if parts.len() >= 4 => (UDP_STATE.to_string(), parts[parts.len() - 1]),
            _ => {
                trace!(line, "Skipping short netstat line");
                continue;
            }
        };

        let local = parts[1];
        let Some(port) = Utils::port_of(local) else {
            trace!(line, "Skipping netstat line without local port");
            continue;
        };

        let pid = pid_field.parse::<u32>().ok();

        bindings.push(
            PortBinding::new(port, protocol, state)
                .with_process(pid, "")
                .with_addresses(local, parts[2]),
        );
    }

    bindings
}

fn normalize_state(state: &str) -> String {
    match state {
        "LISTENING" => "LISTEN".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
Active Connections

  Proto  Local Address          Foreign Address        State           PID
  TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
  TCP    [::]:445               [::]:0                 LISTENING       4
  TCP    192.168.1.10:50412     140.82.112.4:443       ESTABLISHED     8812
  UDP    0.0.0.0:5353           *:*                                    4321
  UDP    [::1]:1900             *:*                                    3010
"#;

    #[test]
    fn test_parse_netstat_output() {
        let bindings = parse_netstat_output(SAMPLE);
        assert_eq!(bindings.len(), 5);

        assert_eq!(bindings[0].port, 135);
        assert_eq!(bindings[0].protocol, Protocol::Tcp);
        assert_eq!(bindings[0].state, "LISTEN");
        assert_eq!(bindings[0].pid, Some(1020));
        assert_eq!(bindings[0].local_address, "0.0.0.0:135");

        assert_eq!(bindings[1].port, 445);
        assert_eq!(bindings[2].state, "ESTABLISHED");
        assert_eq!(bindings[2].remote_address, "140.82.112.4:443");

        assert_eq!(bindings[3].protocol, Protocol::Udp);
        assert_eq!(bindings[3].port, 5353);
        assert_eq!(bindings[3].state, "LISTEN");
        assert_eq!(bindings[3].pid, Some(4321));
        assert_eq!(bindings[4].port, 1900);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let output = "  TCP    0.0.0.0:135\n  TCP    garbage   0.0.0.0:0   LISTENING   1\n  UDP    0.0.0.0:53   *:*   77\n";
        let bindings = parse_netstat_output(output);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].port, 53);
    }

    #[test]
    fn test_system_idle_pid_is_dropped() {
        let output = "  TCP    0.0.0.0:80    0.0.0.0:0    LISTENING    0\n";
        let bindings = parse_netstat_output(output);
        assert_eq!(bindings[0].pid, None);
    }
}
