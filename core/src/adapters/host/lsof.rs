//! Parser for POSIX `lsof -nP -i` output.

use tracing::trace;

use crate::domain::{PortBinding, Protocol};

use super::utils::Utils;
use super::UDP_STATE;

/// Parse lsof output into bindings.
///
/// Expected lsof output format:
/// ```text
/// COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
/// node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
/// Google    1234  code   20u  IPv4 0x1234567890abcdef      0t0  TCP 192.168.1.5:51234->140.82.1.1:443 (ESTABLISHED)
/// mDNSResp   300 _mdns    8u  IPv4 0xdeadbeefdeadbeef      0t0  UDP *:5353
/// ```
pub fn parse_lsof_output(output: &str) -> Vec<PortBinding> {
    let mut bindings = Vec::new();

    for line in output.lines().skip(1) {
        if line.is_empty() {
            continue;
        }

        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 9 {
            trace!(line, "Skipping short lsof line");
            continue;
        }

        let Ok(protocol) = components[7].parse::<Protocol>() else {
            continue;
        };

        let process_name = components[0].replace("\\x20", " ").replace("\\x2f", "/");
        let pid = components[1].parse::<u32>().ok();

        let (local, remote) = components[8]
            .split_once("->")
            .unwrap_or((components[8], ""));

        let Some(port) = Utils::port_of(local) else {
            trace!(line, "Skipping lsof line without local port");
            continue;
        };

        let state = components
            .get(9)
            .map(|s| s.trim_start_matches('(').trim_end_matches(')').to_string())
            .unwrap_or_else(|| match protocol {
                Protocol::Udp => UDP_STATE.to_string(),
                Protocol::Tcp => String::new(),
            });

        bindings.push(
            PortBinding::new(port, protocol, state)
                .with_process(pid, process_name)
                .with_addresses(local, remote),
        );
    }

    bindings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lsof_output() {
        let output = r#"COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
Google\x20    1234  code   20u  IPv4 0x1234567890abcdef      0t0  TCP 192.168.1.5:51234->140.82.1.1:443 (ESTABLISHED)
mDNSResp   300 _mdns    8u  IPv4 0xdeadbeefdeadbeef      0t0  UDP *:5353
"#;

        let bindings = parse_lsof_output(output);
        assert_eq!(bindings.len(), 3);

        assert_eq!(bindings[0].port, 3000);
        assert_eq!(bindings[0].protocol, Protocol::Tcp);
        assert_eq!(bindings[0].state, "LISTEN");
        assert_eq!(bindings[0].pid, Some(34805));
        assert_eq!(bindings[0].process_name, "node");
        assert_eq!(bindings[0].local_address, "[::1]:3000");

        assert_eq!(bindings[1].port, 51234);
        assert_eq!(bindings[1].state, "ESTABLISHED");
        assert_eq!(bindings[1].remote_address, "140.82.1.1:443");
        assert_eq!(bindings[1].process_name, "Google ");

        assert_eq!(bindings[2].protocol, Protocol::Udp);
        assert_eq!(bindings[2].port, 5353);
        assert_eq!(bindings[2].state, "LISTEN");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let output = "COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME\nshort line\nx 1 u 3u IPv4 0x1 0t0 TCP *:*\nx 1 u 3u unix 0x1 0t0 /tmp/sock x\ny 2 u 4u IPv4 0x2 0t0 UDP *:68\n";
        let bindings = parse_lsof_output(output);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].port, 68);
    }
}
