//! Fallback host backend: the platform's command-line socket tool.

use std::time::Duration;

use tracing::debug;

use crate::adapters::command;
use crate::context::ProcessNames;
use crate::domain::PortBinding;
use crate::error::{Error, Result};

use super::HostBackend;

/// Which tool to run and how to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketTool {
    /// Windows `netstat -ano`.
    Netstat,
    /// Linux `ss -Htuanp`.
    Ss,
    /// Other POSIX systems, `lsof -nP -i`.
    Lsof,
}

impl SocketTool {
    /// Tool for the platform this binary was built for.
    pub fn for_platform() -> Self {
        if cfg!(windows) {
            SocketTool::Netstat
        } else if cfg!(target_os = "linux") {
            SocketTool::Ss
        } else {
            SocketTool::Lsof
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            SocketTool::Netstat => "netstat",
            SocketTool::Ss => "ss",
            SocketTool::Lsof => "lsof",
        }
    }

    /// Well-known install locations checked before `PATH`.
    fn known_paths(&self) -> &'static [&'static str] {
        match self {
            SocketTool::Netstat => &[],
            SocketTool::Ss => &["/usr/bin/ss", "/bin/ss", "/usr/sbin/ss", "/sbin/ss"],
            SocketTool::Lsof => &["/usr/sbin/lsof", "/usr/bin/lsof"],
        }
    }

    pub fn args(&self) -> &'static [&'static str] {
        match self {
            SocketTool::Netstat => &["-ano"],
            SocketTool::Ss => &["-Htuanp"],
            SocketTool::Lsof => &["-nP", "-i"],
        }
    }

    pub fn parse(&self, output: &str) -> Vec<PortBinding> {
        match self {
            SocketTool::Netstat => super::netstat::parse_netstat_output(output),
            SocketTool::Ss => super::ss::parse_ss_output(output),
            SocketTool::Lsof => super::lsof::parse_lsof_output(output),
        }
    }
}

/// Runs the platform tool and parses its text output.
pub struct CommandLineScanner {
    tool: SocketTool,
    names: ProcessNames,
    timeout: Duration,
}

impl CommandLineScanner {
    pub fn new(tool: SocketTool, names: ProcessNames, timeout: Duration) -> Self {
        Self {
            tool,
            names,
            timeout,
        }
    }

}

impl HostBackend for CommandLineScanner {
    fn name(&self) -> &'static str {
        self.tool.program()
    }

    async fn scan(&self) -> Result<Vec<PortBinding>> {
        let program = command::find_executable(self.tool.program(), self.tool.known_paths())
            .ok_or_else(|| {
                Error::CommandFailed(format!("{} not found", self.tool.program()))
            })?;

        let stdout = command::run_stdout(&program, self.tool.args(), self.timeout).await?;
        let mut bindings = self.tool.parse(&stdout);
        debug!(tool = self.tool.program(), count = bindings.len(), "Parsed socket tool output");

        let names = self.names.clone();
        bindings = tokio::task::spawn_blocking(move || {
            names.fill(&mut bindings);
            bindings
        })
        .await
        .map_err(|e| Error::CommandFailed(format!("Name lookup task failed: {}", e)))?;

        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_tool() {
        let tool = SocketTool::for_platform();
        #[cfg(target_os = "linux")]
        assert_eq!(tool, SocketTool::Ss);
        #[cfg(target_os = "macos")]
        assert_eq!(tool, SocketTool::Lsof);
        #[cfg(windows)]
        assert_eq!(tool, SocketTool::Netstat);
        assert!(!tool.args().is_empty());
    }

    #[test]
    fn test_parse_dispatch() {
        let ss = "tcp LISTEN 0 128 0.0.0.0:22 0.0.0.0:* users:((\"sshd\",pid=1,fd=3))\n";
        assert_eq!(SocketTool::Ss.parse(ss)[0].port, 22);

        let netstat = "  TCP    0.0.0.0:135    0.0.0.0:0    LISTENING    1020\n";
        assert_eq!(SocketTool::Netstat.parse(netstat)[0].port, 135);

        assert!(SocketTool::Lsof.parse(ss).is_empty());
    }
}
