//! Shared scan context.
//!
//! Built once from the configuration and handed to every enumerator. Holds
//! the process-name cache and the container daemon client so neither lives
//! in a global.

use std::sync::Arc;
use std::time::Duration;

use bollard::Docker;
use parking_lot::Mutex;
use sysinfo::{Pid, System};
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::{pid_placeholder, PortBinding};

/// Process-name lookups backed by a reusable `sysinfo` table.
#[derive(Clone)]
pub struct ProcessNames {
    system: Arc<Mutex<System>>,
}

impl ProcessNames {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }

    /// Fill empty process names for bindings that carry a PID.
    ///
    /// Blocking; call from `spawn_blocking`. Unresolvable PIDs get the
    /// "PID <n>" placeholder.
    pub fn fill(&self, bindings: &mut [PortBinding]) {
        let needs_lookup = bindings
            .iter()
            .any(|b| b.pid.is_some() && b.process_name.is_empty());
        if !needs_lookup {
            return;
        }

        let mut system = self.system.lock();
        system.refresh_processes();

        for binding in bindings.iter_mut() {
            let Some(pid) = binding.pid else { continue };
            if !binding.process_name.is_empty() {
                continue;
            }
            binding.process_name = system
                .process(Pid::from_u32(pid))
                .map(|p| p.name().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| pid_placeholder(pid));
        }
    }
}

impl Default for ProcessNames {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the enumerators and action adapters share.
pub struct ScanContext {
    names: ProcessNames,
    docker: Option<Docker>,
    docker_binary: String,
    probe_timeout: Duration,
    command_timeout: Duration,
    kill_grace_period: Duration,
}

impl ScanContext {
    /// Build the context from configuration.
    ///
    /// The daemon client is only created when the API is enabled. Creating
    /// it does not contact the daemon.
    pub fn new(config: &Config) -> Self {
        let docker = if config.docker_api {
            match Docker::connect_with_local_defaults() {
                Ok(docker) => Some(docker),
                Err(e) => {
                    warn!(error = %e, "Docker API client unavailable");
                    None
                }
            }
        } else {
            debug!("Docker API disabled by configuration");
            None
        };

        Self {
            names: ProcessNames::new(),
            docker,
            docker_binary: config.docker_binary.clone(),
            probe_timeout: config.probe_timeout(),
            command_timeout: config.command_timeout(),
            kill_grace_period: config.kill_grace_period(),
        }
    }

    /// Shared handle, the form the enumerators take.
    pub fn shared(config: &Config) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn names(&self) -> &ProcessNames {
        &self.names
    }

    pub fn docker(&self) -> Option<&Docker> {
        self.docker.as_ref()
    }

    pub fn docker_binary(&self) -> &str {
        &self.docker_binary
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn kill_grace_period(&self) -> Duration {
        self.kill_grace_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;

    #[test]
    fn test_fill_resolves_own_process() {
        let names = ProcessNames::new();
        let mut bindings = vec![
            PortBinding::new(80, Protocol::Tcp, "LISTEN").with_process(Some(std::process::id()), ""),
            PortBinding::new(81, Protocol::Tcp, "LISTEN").with_process(Some(u32::MAX - 1), ""),
            PortBinding::new(82, Protocol::Tcp, "LISTEN").with_process(Some(7), "kept"),
            PortBinding::new(83, Protocol::Udp, "LISTEN"),
        ];

        names.fill(&mut bindings);

        assert!(!bindings[0].process_name.is_empty());
        assert_ne!(bindings[0].process_name, pid_placeholder(std::process::id()));
        assert_eq!(bindings[1].process_name, pid_placeholder(u32::MAX - 1));
        assert_eq!(bindings[2].process_name, "kept");
        assert_eq!(bindings[3].process_name, "");
    }

    #[test]
    fn test_context_without_docker_api() {
        let config = Config {
            docker_api: false,
            docker_binary: "podman".to_string(),
            ..Config::default()
        };
        let ctx = ScanContext::new(&config);
        assert!(ctx.docker().is_none());
        assert_eq!(ctx.docker_binary(), "podman");
        assert_eq!(ctx.probe_timeout(), Duration::from_secs(3));
        assert_eq!(ctx.kill_grace_period(), Duration::from_millis(3000));
    }
}
