//! Fallback container backend: the runtime's command-line tool.

use std::time::Duration;

use tracing::debug;

use crate::adapters::command;
use crate::domain::ContainerPortMapping;
use crate::error::{ActionError, ActionResult, Result};

use super::parsers::parse_ps_output;

/// Drives `docker` (or a compatible binary) as a subprocess.
pub struct DockerCli {
    binary: String,
    probe_timeout: Duration,
    command_timeout: Duration,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>, probe_timeout: Duration, command_timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            probe_timeout,
            command_timeout,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Liveness check: `docker version` within the liveness timeout.
    pub async fn is_available(&self) -> bool {
        match command::run(&self.binary, &["version"], self.probe_timeout).await {
            Ok(output) if output.success => true,
            Ok(output) => {
                debug!(binary = %self.binary, stderr = output.stderr.trim(), "Container runtime not responding");
                false
            }
            Err(e) => {
                debug!(binary = %self.binary, error = %e, "Container runtime CLI unavailable");
                false
            }
        }
    }

    /// Published mappings of running containers from `docker ps`.
    pub async fn mappings(&self) -> Result<Vec<ContainerPortMapping>> {
        let stdout = command::run_stdout(
            &self.binary,
            &["ps", "--format", "{{json .}}"],
            self.command_timeout,
        )
        .await?;
        Ok(parse_ps_output(&stdout))
    }

    pub async fn stop(&self, container_id: &str) -> ActionResult<()> {
        self.lifecycle("stop", container_id).await
    }

    pub async fn restart(&self, container_id: &str) -> ActionResult<()> {
        self.lifecycle("restart", container_id).await
    }

    async fn lifecycle(&self, verb: &str, container_id: &str) -> ActionResult<()> {
        let target = format!("container {}", container_id);
        let output = command::run(&self.binary, &[verb, container_id], self.command_timeout)
            .await
            .map_err(|e| ActionError::failed(&target, e.to_string()))?;

        if output.success {
            Ok(())
        } else {
            Err(ActionError::from_stderr(target, &output.stderr))
        }
    }
}
