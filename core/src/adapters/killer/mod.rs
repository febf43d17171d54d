//! Process termination.
//!
//! Graceful request first (SIGTERM, or `taskkill` without `/F`), then a
//! bounded wait, then a forceful kill if the process is still alive.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use self::unix as platform;
#[cfg(windows)]
use self::windows as platform;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::context::ScanContext;
use crate::error::{ActionError, ActionResult};
use crate::ports::ProcessKillerPort;

/// Interval between liveness checks during the grace period.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) fn target(pid: u32) -> String {
    format!("process {}", pid)
}

/// Terminates processes with graceful-then-forceful escalation.
#[derive(Debug, Clone)]
pub struct ProcessKiller {
    grace_period: Duration,
    command_timeout: Duration,
}

impl ProcessKiller {
    pub fn new(grace_period: Duration, command_timeout: Duration) -> Self {
        Self {
            grace_period,
            command_timeout,
        }
    }

    pub fn from_context(ctx: &Arc<ScanContext>) -> Self {
        Self::new(ctx.kill_grace_period(), ctx.command_timeout())
    }

    /// Wait until the process exits or the grace period runs out.
    async fn wait_for_exit(&self, pid: u32) -> bool {
        let deadline = Instant::now() + self.grace_period;
        loop {
            if !platform::is_running(pid) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

impl ProcessKillerPort for ProcessKiller {
    async fn terminate(&self, pid: u32) -> ActionResult<()> {
        if pid == 0 {
            return Err(ActionError::failed(target(pid), "invalid PID"));
        }

        debug!(pid, "Requesting graceful termination");
        if let Err(e) = platform::request_exit(pid, self.command_timeout).await {
            warn!(pid, error = %e, "Graceful termination request failed");
            return Err(e);
        }

        if self.wait_for_exit(pid).await {
            debug!(pid, "Process exited within grace period");
            return Ok(());
        }

        debug!(pid, grace_ms = self.grace_period.as_millis() as u64, "Process still running, forcing");
        match platform::force_exit(pid, self.command_timeout).await {
            Ok(()) => Ok(()),
            // Exited between the last check and the forced kill.
            Err(ActionError::NotFound { .. }) => Ok(()),
            Err(e) => {
                warn!(pid, error = %e, "Forced termination failed");
                Err(e)
            }
        }
    }

    fn is_running(&self, pid: u32) -> bool {
        pid != 0 && platform::is_running(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn killer() -> ProcessKiller {
        ProcessKiller::new(Duration::from_millis(500), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_terminate_missing_process_is_not_found() {
        let result = killer().terminate(i32::MAX as u32).await;
        assert!(matches!(result, Err(ActionError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_terminate_pid_zero_is_rejected() {
        let result = killer().terminate(0).await;
        assert!(matches!(result, Err(ActionError::Failed { .. })));
    }

    #[test]
    fn test_own_process_is_running() {
        assert!(killer().is_running(std::process::id()));
        assert!(!killer().is_running(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_child_process() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();

        let reaper = tokio::spawn(async move { child.wait().await });

        tokio_test::assert_ok!(killer().terminate(pid).await);
        let status = reaper.await.unwrap().unwrap();
        assert!(!status.success());
    }
}
