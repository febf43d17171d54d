//! Termination through `taskkill`.

use std::time::Duration;

use sysinfo::{Pid, System};

use crate::adapters::command;
use crate::error::{ActionError, ActionResult};

use super::target;

async fn taskkill(pid: u32, force: bool, timeout: Duration) -> ActionResult<()> {
    let pid_arg = pid.to_string();
    let mut args = vec!["/PID", pid_arg.as_str(), "/T"];
    if force {
        args.push("/F");
    }

    let output = command::run("taskkill", &args, timeout)
        .await
        .map_err(|e| ActionError::failed(target(pid), e.to_string()))?;

    if output.success {
        Ok(())
    } else {
        let message = if output.stderr.trim().is_empty() {
            output.stdout
        } else {
            output.stderr
        };
        Err(ActionError::from_stderr(target(pid), &message))
    }
}

pub(super) async fn request_exit(pid: u32, timeout: Duration) -> ActionResult<()> {
    taskkill(pid, false, timeout).await
}

pub(super) async fn force_exit(pid: u32, timeout: Duration) -> ActionResult<()> {
    taskkill(pid, true, timeout).await
}

pub(super) fn is_running(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_process(Pid::from_u32(pid))
}
