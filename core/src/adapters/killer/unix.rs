//! Signal delivery through `nix`.

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::error::{ActionError, ActionResult};

use super::target;

fn to_pid(pid: u32) -> ActionResult<Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .map(Pid::from_raw)
        .ok_or_else(|| ActionError::failed(target(pid), "invalid PID"))
}

fn send(pid: u32, signal: Signal) -> ActionResult<()> {
    kill(to_pid(pid)?, signal).map_err(|errno| match errno {
        Errno::ESRCH => ActionError::not_found(target(pid)),
        Errno::EPERM => ActionError::permission_denied(target(pid)),
        other => ActionError::failed(target(pid), other.desc()),
    })
}

pub(super) async fn request_exit(pid: u32, _timeout: Duration) -> ActionResult<()> {
    send(pid, Signal::SIGTERM)
}

pub(super) async fn force_exit(pid: u32, _timeout: Duration) -> ActionResult<()> {
    send(pid, Signal::SIGKILL)
}

/// Signal 0 check. EPERM still means the process exists.
pub(super) fn is_running(pid: u32) -> bool {
    let Ok(raw) = to_pid(pid) else {
        return false;
    };
    match kill(raw, None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}
