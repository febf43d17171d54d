//! Process killer port (interface).

use crate::error::ActionResult;

/// Port for terminating processes.
///
/// This trait defines the interface for process termination.
/// Implementations handle platform-specific signal handling.
pub trait ProcessKillerPort: Send + Sync {
    /// Terminate a process gracefully, escalating to a forceful kill when it
    /// does not exit within the grace period.
    fn terminate(&self, pid: u32) -> impl std::future::Future<Output = ActionResult<()>> + Send;

    /// Check if a process is still running.
    fn is_running(&self, pid: u32) -> bool;
}
