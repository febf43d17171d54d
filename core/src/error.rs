//! Error types for the portwatch-core library.

use thiserror::Error;

/// Result type alias for portwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for user-initiated actions (kill, stop, restart).
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Errors that can occur inside scan backends and configuration handling.
///
/// Scan errors never leave the enumerators: they are logged and turned
/// into empty results at the backend boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// A command did not finish within its time budget.
    #[error("Command timed out: {0}")]
    Timeout(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container daemon API error.
    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// OS socket table could not be read.
    #[error("Socket table error: {0}")]
    SocketTable(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Outcome of a failed user-initiated action.
///
/// This is the only error class that is reported to the caller; the
/// `Display` output is the human-readable reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The caller lacks the rights to act on the target.
    #[error("Permission denied for {target} (try running as administrator/root)")]
    PermissionDenied { target: String },

    /// The target process or container no longer exists.
    #[error("{target} no longer exists")]
    NotFound { target: String },

    /// Any other failure.
    #[error("Failed to act on {target}: {reason}")]
    Failed { target: String, reason: String },
}

impl ActionError {
    pub fn permission_denied(target: impl Into<String>) -> Self {
        Self::PermissionDenied {
            target: target.into(),
        }
    }

    pub fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }

    pub fn failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Classify a command-line tool's stderr into an action error.
    pub fn from_stderr(target: impl Into<String>, stderr: &str) -> Self {
        let lower = stderr.to_lowercase();
        if lower.contains("permission denied")
            || lower.contains("operation not permitted")
            || lower.contains("access is denied")
        {
            Self::permission_denied(target)
        } else if lower.contains("no such")
            || lower.contains("not found")
            || lower.contains("not running")
        {
            Self::not_found(target)
        } else {
            Self::failed(target, stderr.trim())
        }
    }

    /// Short category label for status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::PermissionDenied { .. } => "permission denied",
            ActionError::NotFound { .. } => "not found",
            ActionError::Failed { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_display() {
        let err = ActionError::not_found("process 1234");
        assert_eq!(err.to_string(), "process 1234 no longer exists");

        let err = ActionError::failed("container web", "daemon hung");
        assert!(err.to_string().contains("daemon hung"));
    }

    #[test]
    fn test_from_stderr_classification() {
        let err = ActionError::from_stderr("pid 1", "kill: (1) - Operation not permitted");
        assert_eq!(err.kind(), "permission denied");

        let err = ActionError::from_stderr(
            "container abc",
            "Error response from daemon: No such container: abc",
        );
        assert_eq!(err.kind(), "not found");

        let err = ActionError::from_stderr("pid 7", "ERROR: The process \"7\" not found.");
        assert_eq!(err.kind(), "not found");

        let err = ActionError::from_stderr("container abc", "something odd\n");
        assert_eq!(err, ActionError::failed("container abc", "something odd"));
    }
}
