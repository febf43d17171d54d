//! Bounded subprocess execution shared by the command-line backends.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

/// Captured output of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program args...` and capture its output, giving up after `limit`.
///
/// The child is killed when the deadline passes. A non-zero exit status is
/// not an error here; callers decide what it means.
pub async fn run<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    limit: Duration,
) -> Result<CommandOutput> {
    let program = program.as_ref();
    debug!(program = ?program, timeout_ms = limit.as_millis() as u64, "Running command");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::CommandFailed(format!("Failed to run {:?}: {}", program, e)))?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => return Err(Error::Timeout(format!("{:?} after {:?}", program, limit))),
    };

    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run a command and return stdout, treating a non-zero exit as failure.
pub async fn run_stdout<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    limit: Duration,
) -> Result<String> {
    let program = program.as_ref();
    let output = run(program, args, limit).await?;
    if output.success {
        Ok(output.stdout)
    } else {
        Err(Error::CommandFailed(format!(
            "{:?} exited with failure: {}",
            program,
            output.stderr.trim()
        )))
    }
}

/// Finds an executable in the given paths, then on `PATH`.
pub fn find_executable(name: &str, paths: &[&str]) -> Option<PathBuf> {
    if Path::new(name).is_absolute() {
        let path = PathBuf::from(name);
        return path.exists().then_some(path);
    }

    for path in paths {
        let path_buf = PathBuf::from(path);
        if path_buf.exists() {
            return Some(path_buf);
        }
    }

    let exe = if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    };
    std::env::var_os("PATH").and_then(|path| {
        std::env::split_paths(&path)
            .map(|dir| dir.join(&exe))
            .find(|candidate| candidate.is_file())
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let output = run("echo", &["hello"], Duration::from_secs(5)).await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_missing_program_is_error() {
        let result = run("/nonexistent/portwatch-tool", &["x"], Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::CommandFailed(_))));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let result = run("sleep", &["5"], Duration::from_millis(100)).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_run_stdout_rejects_failure() {
        let result = run_stdout("false", &[] as &[&str], Duration::from_secs(5)).await;
        assert!(matches!(result, Err(Error::CommandFailed(_))));
    }

    #[test]
    fn test_find_executable() {
        assert!(find_executable("sh", &[]).is_some());
        assert!(find_executable("/bin/sh", &[]).is_some());
        assert!(find_executable("portwatch-no-such-tool", &["/nonexistent/path"]).is_none());
    }
}
