//! Runs the server as a child process.
//!
//! The child inherits stdin, stdout and stderr directly, so protocol bytes
//! never pass through this process. On Ctrl-C the child is asked to stop,
//! given a grace period, then killed.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};

use crate::ui::Output;

/// How long a terminated child gets before it is killed.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Exit status when the executable does not exist.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit status when the executable cannot be run.
pub const EXIT_PERMISSION_DENIED: i32 = 126;
/// Exit status after an interrupt.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Run `executable` with `args` and return the exit status to report.
pub async fn launch(executable: &Path, args: &[String], output: &Output) -> Result<i32> {
    ensure_executable(executable)
        .with_context(|| format!("Failed to mark {} executable", executable.display()))?;

    tracing::debug!(path = %executable.display(), ?args, "spawning server");
    let spawned = Command::new(executable)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            output.error(&format!("Binary not found at {}", executable.display()));
            return Ok(EXIT_NOT_FOUND);
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            output.error(&format!(
                "Permission denied executing {}",
                executable.display()
            ));
            return Ok(EXIT_PERMISSION_DENIED);
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to execute {}", executable.display()));
        }
    };

    tokio::select! {
        status = child.wait() => {
            let status = status.context("Failed to wait for server process")?;
            Ok(exit_code(status))
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, stopping server");
            shutdown(&mut child).await;
            Ok(EXIT_INTERRUPTED)
        }
    }
}

/// Ask the child to exit, then force it after [`GRACE_PERIOD`].
async fn shutdown(child: &mut Child) {
    terminate(child);

    match tokio::time::timeout(GRACE_PERIOD, child.wait()).await {
        Ok(Ok(status)) => tracing::debug!(%status, "server exited"),
        Ok(Err(e)) => tracing::warn!(error = %e, "failed to wait for server"),
        Err(_) => {
            tracing::warn!("server did not exit in time, killing");
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill server");
            }
        }
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn terminate(child: &Child) {
    let Some(pid) = child.id().and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions; pid belongs to a
    // child we have not yet reaped.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        tracing::warn!(error = %io::Error::last_os_error(), "failed to signal server");
    }
}

#[cfg(not(unix))]
fn terminate(_child: &Child) {
    // No SIGTERM equivalent; the grace period still lets a console
    // Ctrl-C reach the child first.
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => {
            let mut perms = meta.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(path, perms)
        }
        // Reported by spawn with its own exit status.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Exit status to propagate for a finished child.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn script(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("server.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_launch_propagates_exit_code() {
        let dir = tempdir().unwrap();
        let path = script(dir.path(), "exit 7");

        let code = launch(&path, &[], &Output::quiet()).await.unwrap();

        assert_eq!(code, 7);
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn test_launch_passes_arguments() {
        let dir = tempdir().unwrap();
        let path = script(dir.path(), r#"[ "$1" = "--port=1" ] && [ "$2" = "x" ]"#);

        let args = vec!["--port=1".to_string(), "x".to_string()];
        assert_eq!(launch(&path, &args, &Output::quiet()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_launch_missing_binary() {
        let dir = tempdir().unwrap();
        let code = launch(&dir.path().join("absent"), &[], &Output::quiet())
            .await
            .unwrap();
        assert_eq!(code, EXIT_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_shutdown_terminates_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        shutdown(&mut child).await;
        let status = child.try_wait().unwrap().expect("child reaped");
        assert_eq!(exit_code(status), 128 + libc::SIGTERM);
    }
}
