//! Tunnel process plumbing
//!
//! Spawning the tunnel binary, pidfile bookkeeping, readiness detection,
//! and termination.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::core::{Result, SkylaunchError};
use crate::tunnel::TunnelOptions;

/// Readyfile the tunnel binary touches once the relay is established
pub(crate) fn readyfile_for(pidfile: &Path) -> PathBuf {
    pidfile.with_extension("ready")
}

/// Spawn the tunnel binary
pub(crate) fn spawn_tunnel(options: &TunnelOptions, readyfile: &Path) -> Result<Child> {
    let mut cmd = Command::new(&options.binary);
    cmd.arg("--tunnel-identifier")
        .arg(&options.tunnel_identifier)
        .arg("--readyfile")
        .arg(readyfile);

    if options.verbose {
        cmd.arg("--verbose");
    }

    cmd.args(&options.extra_args);
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);

    cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SkylaunchError::TunnelBinaryNotFound(options.binary.display().to_string())
        } else {
            SkylaunchError::tunnel(format!("Failed to spawn tunnel binary: {}", e))
        }
    })
}

/// Write the child pid to the pidfile
pub(crate) fn write_pidfile(path: &Path, pid: u32) -> Result<()> {
    std::fs::write(path, format!("{}\n", pid))
        .map_err(|e| SkylaunchError::tunnel(format!("Failed to write pidfile: {}", e)))
}

/// Read a pid back from the pidfile, if the file exists
pub(crate) fn read_pidfile(path: &Path) -> Result<Option<i32>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| SkylaunchError::tunnel(format!("Failed to read pidfile: {}", e)))?;

    let pid = content
        .trim()
        .parse::<i32>()
        .map_err(|_| SkylaunchError::tunnel(format!("Invalid pidfile contents: {:?}", content)))?;

    Ok(Some(pid))
}

/// Send SIGTERM to a pid. A vanished process is not an error.
#[cfg(unix)]
pub(crate) fn terminate(pid: i32) {
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        debug!(pid, "tunnel process already gone");
    }
}

#[cfg(not(unix))]
pub(crate) fn terminate(pid: i32) {
    tracing::warn!(pid, "pid-based tunnel teardown is not supported on this platform");
}

/// Wait until the readyfile appears, or fail when the deadline passes or the
/// child exits early.
pub(crate) async fn wait_for_ready(
    child: &mut Child,
    readyfile: &Path,
    timeout: Duration,
) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if readyfile.exists() {
            debug!(readyfile = %readyfile.display(), "tunnel ready");
            return Ok(());
        }

        if let Some(status) = child.try_wait()? {
            return Err(SkylaunchError::tunnel(format!(
                "Tunnel process exited before becoming ready ({})",
                status
            )));
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(SkylaunchError::tunnel(
                "Tunnel did not become ready in time",
            ));
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readyfile_path() {
        let pidfile = PathBuf::from("/tmp/sky/tunnel.pid");
        assert_eq!(readyfile_for(&pidfile), PathBuf::from("/tmp/sky/tunnel.ready"));
    }

    #[test]
    fn test_pidfile_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnel.pid");

        write_pidfile(&path, 12345).unwrap();
        assert_eq!(read_pidfile(&path).unwrap(), Some(12345));
    }

    #[test]
    fn test_missing_pidfile_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.pid");
        assert_eq!(read_pidfile(&path).unwrap(), None);
    }

    #[test]
    fn test_garbage_pidfile_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnel.pid");
        std::fs::write(&path, "not-a-pid").unwrap();
        assert!(read_pidfile(&path).is_err());
    }
}
