//! Secure tunnel connector
//!
//! Wraps the external tunnel binary that lets a remote cloud browser reach a
//! locally served test page. `connect` spawns the binary and waits for it to
//! report readiness; `disconnect` tears it down by pidfile and is idempotent
//! on an already-closed tunnel.

mod process;

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Child;
use tracing::{debug, info, warn};

use crate::core::{Config, Result, SkylaunchError};

/// Options for establishing a tunnel
#[derive(Debug, Clone)]
pub struct TunnelOptions {
    /// Tunnel binary name or path
    pub binary: PathBuf,
    /// File the tunnel's pid is written to
    pub pidfile: PathBuf,
    /// Identifier the cloud uses to route jobs through this tunnel
    pub tunnel_identifier: String,
    /// Extra connect attempts after the first failure
    pub connect_retries: u32,
    /// How long to wait for readiness per attempt
    pub ready_timeout: Duration,
    /// Log tunnel chatter at debug level
    pub verbose: bool,
    /// Additional arguments passed through to the binary
    pub extra_args: Vec<String>,
}

impl TunnelOptions {
    /// Create options with defaults for the given pidfile and identifier
    pub fn new(pidfile: impl Into<PathBuf>, tunnel_identifier: impl Into<String>) -> Self {
        Self {
            binary: PathBuf::from("sc"),
            pidfile: pidfile.into(),
            tunnel_identifier: tunnel_identifier.into(),
            connect_retries: 0,
            ready_timeout: Duration::from_secs(60),
            verbose: false,
            extra_args: Vec::new(),
        }
    }

    /// Create options from configuration
    pub fn from_config(config: &Config, tunnel_identifier: impl Into<String>) -> Self {
        let id = tunnel_identifier.into();
        Self {
            binary: PathBuf::from(&config.tunnel.binary),
            pidfile: config.tunnel.state_dir.join(format!("{}.pid", id)),
            tunnel_identifier: id,
            connect_retries: config.launch.connect_retries,
            ready_timeout: Duration::from_secs(config.tunnel.ready_timeout_secs),
            verbose: config.launch.verbose,
            extra_args: Vec::new(),
        }
    }

    /// Set the number of extra connect attempts
    pub fn connect_retries(mut self, retries: u32) -> Self {
        self.connect_retries = retries;
        self
    }
}

/// Handle to a live tunnel
///
/// Holds the spawned child so the process dies with us if teardown is
/// skipped. Must not outlive the scope that created it; call
/// [`TunnelHandle::disconnect`] on every exit path.
#[derive(Debug)]
pub struct TunnelHandle {
    pidfile: PathBuf,
    tunnel_identifier: String,
    child: Option<Child>,
}

impl TunnelHandle {
    /// Pidfile identifying this tunnel
    pub fn pidfile(&self) -> &Path {
        &self.pidfile
    }

    /// Identifier the cloud routes through
    pub fn tunnel_identifier(&self) -> &str {
        &self.tunnel_identifier
    }

    /// Tear the tunnel down and wait for the process to exit
    pub async fn disconnect(mut self) -> Result<()> {
        let pidfile = std::mem::take(&mut self.pidfile);
        disconnect(&pidfile)?;

        if let Some(mut child) = self.child.take() {
            // SIGTERM was already sent via the pidfile; reap the child.
            let _ = tokio::time::timeout(Duration::from_secs(5), child.wait()).await;
        }

        Ok(())
    }
}

/// Establish a tunnel, retrying up to `connect_retries` extra times
///
/// Each attempt spawns the binary, writes the child pid to the pidfile, and
/// waits for the readyfile. A failed attempt kills its child before the next
/// one starts.
pub async fn connect(options: TunnelOptions) -> Result<TunnelHandle> {
    let readyfile = process::readyfile_for(&options.pidfile);
    let attempts = options.connect_retries + 1;
    let mut last_err = SkylaunchError::tunnel("Tunnel never attempted");

    for attempt in 1..=attempts {
        // Clear state left over from a previous run.
        let _ = std::fs::remove_file(&readyfile);

        debug!(
            attempt,
            attempts,
            identifier = %options.tunnel_identifier,
            "connecting tunnel"
        );

        let mut child = process::spawn_tunnel(&options, &readyfile)?;
        if let Some(pid) = child.id() {
            process::write_pidfile(&options.pidfile, pid)?;
        }

        match process::wait_for_ready(&mut child, &readyfile, options.ready_timeout).await {
            Ok(()) => {
                info!(identifier = %options.tunnel_identifier, "tunnel established");
                return Ok(TunnelHandle {
                    pidfile: options.pidfile.clone(),
                    tunnel_identifier: options.tunnel_identifier.clone(),
                    child: Some(child),
                });
            }
            Err(e) => {
                warn!(attempt, error = %e, "tunnel connect attempt failed");
                let _ = child.start_kill();
                let _ = child.wait().await;
                let _ = std::fs::remove_file(&options.pidfile);
                last_err = e;
            }
        }
    }

    Err(SkylaunchError::tunnel(format!(
        "Failed to connect tunnel after {} attempts: {}",
        attempts, last_err
    )))
}

/// Tear down the tunnel referenced by a pidfile
///
/// Idempotent: a missing pidfile means the tunnel is already closed.
pub fn disconnect(pidfile: &Path) -> Result<()> {
    match process::read_pidfile(pidfile)? {
        Some(pid) => {
            debug!(pid, pidfile = %pidfile.display(), "disconnecting tunnel");
            process::terminate(pid);
        }
        None => {
            debug!(pidfile = %pidfile.display(), "tunnel already disconnected");
        }
    }

    let _ = std::fs::remove_file(pidfile);
    let _ = std::fs::remove_file(process::readyfile_for(pidfile));
    Ok(())
}
