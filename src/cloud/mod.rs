//! Cloud backend abstraction
//!
//! Separates the launcher's orchestration logic from the concrete REST API,
//! so tests can drive the launcher against a fake backend.

pub mod client;

use async_trait::async_trait;

use crate::core::{LaunchConfig, LaunchResult, Result};

pub use client::CloudClient;

/// Identifier of a submitted remote job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observed state of a remote job
#[derive(Debug, Clone)]
pub enum JobStatus {
    /// Waiting for a browser slot
    Queued,
    /// Browser is executing the test page
    Running,
    /// Job finished and reported a result
    Complete(LaunchResult),
    /// Job failed on the cloud side
    Failed(String),
}

/// A remote browser-job backend
///
/// `submit` must surface connection failures distinctly (via
/// [`JobBackend::is_connection_error`]) so the launcher can apply its
/// `connect_retries` policy to them and nothing else.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Submit a job for the given launch configuration
    async fn submit(&self, config: &LaunchConfig) -> Result<JobId>;

    /// Fetch the current status of a job
    async fn status(&self, id: &JobId) -> Result<JobStatus>;

    /// Whether an error from this backend is a connection failure
    fn is_connection_error(&self, err: &crate::core::SkylaunchError) -> bool;

    /// Backend name for diagnostics
    fn name(&self) -> &str;
}
