//! Remote launch orchestration
//!
//! Ties the pieces together: optionally brings up a tunnel, submits the job
//! to the cloud backend (retrying submission on connection failure), polls
//! until the job completes or the deadline passes, and guarantees tunnel
//! teardown on every exit path.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::cloud::{CloudClient, JobBackend, JobStatus};
use crate::core::{Config, LaunchConfig, LaunchResult, Result, SkylaunchError};
use crate::tunnel::{self, TunnelOptions};

/// Reusable launcher bound to a cloud backend
pub struct Launcher {
    config: Config,
    backend: Arc<dyn JobBackend>,
}

impl Launcher {
    /// Create a launcher from the loaded configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load())
    }

    /// Create a launcher from an explicit configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let backend = Arc::new(CloudClient::from_config(&config)?);
        Ok(Self { config, backend })
    }

    /// Create a launcher with a custom backend
    pub fn with_backend(config: Config, backend: Arc<dyn JobBackend>) -> Self {
        Self { config, backend }
    }

    /// Run a test page remotely and wait for its result
    ///
    /// When `config.connect` is set, a tunnel is established first and torn
    /// down after the job finishes, whether it succeeded or not.
    pub async fn launch(&self, config: LaunchConfig) -> Result<LaunchResult> {
        config.validate()?;

        let mut effective = config.clone();
        let tunnel = if config.connect {
            let id = effective
                .tunnel_identifier
                .clone()
                .unwrap_or_else(generate_tunnel_identifier);
            effective.tunnel_identifier = Some(id.clone());

            let options = TunnelOptions::from_config(&self.config, id)
                .connect_retries(config.connect_retries);
            Some(tunnel::connect(options).await?)
        } else {
            None
        };

        let outcome = self.run_job(&effective).await;

        // Teardown must happen on success and failure alike.
        if let Some(handle) = tunnel {
            if let Err(e) = handle.disconnect().await {
                warn!(error = %e, "tunnel teardown failed");
            }
        }

        outcome
    }

    /// Submit the job and poll it to completion
    async fn run_job(&self, config: &LaunchConfig) -> Result<LaunchResult> {
        let job_id = self.submit_with_retries(config).await?;
        info!(job_id = %job_id, url = %config.url, "job submitted");

        let timeout_secs = config.timeout.unwrap_or(self.config.launch.timeout_secs);
        let poll_interval = Duration::from_millis(self.config.launch.poll_interval_ms);

        let polled = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.poll_until_complete(&job_id, poll_interval),
        )
        .await;

        match polled {
            Ok(result) => result,
            Err(_) => Err(SkylaunchError::Timeout),
        }
    }

    /// Submit, retrying only on connection failures
    async fn submit_with_retries(&self, config: &LaunchConfig) -> Result<crate::cloud::JobId> {
        let attempts = config.connect_retries + 1;
        let mut last_err = SkylaunchError::cloud("Job never submitted");

        for attempt in 1..=attempts {
            match self.backend.submit(config).await {
                Ok(id) => return Ok(id),
                Err(e) if self.backend.is_connection_error(&e) && attempt < attempts => {
                    warn!(attempt, error = %e, "submission failed, retrying");
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err)
    }

    async fn poll_until_complete(
        &self,
        job_id: &crate::cloud::JobId,
        poll_interval: Duration,
    ) -> Result<LaunchResult> {
        loop {
            match self.backend.status(job_id).await? {
                JobStatus::Complete(result) => {
                    debug!(job_id = %job_id, passed = result.body.passed, "job complete");
                    return Ok(result);
                }
                JobStatus::Failed(msg) => {
                    return Err(SkylaunchError::cloud(format!("Job failed: {}", msg)));
                }
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }
}

/// One-shot launch using the loaded configuration
pub async fn launch(config: LaunchConfig) -> Result<LaunchResult> {
    Launcher::new()?.launch(config).await
}

fn generate_tunnel_identifier() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("skylaunch-{}-{}", std::process::id(), ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CustomData, QUnitCounts, ResultBody};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn passing_result() -> LaunchResult {
        LaunchResult {
            body: ResultBody {
                passed: true,
                custom_data: CustomData {
                    qunit: QUnitCounts {
                        failed: 0,
                        passed: 4,
                        total: 4,
                    },
                },
            },
        }
    }

    /// Scripted backend: fails submission N times, then walks a status list.
    struct FakeBackend {
        submit_failures: AtomicU32,
        submits: AtomicU32,
        statuses: Mutex<Vec<JobStatus>>,
    }

    impl FakeBackend {
        fn new(submit_failures: u32, statuses: Vec<JobStatus>) -> Self {
            Self {
                submit_failures: AtomicU32::new(submit_failures),
                submits: AtomicU32::new(0),
                statuses: Mutex::new(statuses),
            }
        }
    }

    #[async_trait]
    impl JobBackend for FakeBackend {
        async fn submit(&self, _config: &LaunchConfig) -> Result<crate::cloud::JobId> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            if self
                .submit_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(SkylaunchError::cloud("Cannot connect to cloud"));
            }
            Ok(crate::cloud::JobId("job-1".to_string()))
        }

        async fn status(&self, _id: &crate::cloud::JobId) -> Result<JobStatus> {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.remove(0))
            } else {
                Ok(statuses[0].clone())
            }
        }

        fn is_connection_error(&self, err: &SkylaunchError) -> bool {
            matches!(err, SkylaunchError::Cloud(msg) if msg.starts_with("Cannot connect"))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.launch.poll_interval_ms = 10;
        config
    }

    fn no_tunnel(url: &str) -> LaunchConfig {
        let mut config = LaunchConfig::new(url);
        config.connect = false;
        config
    }

    #[tokio::test]
    async fn test_launch_reports_passing_result() {
        let backend = Arc::new(FakeBackend::new(
            0,
            vec![
                JobStatus::Queued,
                JobStatus::Running,
                JobStatus::Complete(passing_result()),
            ],
        ));
        let launcher = Launcher::with_backend(fast_config(), backend);

        let result = launcher
            .launch(no_tunnel("http://localhost:7000"))
            .await
            .unwrap();

        assert!(result.body.passed);
        assert_eq!(result.body.custom_data.qunit.passed, 4);
        assert_eq!(result.body.custom_data.qunit.failed, 0);
        assert_eq!(result.body.custom_data.qunit.total, 4);
    }

    #[tokio::test]
    async fn test_small_timeout_yields_timeout_error() {
        // Job stays running forever; a 1 second deadline must trip.
        let backend = Arc::new(FakeBackend::new(0, vec![JobStatus::Running]));
        let launcher = Launcher::with_backend(fast_config(), backend);

        let err = launcher
            .launch(no_tunnel("http://localhost:7000").timeout(1))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Timeout: Element not there");
    }

    #[tokio::test]
    async fn test_submission_retried_on_connection_failure() {
        let backend = Arc::new(FakeBackend::new(
            2,
            vec![JobStatus::Complete(passing_result())],
        ));
        let launcher = Launcher::with_backend(fast_config(), backend.clone());

        let result = launcher
            .launch(no_tunnel("http://localhost:7000").connect_retries(2))
            .await
            .unwrap();

        assert!(result.body.passed);
        assert_eq!(backend.submits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted_propagates_error() {
        let backend = Arc::new(FakeBackend::new(
            5,
            vec![JobStatus::Complete(passing_result())],
        ));
        let launcher = Launcher::with_backend(fast_config(), backend.clone());

        let err = launcher
            .launch(no_tunnel("http://localhost:7000").connect_retries(2))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Cannot connect"));
        assert_eq!(backend.submits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cloud_side_failure_propagates() {
        let backend = Arc::new(FakeBackend::new(
            0,
            vec![JobStatus::Failed("browser crashed".to_string())],
        ));
        let launcher = Launcher::with_backend(fast_config(), backend);

        let err = launcher
            .launch(no_tunnel("http://localhost:7000"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("browser crashed"));
    }

    #[test]
    fn test_generated_tunnel_identifiers_carry_pid() {
        let id = generate_tunnel_identifier();
        assert!(id.starts_with("skylaunch-"));
        assert!(id.contains(&std::process::id().to_string()));
    }
}
