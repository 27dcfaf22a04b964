//! HTTP client for the cloud REST API
//!
//! Async reqwest client that maps a [`LaunchConfig`] onto the cloud's
//! capability fields, submits jobs, and polls their status.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::cloud::{JobBackend, JobId, JobStatus};
use crate::core::{Config, LaunchConfig, LaunchResult, Result, SkylaunchError};

/// Cloud REST API client
#[derive(Clone)]
pub struct CloudClient {
    client: Client,
    base_url: String,
    user: Option<String>,
    access_key: Option<String>,
}

/// Job submission request
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    url: &'a str,
    capabilities: Capabilities<'a>,
}

/// Platform/browser selectors understood by the cloud
#[derive(Debug, Serialize)]
struct Capabilities<'a> {
    #[serde(rename = "platformName", skip_serializing_if = "Option::is_none")]
    platform_name: Option<&'a str>,
    #[serde(rename = "platformVersion", skip_serializing_if = "Option::is_none")]
    platform_version: Option<&'a str>,
    #[serde(rename = "browserName", skip_serializing_if = "Option::is_none")]
    browser_name: Option<&'a str>,
    #[serde(rename = "deviceName", skip_serializing_if = "Option::is_none")]
    device_name: Option<&'a str>,
    #[serde(rename = "deviceOrientation", skip_serializing_if = "Option::is_none")]
    device_orientation: Option<String>,
    #[serde(rename = "tunnelIdentifier", skip_serializing_if = "Option::is_none")]
    tunnel_identifier: Option<&'a str>,
}

/// Job submission response
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

/// Job status response
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    result: Option<LaunchResult>,
    #[serde(default)]
    error: Option<String>,
}

impl CloudClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.cloud.request_timeout_secs))
            .build()
            .map_err(|e| SkylaunchError::cloud(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.cloud_url(),
            user: config.cloud.user.clone(),
            access_key: config.cloud.access_key.clone(),
        })
    }

    /// Create a client with a custom base URL and no credentials
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SkylaunchError::cloud(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            user: None,
            access_key: None,
        })
    }

    fn capabilities<'a>(config: &'a LaunchConfig) -> Capabilities<'a> {
        Capabilities {
            platform_name: config.platform_name.as_deref(),
            platform_version: config.platform_version.as_deref(),
            browser_name: config.browser_name.as_deref(),
            device_name: config.device_name.as_deref(),
            device_orientation: config.device_orientation.map(|o| o.to_string()),
            tunnel_identifier: config.tunnel_identifier.as_deref(),
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.user, &self.access_key) {
            (Some(user), Some(key)) => builder.basic_auth(user, Some(key)),
            _ => builder,
        }
    }
}

#[async_trait]
impl JobBackend for CloudClient {
    async fn submit(&self, config: &LaunchConfig) -> Result<JobId> {
        config.validate()?;

        let request = SubmitRequest {
            url: &config.url,
            capabilities: Self::capabilities(config),
        };

        debug!(url = %config.url, "submitting job to {}", self.base_url);

        let response = self
            .request(self.client.post(format!("{}/jobs", self.base_url)))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SkylaunchError::cloud(format!(
                        "Cannot connect to cloud at {}. Is the tunnel up?",
                        self.base_url
                    ))
                } else {
                    SkylaunchError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SkylaunchError::cloud(format!(
                "Job submission failed ({}): {}",
                status, error_text
            )));
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SkylaunchError::cloud(format!("Failed to parse submit response: {}", e)))?;

        debug!(job_id = %submitted.id, "job accepted");
        Ok(JobId(submitted.id))
    }

    async fn status(&self, id: &JobId) -> Result<JobStatus> {
        let response = self
            .request(self.client.get(format!("{}/jobs/{}", self.base_url, id)))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    SkylaunchError::cloud(format!(
                        "Cannot connect to cloud at {}. Is the tunnel up?",
                        self.base_url
                    ))
                } else {
                    SkylaunchError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SkylaunchError::cloud(format!(
                "Status check failed ({}): {}",
                status, error_text
            )));
        }

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| SkylaunchError::cloud(format!("Failed to parse status response: {}", e)))?;

        match status.status.as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "complete" => {
                let result = status.result.ok_or_else(|| {
                    SkylaunchError::MalformedResult("complete job without result body".to_string())
                })?;
                result.validate()?;
                Ok(JobStatus::Complete(result))
            }
            "error" => Ok(JobStatus::Failed(
                status.error.unwrap_or_else(|| "unknown cloud error".to_string()),
            )),
            other => Err(SkylaunchError::cloud(format!(
                "Unknown job status '{}'",
                other
            ))),
        }
    }

    fn is_connection_error(&self, err: &SkylaunchError) -> bool {
        match err {
            SkylaunchError::Http(e) => e.is_connect() || e.is_timeout(),
            SkylaunchError::Cloud(msg) => msg.starts_with("Cannot connect"),
            _ => false,
        }
    }

    fn name(&self) -> &str {
        "cloud"
    }
}
