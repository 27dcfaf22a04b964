//! Shared types used across Skylaunch modules
//!
//! Contains the launch configuration, the cloud result shape, and common
//! data types.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SkylaunchError};

/// Configuration for a single remote launch
///
/// Platform selectors are optional; when none are given the cloud picks its
/// default desktop browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// URL of the test page to run
    pub url: String,
    /// Extra submission attempts on connection failure
    #[serde(default)]
    pub connect_retries: u32,
    /// Seconds to wait for the remote job to complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Platform name (e.g. "Windows", "Android")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,
    /// Platform version (e.g. "10", "5.1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    /// Browser name (e.g. "Browser", "chrome")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_name: Option<String>,
    /// Device name for mobile emulation (e.g. "Android Emulator")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Device orientation for mobile emulation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_orientation: Option<DeviceOrientation>,
    /// Route the remote browser through the tunnel with this identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_identifier: Option<String>,
    /// Whether the launcher should establish its own tunnel
    /// Default: true
    #[serde(default = "default_connect")]
    pub connect: bool,
}

fn default_connect() -> bool {
    true
}

impl LaunchConfig {
    /// Create a launch configuration for a URL with defaults
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_retries: 0,
            timeout: None,
            platform_name: None,
            platform_version: None,
            browser_name: None,
            device_name: None,
            device_orientation: None,
            tunnel_identifier: None,
            connect: true,
        }
    }

    /// Set the number of submission retries on connection failure
    pub fn connect_retries(mut self, retries: u32) -> Self {
        self.connect_retries = retries;
        self
    }

    /// Set the completion timeout in seconds
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Select a desktop platform (e.g. "Windows" / "10")
    pub fn platform(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.platform_name = Some(name.into());
        self.platform_version = Some(version.into());
        self
    }

    /// Select a mobile device (e.g. "Android Emulator" in portrait)
    pub fn device(
        mut self,
        name: impl Into<String>,
        orientation: DeviceOrientation,
    ) -> Self {
        self.device_name = Some(name.into());
        self.device_orientation = Some(orientation);
        self
    }

    /// Set the browser name
    pub fn browser(mut self, name: impl Into<String>) -> Self {
        self.browser_name = Some(name.into());
        self
    }

    /// Use an externally managed tunnel with this identifier
    pub fn tunnel_identifier(mut self, id: impl Into<String>) -> Self {
        self.tunnel_identifier = Some(id.into());
        self.connect = false;
        self
    }

    /// Validate the config before submission
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.url)
            .map_err(|e| SkylaunchError::config(format!("Invalid url '{}': {}", self.url, e)))?;
        Ok(())
    }
}

/// Orientation of an emulated mobile device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceOrientation {
    Portrait,
    Landscape,
}

impl std::fmt::Display for DeviceOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceOrientation::Portrait => write!(f, "portrait"),
            DeviceOrientation::Landscape => write!(f, "landscape"),
        }
    }
}

/// Final result of a remote launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchResult {
    /// Result body as reported by the cloud
    pub body: ResultBody,
}

/// Body of a launch result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultBody {
    /// Whether the cloud marked the job as passed
    pub passed: bool,
    /// Custom data reported by the test page
    #[serde(rename = "custom-data")]
    pub custom_data: CustomData,
}

/// Custom result data scraped from the test page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomData {
    /// QUnit run totals
    pub qunit: QUnitCounts,
}

/// Pass/fail counts reported by a QUnit run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QUnitCounts {
    /// Number of failed assertions
    pub failed: u32,
    /// Number of passed assertions
    pub passed: u32,
    /// Total assertions, always failed + passed
    pub total: u32,
}

impl LaunchResult {
    /// Check the count invariant the cloud is supposed to uphold
    pub fn validate(&self) -> Result<()> {
        let q = &self.body.custom_data.qunit;
        if q.total != q.failed + q.passed {
            return Err(SkylaunchError::MalformedResult(format!(
                "qunit totals do not add up: failed={} passed={} total={}",
                q.failed, q.passed, q.total
            )));
        }
        Ok(())
    }
}
