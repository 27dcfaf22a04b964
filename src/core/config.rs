//! Configuration management for Skylaunch
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/skylaunch/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{Result, SkylaunchError};

/// Main configuration for Skylaunch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cloud API configuration
    pub cloud: CloudConfig,
    /// Tunnel binary configuration
    pub tunnel: TunnelConfig,
    /// Launch defaults
    #[serde(default)]
    pub launch: LaunchDefaults,
}

/// Remote testing cloud configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Host address of the cloud REST API (default: localhost)
    pub host: String,
    /// Port number (default: 4444)
    pub port: u16,
    /// Account user name
    pub user: Option<String>,
    /// Account access key
    pub access_key: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Secure tunnel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfig {
    /// Tunnel binary name or path (default: sc)
    pub binary: String,
    /// How long to wait for the readyfile before a connect attempt fails, in seconds
    pub ready_timeout_secs: u64,
    /// Directory for pidfiles and readyfiles (default: system temp dir)
    pub state_dir: PathBuf,
}

/// Defaults applied to launches that do not override them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchDefaults {
    /// Seconds to wait for the remote job to complete
    /// Default: 300
    pub timeout_secs: u64,
    /// Extra submission attempts on connection failure
    /// Default: 2
    pub connect_retries: u32,
    /// Milliseconds between job status polls
    /// Default: 2000
    pub poll_interval_ms: u64,
    /// Whether to log tunnel and cloud chatter at debug level
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cloud: CloudConfig::default(),
            tunnel: TunnelConfig::default(),
            launch: LaunchDefaults::default(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            host: env::var("SKYLAUNCH_CLOUD_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("SKYLAUNCH_CLOUD_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4444),
            user: env::var("SKYLAUNCH_USER").ok(),
            access_key: env::var("SKYLAUNCH_ACCESS_KEY").ok(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            binary: env::var("SKYLAUNCH_TUNNEL_BINARY").unwrap_or_else(|_| "sc".to_string()),
            ready_timeout_secs: 60,
            state_dir: env::var("SKYLAUNCH_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
        }
    }
}

impl Default for LaunchDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            connect_retries: 2,
            poll_interval_ms: 2000,
            verbose: env::var("SKYLAUNCH_VERBOSE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skylaunch")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(SkylaunchError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| SkylaunchError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SkylaunchError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| SkylaunchError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SkylaunchError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| SkylaunchError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get the full cloud API base URL
    pub fn cloud_url(&self) -> String {
        format!("http://{}:{}", self.cloud.host, self.cloud.port)
    }
}
