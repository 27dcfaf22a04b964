//! Skylaunch - Remote Cross-Browser Test Launcher
//!
//! Runs a browser-side (QUnit) test page in a remote testing cloud,
//! optionally through a secure tunnel, and reports pass/fail counts.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Cloud**: Cloud backend abstraction with the REST implementation
//! - **Tunnel**: Secure tunnel connector (connect/disconnect by pidfile)
//! - **Launcher**: Orchestration - tunnel, submit, poll, teardown
//! - **Server**: Local HTTP server for the QUnit fixture page
//!
//! # Usage
//!
//! ```rust,no_run
//! use skylaunch::{launch, LaunchConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = LaunchConfig::new("http://localhost:7000").connect_retries(2);
//!     let result = launch(config).await.unwrap();
//!     println!("passed: {}", result.body.passed);
//! }
//! ```

pub mod cloud;
pub mod core;
pub mod launcher;
pub mod server;
pub mod tunnel;

// Re-export commonly used items
pub use core::{Config, LaunchConfig, LaunchResult, Result, SkylaunchError};
pub use launcher::{launch, Launcher};
pub use tunnel::{connect, disconnect, TunnelHandle, TunnelOptions};
