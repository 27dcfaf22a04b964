//! Skylaunch - Remote Cross-Browser Test Launcher
//!
//! Main entry point for the CLI application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use skylaunch::core::DeviceOrientation;
use skylaunch::server::serve_qunit;
use skylaunch::{Config, LaunchConfig, Launcher};

/// Skylaunch - run a browser test page in the testing cloud
#[derive(Parser, Debug)]
#[command(name = "skylaunch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the test page; omit with --serve-port to use the built-in page
    url: Option<String>,

    /// Serve the built-in QUnit fixture page on this port and launch against it
    #[arg(long)]
    serve_port: Option<u16>,

    /// Platform name (e.g. Windows, Android)
    #[arg(long)]
    platform_name: Option<String>,

    /// Platform version (e.g. 10, 5.1)
    #[arg(long)]
    platform_version: Option<String>,

    /// Browser name
    #[arg(long)]
    browser_name: Option<String>,

    /// Device name for mobile emulation
    #[arg(long)]
    device_name: Option<String>,

    /// Device orientation (portrait or landscape)
    #[arg(long)]
    device_orientation: Option<String>,

    /// Seconds to wait for the remote job to complete
    #[arg(long, short = 't')]
    timeout: Option<u64>,

    /// Extra submission attempts on connection failure
    #[arg(long, short = 'r')]
    connect_retries: Option<u32>,

    /// Use an externally managed tunnel with this identifier
    #[arg(long)]
    tunnel_identifier: Option<String>,

    /// Do not establish a tunnel
    #[arg(long)]
    no_connect: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = Config::load();
    if args.verbose {
        config.launch.verbose = true;
    }

    // Optionally serve the built-in fixture page and launch against it.
    let server = match args.serve_port {
        Some(port) => Some(serve_qunit(port).await?),
        None => None,
    };

    let url = match (&args.url, &server) {
        (Some(url), _) => url.clone(),
        (None, Some(server)) => server.url(),
        (None, None) => anyhow::bail!("Provide a URL or --serve-port"),
    };

    let mut launch = LaunchConfig::new(url);

    if let Some(retries) = args.connect_retries {
        launch = launch.connect_retries(retries);
    } else {
        launch = launch.connect_retries(config.launch.connect_retries);
    }

    if let Some(timeout) = args.timeout {
        launch = launch.timeout(timeout);
    }

    if let (Some(name), Some(version)) = (&args.platform_name, &args.platform_version) {
        launch = launch.platform(name, version);
    } else if let Some(name) = &args.platform_name {
        launch.platform_name = Some(name.clone());
    }

    if let Some(browser) = &args.browser_name {
        launch = launch.browser(browser);
    }

    if let Some(device) = &args.device_name {
        let orientation = match args.device_orientation.as_deref() {
            Some("landscape") => DeviceOrientation::Landscape,
            _ => DeviceOrientation::Portrait,
        };
        launch = launch.device(device, orientation);
    }

    if let Some(id) = &args.tunnel_identifier {
        launch = launch.tunnel_identifier(id);
    }

    if args.no_connect {
        launch.connect = false;
    }

    let launcher = Launcher::with_config(config)?;
    let outcome = launcher.launch(launch).await;

    if let Some(server) = server {
        server.close();
    }

    match outcome {
        Ok(result) => {
            let q = result.body.custom_data.qunit;
            println!(
                "{}: {} passed, {} failed, {} total",
                if result.body.passed { "PASS" } else { "FAIL" },
                q.passed,
                q.failed,
                q.total
            );
            if !result.body.passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
