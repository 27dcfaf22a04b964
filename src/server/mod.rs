//! Local test page server
//!
//! Serves the fixed QUnit fixture page the launcher points remote browsers
//! at. The page reports its run totals through `window.global_test_results`,
//! which the cloud scrapes into `custom-data.qunit`.

use axum::{response::Html, routing::get, Router};
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tracing::info;

use crate::core::{Result, SkylaunchError};

/// QUnit fixture page with four passing tests
const QUNIT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Skylaunch QUnit Fixture</title>
  <link rel="stylesheet" href="https://code.jquery.com/qunit/qunit-2.20.0.css">
</head>
<body>
  <div id="qunit"></div>
  <div id="qunit-fixture"></div>
  <script src="https://code.jquery.com/qunit/qunit-2.20.0.js"></script>
  <script>
    QUnit.test('adds numbers', function (assert) {
      assert.equal(1 + 1, 2);
    });
    QUnit.test('concatenates strings', function (assert) {
      assert.equal('sky' + 'launch', 'skylaunch');
    });
    QUnit.test('finds the fixture', function (assert) {
      assert.ok(document.getElementById('qunit-fixture'));
    });
    QUnit.test('knows truthiness', function (assert) {
      assert.ok(true);
    });

    QUnit.done(function (details) {
      window.global_test_results = {
        failed: details.failed,
        passed: details.passed,
        total: details.total
      };
    });
  </script>
</body>
</html>"#;

/// A running local test server
///
/// Holds the shutdown sender; dropping it stops the server, but prefer
/// [`TestServer::close`] so teardown is explicit.
#[derive(Debug)]
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Address the server is bound to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the served page
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shut the server down gracefully
    pub fn close(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Serve the QUnit fixture page on the given port
///
/// Port 0 binds an ephemeral port; read it back from [`TestServer::addr`].
pub async fn serve_qunit(port: u16) -> Result<TestServer> {
    let app = Router::new().route("/", get(|| async { Html(QUNIT_PAGE) }));

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|e| SkylaunchError::server(format!("Failed to bind port {}: {}", port, e)))?;

    let addr = listener
        .local_addr()
        .map_err(|e| SkylaunchError::server(format!("Failed to read local addr: {}", e)))?;

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .ok();
    });

    info!(%addr, "test server listening");
    Ok(TestServer {
        addr,
        shutdown: Some(tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_qunit_page() {
        let server = serve_qunit(0).await.unwrap();

        let body = reqwest::get(server.url()).await.unwrap().text().await.unwrap();
        assert!(body.contains("qunit-fixture"));
        assert!(body.contains("global_test_results"));

        server.close();
    }

    #[tokio::test]
    async fn test_port_in_use_is_an_error() {
        let first = serve_qunit(0).await.unwrap();
        let port = first.addr().port();

        let err = serve_qunit(port).await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind"));

        first.close();
    }
}
