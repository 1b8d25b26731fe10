//! Test utilities for mtdb-client
//!
//! Serves an axum router on a loopback port and builds a client pointed at
//! it, so integration tests can exercise the full HTTP path against a mock
//! service.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::{MtdbClient, Result};

/// A mock service that shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: MtdbClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` with a client using test defaults
    ///
    /// The client authenticates as `tester`, keeps its cache in memory and
    /// retries without sleeping.
    ///
    /// ```ignore
    /// let server = TestServer::start(router).await?;
    /// let campaigns = server.client.campaigns().all().await?;
    /// ```
    pub async fn start<S>(router: axum::Router<S>) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        Self::start_with(router, |builder| builder).await
    }

    /// Serve `router` with a client whose configuration `configure` adjusts
    pub async fn start_with<S, F>(router: axum::Router<S>, configure: F) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
        F: FnOnce(ClientConfigBuilder) -> ClientConfigBuilder,
    {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let router: axum::Router = router.into();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let config = configure(test_config(&format!("http://{}", addr))).build();
        let client = MtdbClient::new(config)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL of the mock service
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> &MtdbClient {
        &self.client
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Configuration for a client talking to a local mock service
pub fn test_config(host: &str) -> ClientConfigBuilder {
    ClientConfig::builder(host)
        .credentials("tester", "secret")
        .backoff_factor(0.0)
        .request_timeout_ms(5_000)
        .connect_timeout_ms(2_000)
        .in_memory_cache()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = test_config("http://127.0.0.1:8080").build();
        assert_eq!(config.api_root(), "http://127.0.0.1:8080/api/v1/");
        assert!(!config.cache.persist);
        assert_eq!(config.retry.backoff(3), std::time::Duration::ZERO);
    }
}
