//! MCP gateway server.
//!
//! One HTTP listener serves two surfaces:
//! - `/oauth/*` and the discovery document: the embedded authorization server
//! - `/mcp` and every other path: JSON-RPC dispatch behind the bearer-token gate

pub mod gate;
pub mod oauth;
pub mod transport;

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::tools::{ToolContext, ToolRegistry};
use oauth::{CredentialStore, InMemoryCredentialStore};
use transport::HttpState;

/// MCP gateway with an embedded OAuth authorization server.
pub struct Gateway {
    state: Arc<HttpState>,
}

impl Gateway {
    /// Create a gateway with an in-memory credential store and the system clock.
    #[must_use]
    pub fn new(config: Config, tools: ToolRegistry) -> Self {
        Self::with_store_and_clock(
            config,
            tools,
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(SystemClock),
        )
    }

    /// Create a gateway over an explicit credential store and time source.
    #[must_use]
    pub fn with_store_and_clock(
        config: Config,
        tools: ToolRegistry,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ctx = ToolContext::new(Arc::clone(&clock));
        Self { state: Arc::new(HttpState { config, store, clock, tools, ctx }) }
    }

    /// Build the HTTP router.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        transport::create_router(Arc::clone(&self.state))
    }

    /// Run the gateway until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot bind or the server fails.
    pub async fn run_http(self) -> anyhow::Result<()> {
        let config = &self.state.config;
        let addr = format!("{}:{}", config.host, config.port);

        tracing::info!("Registered {} tools", self.state.tools.len());

        let sweeper = self.spawn_sweeper();

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(handle) = sweeper {
            handle.abort();
        }
        result?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }

    /// Start the background sweeper when a sweep interval is configured.
    fn spawn_sweeper(&self) -> Option<tokio::task::JoinHandle<()>> {
        self.state.config.sweep_interval.map(|interval| {
            tracing::info!(interval_secs = interval.as_secs(), "Starting credential sweeper");
            oauth::store::start_sweep_task(
                Arc::clone(&self.state.store),
                Arc::clone(&self.state.clock),
                interval,
            )
        })
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("tools", &self.state.tools.len()).finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::server::oauth::AccessToken;
    use crate::tools::register_all_tools;

    fn gateway(sweep_interval: Option<Duration>) -> (Gateway, Arc<InMemoryCredentialStore>, Arc<ManualClock>) {
        let mut config = Config::for_testing();
        config.sweep_interval = sweep_interval;
        let store = Arc::new(InMemoryCredentialStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()));
        let gateway = Gateway::with_store_and_clock(
            config,
            register_all_tools(None).unwrap(),
            store.clone(),
            clock.clone(),
        );
        (gateway, store, clock)
    }

    async fn expired_token(store: &InMemoryCredentialStore, clock: &ManualClock) {
        store
            .put_token(
                "stale".to_string(),
                AccessToken {
                    client_id: "test-client".to_string(),
                    scope: "mcp:read".to_string(),
                    expires_at: clock.now() - chrono::Duration::seconds(1),
                    refresh_token: "r".to_string(),
                },
            )
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_sweeper_purges_expired_tokens() {
        let (gateway, store, clock) = gateway(Some(Duration::from_secs(30)));
        expired_token(&store, &clock).await;

        let handle = gateway.spawn_sweeper().unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(store.token_count().await, 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_no_sweeper_without_interval() {
        let (gateway, store, clock) = gateway(None);
        expired_token(&store, &clock).await;

        assert!(gateway.spawn_sweeper().is_none());
        assert_eq!(store.token_count().await, 1);
    }
}
