//! `MangroveServer` builder and server loop.
//!
//! This is the entry point for running a Mangrove island server. It
//! ties together all the layers: transport → protocol → account →
//! island core.

use std::sync::Arc;
use std::time::Duration;

use mangrove_account::{AccountStore, Authenticator};
use mangrove_island::{IslandConfig, IslandDirectory};
use mangrove_protocol::JsonCodec;
use mangrove_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::MangroveError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// directory is the one mutual-exclusion domain: registry membership
/// and the host↔guest graph mutate only under its lock. The
/// authenticator is lock-free — login never waits on the directory
/// until the credentials have already checked out.
pub(crate) struct ServerState<S: AccountStore> {
    pub(crate) directory: Mutex<IslandDirectory>,
    pub(crate) auth: Authenticator<S>,
    pub(crate) codec: JsonCodec,
    pub(crate) login_timeout: Duration,
}

/// Builder for configuring and starting a Mangrove server.
///
/// # Example
///
/// ```rust,ignore
/// use mangrove::prelude::*;
///
/// let server = MangroveServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(store)
///     .await?;
/// server.run().await
/// ```
pub struct MangroveServerBuilder {
    bind_addr: String,
    island_config: IslandConfig,
    login_timeout: Duration,
    store_timeout: Option<Duration>,
}

impl MangroveServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            island_config: IslandConfig::default(),
            login_timeout: Duration::from_secs(30),
            store_timeout: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the island geometry.
    pub fn island_config(mut self, config: IslandConfig) -> Self {
        self.island_config = config;
        self
    }

    /// Sets how long an unauthenticated connection may linger before
    /// the server drops it.
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// Sets the deadline for one account-store round trip during login.
    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = Some(timeout);
        self
    }

    /// Builds and starts the server against the given account store.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<S: AccountStore>(
        self,
        store: Arc<S>,
    ) -> Result<MangroveServer<S>, MangroveError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let mut auth = Authenticator::new(store);
        if let Some(timeout) = self.store_timeout {
            auth = auth.with_timeout(timeout);
        }

        let state = Arc::new(ServerState {
            directory: Mutex::new(IslandDirectory::new(self.island_config)),
            auth,
            codec: JsonCodec,
            login_timeout: self.login_timeout,
        });

        Ok(MangroveServer { transport, state })
    }
}

impl Default for MangroveServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Mangrove island server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MangroveServer<S: AccountStore> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S>>,
}

impl<S: AccountStore> MangroveServer<S> {
    /// Creates a new builder.
    pub fn builder() -> MangroveServerBuilder {
        MangroveServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each
    /// one. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), MangroveError> {
        tracing::info!("Mangrove server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
