use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::dispatcher::{Dispatcher, HandlerFn};
use crate::protocol::session::SessionRegistry;
use crate::transport::local;
use crate::utils::metrics::global_metrics;

/// Session server bound to a Unix domain socket.
///
/// Register a handler, then call [`Server::accept_and_handle`] repeatedly (or
/// [`Server::serve_with_shutdown`] for a managed loop). Every method takes
/// `&self`, so one server can be shared across tasks; the session registry
/// serialises its own access.
pub struct Server {
    listener: UnixListener,
    config: ServerConfig,
    registry: SessionRegistry,
    handler: Option<Arc<HandlerFn>>,
}

impl Server {
    /// Validate `config` and bind its socket.
    ///
    /// A TTL outside `[1, 3600]` seconds fails with `InvalidTtl` before any
    /// socket work happens.
    #[instrument(skip(config), fields(socket_path = %config.socket_path.display()))]
    pub fn bind(config: ServerConfig) -> Result<Self> {
        config.check_ttl()?;
        let listener = local::bind(&config.socket_path, config.force)?;
        let registry = SessionRegistry::new(config.session_ttl);

        info!(
            ttl_secs = config.session_ttl.as_secs(),
            force = config.force,
            "Session server bound"
        );

        Ok(Self {
            listener,
            config,
            registry,
            handler: None,
        })
    }

    /// Install the request handler. A later call replaces the earlier one.
    pub fn register_handler<F>(&mut self, handler: F)
    where
        F: Fn(&str) -> (String, bool) + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    pub fn ttl(&self) -> Duration {
        self.config.session_ttl
    }

    fn dispatcher(&self) -> Result<Dispatcher> {
        let handler = self.handler.clone().ok_or(ProtocolError::MissingHandler)?;
        Ok(Dispatcher::new(self.registry.clone(), handler))
    }

    async fn accept(&self) -> Result<UnixStream> {
        let (stream, _) = self.listener.accept().await.map_err(|e| {
            global_metrics().transport_error();
            ProtocolError::TransportError(format!("{}: {e}", constants::ERR_ACCEPT_FAILED))
        })?;
        Ok(stream)
    }

    /// Accept one connection and serve its single packet.
    ///
    /// Fails with `MissingHandler` before accepting if no handler is
    /// registered. A peer that hangs up without sending anything is not an
    /// error.
    pub async fn accept_and_handle(&self) -> Result<()> {
        let dispatcher = self.dispatcher()?;
        let stream = self.accept().await?;
        handle_connection(stream, &dispatcher).await
    }

    /// Serve until Ctrl-C
    #[instrument(skip(self), fields(socket_path = %self.config.socket_path.display()))]
    pub async fn serve(&self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.serve_with_shutdown(shutdown_rx).await
    }

    /// Accept connections concurrently until `shutdown_rx` fires.
    ///
    /// Each connection runs on its own tracked task. On shutdown the loop waits
    /// up to the configured shutdown timeout for in-flight connections, then
    /// removes the socket file. A task that panics stops counting as in flight
    /// as soon as it unwinds.
    #[instrument(skip(self, shutdown_rx), fields(socket_path = %self.config.socket_path.display()))]
    pub async fn serve_with_shutdown(&self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let dispatcher = self.dispatcher()?;
        let connections = TaskTracker::new();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(
                        connections = connections.len(),
                        "Shutting down server. Waiting for connections to close..."
                    );
                    connections.close();
                    self.drain(&connections).await;
                    self.remove_socket_file().await;
                    global_metrics().log_metrics();
                    return Ok(());
                }

                accepted = self.accept() => {
                    match accepted {
                        Ok(stream) => {
                            let dispatcher = dispatcher.clone();
                            connections.spawn(async move {
                                if let Err(e) = handle_connection(stream, &dispatcher).await {
                                    warn!(error = %e, "Connection failed");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Error accepting connection");
                        }
                    }
                }
            }
        }
    }

    async fn drain(&self, connections: &TaskTracker) {
        match tokio::time::timeout(self.config.shutdown_timeout, connections.wait()).await {
            Ok(()) => info!("All connections closed, shutting down"),
            Err(_) => warn!(
                connections = connections.len(),
                "Shutdown timeout reached, forcing exit"
            ),
        }
    }

    async fn remove_socket_file(&self) {
        let path = &self.config.socket_path;
        if path.exists() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                error!(error = %e, path = %path.display(), "Failed to remove socket file");
            } else {
                info!(path = %path.display(), "Removed socket file");
            }
        }
    }
}

/// Read one packet from `stream`, dispatch it, and write the reply if any
async fn handle_connection(stream: UnixStream, dispatcher: &Dispatcher) -> Result<()> {
    let (mut reader, mut writer) = local::split(stream);

    let Some(packet) = local::receive(&mut reader).await? else {
        return Ok(());
    };

    debug!(session = %packet.id(), state = ?packet.state(), "Packet dispatched");

    match dispatcher.dispatch(&packet).await? {
        Some(reply) => local::transmit(&mut writer, reply).await,
        None => Ok(()),
    }
}
