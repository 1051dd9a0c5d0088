use std::path::{Path, PathBuf};

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::core::packet::{Packet, MESSAGE_LEN};
use crate::core::session_id::SessionId;
use crate::error::{constants, ProtocolError, Result};
use crate::transport::local;
use crate::utils::metrics::{global_metrics, Timer};
use crate::utils::timeout::{with_timeout_error, TRANSMIT_TIMEOUT};

/// Response to an acknowledge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Handler output, or the session error text
    pub message: String,
    /// Exit flag of the reply frame
    pub success: bool,
}

/// Session client.
///
/// Every call dials a fresh connection, sends one frame and tears the
/// connection down again. The only state kept between calls is the session
/// identifier handed out by the server.
#[derive(Debug, Clone)]
pub struct Client {
    path: PathBuf,
    session: SessionId,
}

impl Client {
    /// A client with no active session. No I/O happens until the first call.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            session: SessionId::NONE,
        }
    }

    /// A session-less client aimed at `config.socket_path`
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.socket_path.clone())
    }

    /// Create a client and open a session right away
    pub async fn connect<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let mut client = Self::new(path);
        client.open().await?;
        Ok(client)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current session identifier; [`SessionId::NONE`] when there is none
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn has_active_session(&self) -> bool {
        !self.session.is_none()
    }

    /// Open handshake: send an OPEN frame and adopt the identifier the server
    /// returns.
    #[instrument(skip(self), fields(socket_path = %self.path.display()))]
    pub async fn open(&mut self) -> Result<SessionId> {
        let reply = self.transmit(Packet::open()).await?;

        if !reply.is_acknowledge() {
            return Err(ProtocolError::UnexpectedMessage(
                constants::ERR_OPEN_NOT_ACKNOWLEDGED.to_string(),
            ));
        }

        let id = reply.id();
        if id.is_none() {
            return Err(ProtocolError::UnexpectedMessage(
                constants::ERR_OPEN_WITHOUT_ID.to_string(),
            ));
        }

        self.session = id;
        info!(session = %id, "Session opened");
        Ok(id)
    }

    /// Send `message` and return the response text.
    ///
    /// Session errors (unknown or expired id) come back as ordinary response
    /// text; use [`Client::request`] to see the exit flag.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        self.request(message).await.map(|reply| reply.message)
    }

    /// Send `message` within the current session, opening one first if needed
    #[instrument(skip(self, message), fields(socket_path = %self.path.display(), len = message.len()))]
    pub async fn request(&mut self, message: &str) -> Result<Reply> {
        if message.len() > MESSAGE_LEN {
            return Err(ProtocolError::MessageTooLong(message.len()));
        }

        if !self.has_active_session() {
            self.open().await?;
        }

        let mut packet = Packet::acknowledge(self.session)?;
        packet.set_message(message)?;

        let reply = self.transmit(packet).await?;
        let reply = Reply {
            message: reply.message(),
            success: reply.is_success(),
        };

        if !reply.success {
            debug!(session = %self.session, response = %reply.message, "Request failed");
        }
        Ok(reply)
    }

    /// Send a CLOSE frame for the current session and forget the identifier.
    ///
    /// Waits (within the reply deadline) for the server to hang up so the
    /// removal has happened before this returns. Without an active session
    /// nothing is sent.
    #[instrument(skip(self), fields(socket_path = %self.path.display()))]
    pub async fn close(&mut self) -> Result<()> {
        if !self.has_active_session() {
            debug!("No active session to close");
            return Ok(());
        }

        let packet = Packet::close(self.session)?;
        let (mut reader, mut writer) = local::connect(&self.path).await?;
        local::transmit(&mut writer, packet).await?;

        with_timeout_error(
            async { local::receive(&mut reader).await.map(|_| ()) },
            TRANSMIT_TIMEOUT,
        )
        .await
        .inspect_err(|e| {
            if matches!(e, ProtocolError::TransmitTimeout) {
                global_metrics().transmit_timeout();
            }
        })?;

        info!(session = %self.session, "Session closed");
        self.session = SessionId::NONE;
        Ok(())
    }

    /// One request/reply exchange on a fresh connection.
    ///
    /// A spawned listener reads the reply and hands it over through a oneshot
    /// slot while this task writes the request. If the slot stays empty past
    /// [`TRANSMIT_TIMEOUT`] the listener is aborted, which drops the
    /// connection.
    async fn transmit(&self, packet: Packet) -> Result<Packet> {
        let _timer = Timer::start("client.transmit");
        let (mut reader, mut writer) = local::connect(&self.path).await?;

        let (slot_tx, slot_rx) = oneshot::channel();
        let listener = tokio::spawn(async move {
            let _ = slot_tx.send(local::receive(&mut reader).await);
        });

        if let Err(e) = local::transmit(&mut writer, packet).await {
            listener.abort();
            return Err(e);
        }

        let waited = with_timeout_error(
            async {
                match slot_rx.await {
                    Ok(received) => received,
                    Err(_) => Err(ProtocolError::TransportError(
                        constants::ERR_LISTENER_DROPPED.to_string(),
                    )),
                }
            },
            TRANSMIT_TIMEOUT,
        )
        .await;

        match waited {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(ProtocolError::TransportError(
                constants::ERR_NO_REPLY.to_string(),
            )),
            Err(ProtocolError::TransmitTimeout) => {
                listener.abort();
                global_metrics().transmit_timeout();
                warn!(timeout_ms = TRANSMIT_TIMEOUT.as_millis() as u64, "No reply before deadline");
                Err(ProtocolError::TransmitTimeout)
            }
            Err(e) => Err(e),
        }
    }
}
