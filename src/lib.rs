//! # Session Socket
//!
//! Session-oriented request/response messaging over a Unix domain socket.
//!
//! Every exchange is a single fixed 512-byte frame in each direction on its
//! own short-lived connection. Continuity across connections comes from a
//! 32-character session identifier the server issues on OPEN and forgets on
//! CLOSE or after a configurable idle TTL.
//!
//! ## Layers
//! - [`core`]: frame layout, session identifiers, Tokio codec
//! - [`transport`]: socket bind/connect and one-frame receive/transmit
//! - [`protocol`]: session registry and the OPEN / ACKNOWLEDGE / CLOSE
//!   dispatcher
//! - [`service`]: [`Client`] and [`Server`]
//! - [`config`], [`error`], [`utils`]: configuration, error types, logging,
//!   metrics and deadlines
//!
//! ## Example
//! ```no_run
//! use session_socket::{Client, Server, ServerConfig};
//!
//! # async fn run() -> session_socket::Result<()> {
//! let mut server = Server::bind(ServerConfig::new("/tmp/app.sock").with_force(true))?;
//! server.register_handler(|request| match request {
//!     "ping" => ("pong".to_string(), true),
//!     other => (format!("unknown command: {other}"), false),
//! });
//! tokio::spawn(async move { server.serve().await });
//!
//! let mut client = Client::connect("/tmp/app.sock").await?;
//! assert_eq!(client.send("ping").await?, "pong");
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
#[cfg(unix)]
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::config::{ClientConfig, LoggingConfig, NetworkConfig, ServerConfig};
pub use crate::core::codec::PacketCodec;
pub use crate::core::packet::{ExitCode, Packet, State, MESSAGE_LEN, PACKET_LEN};
pub use crate::core::session_id::{SessionId, ID_LEN};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::session::SessionRegistry;
#[cfg(unix)]
pub use crate::service::client::{Client, Reply};
#[cfg(unix)]
pub use crate::service::server::Server;
pub use crate::utils::timeout::TRANSMIT_TIMEOUT;
