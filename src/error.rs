//! # Error Types
//!
//! Error handling for the session protocol.
//!
//! This module defines every failure that can occur while framing packets,
//! moving them across the socket and managing sessions.
//!
//! ## Error Categories
//! - **Framing Errors**: wrong frame length, unknown state byte, bad identifier bytes
//! - **Transport Errors**: socket I/O failures other than a clean disconnect
//! - **Session Errors**: unknown or expired session identifiers (delivered in-band)
//! - **Client Errors**: reply deadline exceeded, oversized outgoing messages
//! - **Configuration Errors**: missing handler, TTL out of range, bad config files
//!
//! Session errors never abort an exchange: the server writes their description
//! into the reply packet and flags the exit byte as a failure. Everything else
//! is returned to the caller.
//!
//! ## Example Usage
//! ```rust
//! use session_socket::core::packet::Packet;
//! use session_socket::error::{ProtocolError, Result};
//!
//! fn decode(frame: &[u8]) -> Result<Packet> {
//!     Packet::from_bytes(frame)
//! }
//!
//! assert!(matches!(decode(&[0u8; 16]), Err(ProtocolError::InvalidLength(16))));
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Transport errors
    pub const ERR_SHORT_WRITE: &str = "Short write: frame not fully transmitted";
    pub const ERR_LISTENER_DROPPED: &str = "Reply listener terminated without a result";
    pub const ERR_BIND_FAILED: &str = "Failed to bind socket";
    pub const ERR_CONNECT_FAILED: &str = "Failed to connect to socket";
    pub const ERR_ACCEPT_FAILED: &str = "Failed to accept connection";
    pub const ERR_NO_REPLY: &str = "Connection closed before a reply arrived";

    /// Handshake errors
    pub const ERR_OPEN_NOT_ACKNOWLEDGED: &str = "Open request was not acknowledged";
    pub const ERR_OPEN_WITHOUT_ID: &str = "Acknowledge reply carried no session id";
}

/// Primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Corrupt packet: {0}")]
    CorruptPacket(#[source] Box<ProtocolError>),

    #[error("Invalid length: {0} bytes")]
    InvalidLength(usize),

    #[error("Invalid type: {0}")]
    InvalidType(u8),

    #[error("Invalid header")]
    InvalidHeader,

    #[error("Invalid session id")]
    InvalidSessionId,

    #[error("Expired session id")]
    ExpiredSessionId,

    #[error("Transmission timeout")]
    TransmitTimeout,

    #[error("Handler not defined")]
    MissingHandler,

    #[error("Message too long: {0} bytes")]
    MessageTooLong(usize),

    #[error("TTL out of range: {0}s")]
    InvalidTtl(u64),

    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Wrap a framing failure as a corrupt packet
    pub fn corrupt(inner: ProtocolError) -> Self {
        match inner {
            already @ ProtocolError::CorruptPacket(_) => already,
            other => ProtocolError::CorruptPacket(Box::new(other)),
        }
    }

    /// Session errors travel inside reply packets instead of aborting the exchange
    pub fn is_in_band(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidSessionId | ProtocolError::ExpiredSessionId
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
