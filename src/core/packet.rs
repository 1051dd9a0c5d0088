//! # Packet
//!
//! Fixed 512-byte frame exchanged between client and server.
//!
//! ```text
//! [Identifier(32)] [State(1)] [Exit(1)] [Message(478)]
//! ```
//!
//! Only the frame length, the state byte and the identifier are validated.
//! The exit flag and the message region are opaque to corruption checks.

use std::fmt;
use std::ops::Range;

use crate::core::session_id::{validate_header, SessionId, ID_LEN};
use crate::error::{ProtocolError, Result};

/// Total frame length
pub const PACKET_LEN: usize = 512;

/// Offset of the state byte
pub const STATE_OFFSET: usize = ID_LEN;

/// Offset of the exit flag
pub const EXIT_OFFSET: usize = ID_LEN + 1;

/// Identifier plus state and exit bytes
pub const HEADER_LEN: usize = ID_LEN + 2;

/// Message capacity in bytes
pub const MESSAGE_LEN: usize = PACKET_LEN - HEADER_LEN;

const ID_RANGE: Range<usize> = 0..ID_LEN;
const MESSAGE_RANGE: Range<usize> = HEADER_LEN..PACKET_LEN;

/// Protocol state carried in every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    Open = 0,
    Acknowledge = 1,
    Close = 2,
}

impl TryFrom<u8> for State {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(State::Open),
            1 => Ok(State::Acknowledge),
            2 => Ok(State::Close),
            other => Err(ProtocolError::InvalidType(other)),
        }
    }
}

/// Outcome of a handled request, set on acknowledge replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl From<bool> for ExitCode {
    fn from(success: bool) -> Self {
        if success {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }
}

/// A single protocol frame
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    frame: [u8; PACKET_LEN],
}

impl Packet {
    /// An open request: zero identifier, state OPEN
    pub fn new() -> Self {
        Self {
            frame: [0u8; PACKET_LEN],
        }
    }

    /// Alias of [`Packet::new`]
    pub fn open() -> Self {
        Self::new()
    }

    /// Zero identifier with the given state
    pub fn with_state(state: State) -> Self {
        let mut packet = Self::new();
        packet.set_state(state);
        packet
    }

    /// An acknowledge frame tagged with `id`.
    ///
    /// Only OPEN frames carry the zero identifier, so `SessionId::NONE` fails
    /// with `InvalidSessionId`.
    pub fn acknowledge(id: SessionId) -> Result<Self> {
        Self::tagged(State::Acknowledge, id)
    }

    /// A close frame tagged with `id`; `SessionId::NONE` is rejected
    pub fn close(id: SessionId) -> Result<Self> {
        Self::tagged(State::Close, id)
    }

    fn tagged(state: State, id: SessionId) -> Result<Self> {
        if id.is_none() {
            return Err(ProtocolError::InvalidSessionId);
        }
        let mut packet = Self::with_state(state);
        packet.set_id(Some(id));
        Ok(packet)
    }

    /// Decode and validate a frame received from the wire
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let frame: [u8; PACKET_LEN] = bytes
            .try_into()
            .map_err(|_| ProtocolError::InvalidLength(bytes.len()))?;
        let packet = Self { frame };
        packet.validate()?;
        Ok(packet)
    }

    /// Wrap a raw frame without validating it
    pub fn from_frame(frame: [u8; PACKET_LEN]) -> Self {
        Self { frame }
    }

    /// Framing and header checks.
    ///
    /// Fails with `InvalidType` for an unknown state byte, then `InvalidHeader`
    /// for identifier bytes that are neither all zero nor all alphanumeric.
    pub fn validate(&self) -> Result<()> {
        State::try_from(self.frame[STATE_OFFSET])?;
        validate_header(&self.id_bytes())
    }

    pub fn is_corrupt(&self) -> bool {
        self.validate().is_err()
    }

    fn id_bytes(&self) -> [u8; ID_LEN] {
        let mut id = [0u8; ID_LEN];
        id.copy_from_slice(&self.frame[ID_RANGE]);
        id
    }

    pub fn id(&self) -> SessionId {
        SessionId::from_raw(self.id_bytes())
    }

    pub fn id_str(&self) -> String {
        String::from_utf8_lossy(&self.frame[ID_RANGE]).into_owned()
    }

    /// Write `id` into the header, or a freshly generated one when `None`.
    /// Returns the identifier now in the frame.
    pub fn set_id(&mut self, id: Option<SessionId>) -> SessionId {
        let id = id.unwrap_or_else(SessionId::generate);
        self.frame[ID_RANGE].copy_from_slice(id.as_bytes());
        id
    }

    pub fn state(&self) -> Result<State> {
        State::try_from(self.frame[STATE_OFFSET])
    }

    pub fn set_state(&mut self, state: State) {
        self.frame[STATE_OFFSET] = state as u8;
    }

    pub fn is_open(&self) -> bool {
        self.frame[STATE_OFFSET] == State::Open as u8
    }

    pub fn is_acknowledge(&self) -> bool {
        self.frame[STATE_OFFSET] == State::Acknowledge as u8
    }

    pub fn is_close(&self) -> bool {
        self.frame[STATE_OFFSET] == State::Close as u8
    }

    /// Any non-zero exit byte counts as a failure
    pub fn exit_code(&self) -> ExitCode {
        if self.frame[EXIT_OFFSET] == ExitCode::Success as u8 {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == ExitCode::Success
    }

    pub fn set_exit(&mut self, success: bool) {
        self.frame[EXIT_OFFSET] = ExitCode::from(success) as u8;
    }

    /// Message bytes up to the first NUL (or the end of the frame)
    pub fn message_bytes(&self) -> &[u8] {
        let region = &self.frame[MESSAGE_RANGE];
        let end = region.iter().position(|&b| b == 0).unwrap_or(region.len());
        &region[..end]
    }

    pub fn message(&self) -> String {
        String::from_utf8_lossy(self.message_bytes()).into_owned()
    }

    /// Write `message` at the start of the message region.
    ///
    /// Bytes already present past the end of `message` are left untouched;
    /// use [`Packet::reset_message`] to clear them.
    pub fn set_message(&mut self, message: &str) -> Result<()> {
        let bytes = message.as_bytes();
        if bytes.len() > MESSAGE_LEN {
            return Err(ProtocolError::MessageTooLong(bytes.len()));
        }
        self.frame[HEADER_LEN..HEADER_LEN + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Zero the message region, then write `message`
    pub fn reset_message(&mut self, message: &str) -> Result<()> {
        if message.len() > MESSAGE_LEN {
            return Err(ProtocolError::MessageTooLong(message.len()));
        }
        self.frame[MESSAGE_RANGE].fill(0);
        self.set_message(message)
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_LEN] {
        &self.frame
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.frame.to_vec()
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("id", &self.id())
            .field("state", &self.frame[STATE_OFFSET])
            .field("exit", &self.frame[EXIT_OFFSET])
            .field("message", &self.message())
            .finish()
    }
}
