//! Session identifiers.
//!
//! An identifier occupies the first 32 bytes of every frame. It is either all
//! zero (an open request, or "no session" on the client side) or 32 symbols
//! drawn from a 62-symbol alphanumeric alphabet.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::{ProtocolError, Result};

/// Identifier length in bytes
pub const ID_LEN: usize = 32;

/// Symbols an identifier is drawn from
pub const ID_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A 32-byte session identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId([u8; ID_LEN]);

impl SessionId {
    /// The all-zero identifier: no active session
    pub const NONE: SessionId = SessionId([0u8; ID_LEN]);

    /// Draw 32 independent symbols from the alphabet.
    ///
    /// Uses the thread-local CSPRNG from `rand`, seeded from the OS, so
    /// identifiers are not predictable across runs.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut id = [0u8; ID_LEN];
        for byte in id.iter_mut() {
            *byte = ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())];
        }
        Self(id)
    }

    /// Build an identifier from raw header bytes, validating them first
    pub fn from_bytes(bytes: [u8; ID_LEN]) -> Result<Self> {
        validate_header(&bytes)?;
        Ok(Self(bytes))
    }

    /// Wrap header bytes without validation (frames are validated as a whole)
    pub(crate) fn from_raw(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Whether this is the all-zero identifier
    pub fn is_none(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Identifier as text; the all-zero id renders as 32 NUL characters
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("<none>")
        } else {
            f.write_str(self.as_str())
        }
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({self})")
    }
}

impl FromStr for SessionId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes: [u8; ID_LEN] = s
            .as_bytes()
            .try_into()
            .map_err(|_| ProtocolError::InvalidHeader)?;
        Self::from_bytes(bytes)
    }
}

/// Whether `byte` belongs to the identifier alphabet
#[inline]
pub fn is_id_symbol(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
}

/// Check identifier bytes: all zero, or entirely within the alphabet
pub fn validate_header(id: &[u8; ID_LEN]) -> Result<()> {
    if id.iter().all(|&b| b == 0) || id.iter().all(|&b| is_id_symbol(b)) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidHeader)
    }
}
