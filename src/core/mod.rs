//! # Core Protocol Components
//!
//! Low-level packet handling and framing.
//!
//! ## Components
//! - **Packet**: fixed 512-byte frame with named field ranges
//! - **SessionId**: 32-byte alphanumeric identifier
//! - **Codec**: Tokio codec for fixed-size framing over byte streams
//!
//! ## Wire Format
//! ```text
//! [Identifier(32)] [State(1)] [Exit(1)] [Message(478)]
//! ```
//!
//! No length prefix and no version byte: every frame is exactly 512 bytes.

pub mod codec;
pub mod packet;
pub mod session_id;
