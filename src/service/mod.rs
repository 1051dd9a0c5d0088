//! # Services
//!
//! User-facing client and server built on the transport primitives and the
//! session protocol.
//!
//! - **Client**: one connection per call, open-or-reuse session, 3 second
//!   reply deadline
//! - **Server**: socket binding, handler registration, single-connection
//!   `accept_and_handle` and a managed accept loop with graceful shutdown

pub mod client;
pub mod server;
