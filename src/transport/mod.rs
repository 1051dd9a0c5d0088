//! # Transport Layer
//!
//! Socket plumbing underneath the client and server.
//!
//! ## Components
//! - **Local**: Unix domain socket bind/connect plus exact-size frame
//!   `receive`/`transmit` primitives
//!
//! The protocol is scoped to a single machine; there is no network transport.

#[cfg(unix)]
pub mod local;
