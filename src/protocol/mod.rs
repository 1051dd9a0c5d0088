//! # Session Protocol
//!
//! The per-connection state machine and the session registry behind it.
//!
//! ## Components
//! - **Session**: registry of live sessions with lazy TTL expiry
//! - **Dispatcher**: evaluates one OPEN / ACKNOWLEDGE / CLOSE packet and
//!   builds the reply
//!
//! ## Flow
//! ```text
//! OPEN         -> new session id, reply ACKNOWLEDGE(id)
//! ACKNOWLEDGE  -> touch session, run handler, reply ACKNOWLEDGE(response, exit)
//! CLOSE        -> remove session, no reply
//! ```

pub mod dispatcher;
pub mod session;
