//! # Utility Modules
//!
//! Supporting utilities for logging, metrics and deadlines.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup from [`crate::config::LoggingConfig`]
//! - **Metrics**: atomic counters for sessions and packet traffic
//! - **Timeout**: the pinned client deadline and async timeout wrappers

pub mod logging;
pub mod metrics;
pub mod timeout;
