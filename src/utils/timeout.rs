//! Deadlines used by the client and the server loop.

use std::future::Future;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// How long a client call waits for its reply. Pinned, not configurable.
pub const TRANSMIT_TIMEOUT: Duration = Duration::from_secs(3);

/// How long a shutting-down server waits for in-flight connections
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `future` with a deadline, mapping expiry to `TransmitTimeout`
pub async fn with_timeout_error<F, T>(future: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::TransmitTimeout),
    }
}
