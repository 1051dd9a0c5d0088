use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::packet::{Packet, State};
use crate::error::Result;
use crate::protocol::session::SessionRegistry;
use crate::utils::metrics::global_metrics;

/// Request handler: `request -> (response, success)`
pub type HandlerFn = dyn Fn(&str) -> (String, bool) + Send + Sync + 'static;

/// Routes one received packet according to its state.
///
/// Cheap to clone: the registry and handler are shared handles, so a server
/// can hand one to every connection task.
#[derive(Clone)]
pub struct Dispatcher {
    registry: SessionRegistry,
    handler: Arc<HandlerFn>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("ttl", &self.registry.ttl())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(registry: SessionRegistry, handler: Arc<HandlerFn>) -> Self {
        Self { registry, handler }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Evaluate `packet` once and build the reply, if any.
    ///
    /// - OPEN: register a fresh session, reply ACKNOWLEDGE carrying its id.
    /// - CLOSE: drop the session; no reply.
    /// - ACKNOWLEDGE: liveness update, then the handler. Unknown or expired
    ///   sessions are answered in-band with the error text and a failure exit.
    pub async fn dispatch(&self, packet: &Packet) -> Result<Option<Packet>> {
        match packet.state()? {
            State::Open => {
                let id = self.registry.open().await;
                let mut reply = Packet::acknowledge(id)?;
                reply.set_exit(true);
                Ok(Some(reply))
            }
            State::Close => {
                self.registry.close(&packet.id()).await;
                Ok(None)
            }
            State::Acknowledge => self.acknowledge(packet).await.map(Some),
        }
    }

    /// A zero-id acknowledge has no session to answer for; it fails with
    /// `InvalidSessionId` and the connection is dropped without a reply.
    async fn acknowledge(&self, packet: &Packet) -> Result<Packet> {
        let id = packet.id();
        let mut reply = Packet::acknowledge(id)?;

        match self.registry.touch(&id).await {
            Ok(_) => {
                let request = packet.message();
                let (response, success) = (self.handler)(&request);
                global_metrics().request_handled();

                match reply.reset_message(&response) {
                    Ok(()) => reply.set_exit(success),
                    Err(e) => {
                        warn!(session = %id, error = %e, "Handler response does not fit in a frame");
                        reply.reset_message(&e.to_string())?;
                        reply.set_exit(false);
                    }
                }
            }
            Err(e) if e.is_in_band() => {
                global_metrics().request_rejected();
                debug!(session = %id, error = %e, "Request rejected");
                reply.reset_message(&e.to_string())?;
                reply.set_exit(false);
            }
            Err(e) => return Err(e),
        }

        Ok(reply)
    }
}
