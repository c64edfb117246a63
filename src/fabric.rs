use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::Error;
use crate::message::Message;

/// Duplex transport between node endpoints.
///
/// Delivery is asynchronous, unordered and best-effort; a lost message is
/// indistinguishable from a slow one. Implementations must hand the
/// receiver its own copy of every message.
#[async_trait]
pub trait Fabric: Send + Sync + 'static {
    /// Associate an endpoint with a node's inbound mailbox.
    fn register(&self, addr: SocketAddr, inbox: mpsc::Sender<Message>);

    /// Deliver a message to the node registered at `addr`.
    async fn send(&self, addr: SocketAddr, message: Message) -> Result<(), Error>;
}

/// In-memory reference fabric: a map from endpoint to mailbox, with an
/// optional uniform drop rate for loss simulation.
pub struct MemoryFabric {
    endpoints: RwLock<HashMap<SocketAddr, mpsc::Sender<Message>>>,
    loss_rate: f64,
}

impl MemoryFabric {
    pub fn new() -> MemoryFabric {
        MemoryFabric::lossy(0.0)
    }

    /// Fabric that drops the given fraction of messages, uniformly.
    pub fn lossy(loss_rate: f64) -> MemoryFabric {
        MemoryFabric {
            endpoints: RwLock::new(HashMap::new()),
            loss_rate,
        }
    }
}

impl Default for MemoryFabric {
    fn default() -> Self {
        MemoryFabric::new()
    }
}

#[async_trait]
impl Fabric for MemoryFabric {
    fn register(&self, addr: SocketAddr, inbox: mpsc::Sender<Message>) {
        self.endpoints.write().insert(addr, inbox);
    }

    async fn send(&self, addr: SocketAddr, message: Message) -> Result<(), Error> {
        let inbox = self
            .endpoints
            .read()
            .get(&addr)
            .cloned()
            .ok_or(Error::UnknownEndpoint(addr))?;

        if self.loss_rate > 0.0 && rand::random::<f64>() < self.loss_rate {
            trace!(%addr, "dropping message");
            return Ok(());
        }

        // A full or closed mailbox counts as loss.
        if inbox.try_send(message).is_err() {
            trace!(%addr, "mailbox unavailable, message dropped");
        }

        Ok(())
    }
}
