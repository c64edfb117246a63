use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::constants::{ALPHA, CALL_TIMEOUT, INBOX_CAPACITY};
use crate::error::Error;
use crate::fabric::Fabric;
use crate::key::Key;
use crate::lookup::IterativeLookup;
use crate::message::{CallId, Message, MessageKind, Payload};
use crate::peer::Peer;
use crate::routing::RoutingTable;

/// Tuning knobs for a node's outbound calls and lookups.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Deadline for a single request/response exchange.
    pub call_timeout: Duration,
    /// Parallelism bound for iterative lookups.
    pub alpha: usize,
}

impl Default for NodeConfig {
    fn default() -> NodeConfig {
        NodeConfig {
            call_timeout: CALL_TIMEOUT,
            alpha: ALPHA,
        }
    }
}

struct PendingCall {
    expects: MessageKind,
    tx: oneshot::Sender<Message>,
}

/// An overlay node: one identity, one routing table, and a mailbox-driven
/// inbound pipeline bound to a [`Fabric`] endpoint.
///
/// Every received message first feeds the routing table (the sender, plus
/// any peers it carries), then requests are served, then a matching
/// pending call is resolved. Messages are handled one at a time, so the
/// pipeline never interleaves with itself.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use kadnet::{MemoryFabric, Node};
///
/// # async fn example() {
/// let fabric = Arc::new(MemoryFabric::new());
/// let master = Node::start(fabric.clone(), "127.0.0.1:7001".parse().unwrap());
/// let node = Node::start(fabric.clone(), "127.0.0.1:7002".parse().unwrap());
///
/// node.bootstrap(&[master.peer().clone()]).await;
/// assert!(node.routing_table().peer_count() > 0);
/// # }
/// ```
pub struct Node {
    peer: Peer,
    routing: Arc<RoutingTable>,
    fabric: Arc<dyn Fabric>,
    pending: Mutex<HashMap<CallId, PendingCall>>,
    config: NodeConfig,
}

impl Node {
    /// Start a node with a fresh random key at `addr`, registered on the
    /// fabric and serving inbound messages.
    pub fn start(fabric: Arc<dyn Fabric>, addr: SocketAddr) -> Arc<Node> {
        Node::start_with_config(fabric, addr, NodeConfig::default())
    }

    pub fn start_with_config(
        fabric: Arc<dyn Fabric>,
        addr: SocketAddr,
        config: NodeConfig,
    ) -> Arc<Node> {
        let key = Key::generate();
        let peer = Peer::new(key.clone(), addr);

        let node = Arc::new(Node {
            peer,
            routing: Arc::new(RoutingTable::new(key)),
            fabric,
            pending: Mutex::new(HashMap::new()),
            config,
        });

        let (tx, mut rx) = mpsc::channel(INBOX_CAPACITY);
        node.fabric.register(addr, tx);

        let inbound = Arc::clone(&node);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                inbound.handle(message).await;
            }
        });

        info!(key = %node.peer.key, %addr, "node started");
        node
    }

    // === Getters ===

    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    pub fn key(&self) -> &Key {
        &self.peer.key
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing
    }

    pub(crate) fn config(&self) -> &NodeConfig {
        &self.config
    }

    // === Public operations ===

    /// Ping the seed peers, then look up our own key to populate the
    /// routing table. Unreachable seeds are skipped; returns the converged
    /// closest set of the self-lookup.
    pub async fn bootstrap(&self, seeds: &[Peer]) -> Vec<Peer> {
        for seed in seeds {
            let request = Message::ping(&self.peer);
            match self.call(seed, request, MessageKind::PingResponse).await {
                Ok(response) => {
                    let mut source = response.source;
                    source.touch();
                    self.routing.insert(source);
                }
                Err(error) => {
                    debug!(addr = %seed.addr, %error, "bootstrap ping failed, skipping seed");
                }
            }
        }

        let own_key = self.peer.key.clone();
        let found = self.find(&own_key).await;

        info!(peers = self.routing.peer_count(), "bootstrap complete");
        found
    }

    /// Iterative find-node for `target`: up to k peers, closest first.
    pub async fn find(&self, target: &Key) -> Vec<Peer> {
        IterativeLookup::new(self, target.clone()).run().await
    }

    /// Fire-and-forget transmission. Fabric errors count as message loss.
    pub async fn send(&self, peer: &Peer, message: Message) {
        if let Err(error) = self.fabric.send(peer.addr, message).await {
            trace!(addr = %peer.addr, %error, "send failed");
        }
    }

    /// Send `request` and await the response of the expected kind carrying
    /// the request's id, bounded by the configured call timeout.
    ///
    /// The waiter is registered before the request reaches the fabric, so
    /// a response can never arrive ahead of it.
    pub async fn call(
        &self,
        peer: &Peer,
        request: Message,
        expects: MessageKind,
    ) -> Result<Message, Error> {
        let id = request.id.clone();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id.clone(), PendingCall { expects, tx });

        if let Err(error) = self.fabric.send(peer.addr, request).await {
            self.pending.lock().remove(&id);
            return Err(error);
        }

        match timeout(self.config.call_timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            _ => {
                self.pending.lock().remove(&id);
                Err(Error::CallTimeout)
            }
        }
    }

    // === Inbound pipeline ===

    /// Handle one inbound message: learn the sender and any carried peers,
    /// serve requests, then resolve a matching pending call.
    pub async fn handle(&self, message: Message) {
        let mut source = message.source.clone();
        source.touch();
        self.routing.insert(source);

        if let Some(peers) = message.carried_peers() {
            // Carried peers are hearsay; the bucket's contacted-only rule
            // decides whether they enter the table.
            for peer in peers {
                self.routing.insert(peer.clone());
            }
        }

        match &message.payload {
            Payload::PingRequest => {
                let reply = Message::ping_reply(message.id.clone(), &self.peer);
                self.send(&message.source, reply).await;
            }
            Payload::FindNodeRequest { target } => {
                let closest = self.routing.closest_for(target);
                let reply = Message::find_node_reply(message.id.clone(), &self.peer, closest);
                self.send(&message.source, reply).await;
            }
            Payload::PingResponse | Payload::FindNodeResponse { .. } => {}
        }

        self.resolve_pending(message);
    }

    fn resolve_pending(&self, message: Message) {
        let mut pending = self.pending.lock();

        let matches = pending
            .get(&message.id)
            .map(|call| call.expects == message.kind())
            .unwrap_or(false);

        if matches {
            if let Some(call) = pending.remove(&message.id) {
                // The caller may have timed out in the meantime.
                let _ = call.tx.send(message);
            }
        }
    }
}
