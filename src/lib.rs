//! kadnet - the core of a Kademlia-style DHT node.
//!
//! Nodes carry 160-bit identifiers and measure closeness with the XOR
//! metric. Each node owns a routing table of 160 k-buckets and serves
//! ping and find-node requests from other nodes. Iterative lookups pull
//! the table toward the peers closest to any target key. Given
//! one or more bootstrap contacts, a population of nodes self-organises
//! into an overlay where every node knows its own neighbourhood densely
//! and the rest of the identifier space sparsely.
//!
//! Transport is pluggable: nodes talk through the [`fabric::Fabric`]
//! trait, and [`fabric::MemoryFabric`] provides the in-memory reference
//! implementation (with optional loss simulation) used by the tests.
//!
//! # Getting Started
//!
//! ```no_run
//! use std::sync::Arc;
//! use kadnet::{Key, MemoryFabric, Node};
//!
//! # async fn example() {
//! let fabric = Arc::new(MemoryFabric::new());
//!
//! let master = Node::start(fabric.clone(), "127.0.0.1:7001".parse().unwrap());
//! let node = Node::start(fabric.clone(), "127.0.0.1:7002".parse().unwrap());
//!
//! // Join the overlay through the master, then look up an arbitrary key.
//! node.bootstrap(&[master.peer().clone()]).await;
//! let closest = node.find(&Key::generate()).await;
//!
//! assert!(closest.len() <= 20);
//! # }
//! ```
//!
//! # Modules
//!
//! - [`key`] - 160-bit XOR-metric identifiers
//! - [`peer`] - peer identity, address, and contact state
//! - [`routing`] - k-buckets and the routing table
//! - [`message`] - request/response shapes and correlation ids
//! - [`fabric`] - the transport seam and the in-memory fabric
//! - [`node`] - the node actor: dispatch, calls, bootstrap, find

pub mod constants;
pub mod error;
pub mod fabric;
pub mod key;
mod lookup;
pub mod message;
pub mod node;
pub mod peer;
pub mod routing;

pub use error::Error;
pub use fabric::{Fabric, MemoryFabric};
pub use key::Key;
pub use message::{CallId, Message, MessageKind, Payload};
pub use node::{Node, NodeConfig};
pub use peer::Peer;
pub use routing::{Bucket, RoutingTable};

#[cfg(test)]
mod tests;
