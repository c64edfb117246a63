use std::net::SocketAddr;
use std::time::Instant;

use crate::key::Key;

/// A known overlay peer: identity, transport address, and the time we last
/// heard from it directly. `last_contact` stays absent until a message or
/// response has actually been received from the peer.
#[derive(Debug, Clone)]
pub struct Peer {
    pub key: Key,
    pub addr: SocketAddr,
    last_contact: Option<Instant>,
}

impl Peer {
    pub fn new(key: Key, addr: SocketAddr) -> Peer {
        Peer {
            key,
            addr,
            last_contact: None,
        }
    }

    /// Record direct contact now.
    pub fn touch(&mut self) {
        self.last_contact = Some(Instant::now());
    }

    pub fn contacted(&self) -> bool {
        self.last_contact.is_some()
    }

    pub fn last_contact(&self) -> Option<Instant> {
        self.last_contact
    }

    /// Copy of this peer as it travels in messages: identity and address
    /// only, no local contact state.
    pub fn descriptor(&self) -> Peer {
        Peer::new(self.key.clone(), self.addr)
    }
}
