use bytes::Bytes;

use crate::constants::CALL_ID_BYTES;
use crate::key::Key;
use crate::peer::Peer;

/// Opaque correlation token; a response carries the id of its request.
pub type CallId = Bytes;

pub fn random_call_id() -> CallId {
    let id: [u8; CALL_ID_BYTES] = rand::random();
    Bytes::copy_from_slice(&id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    PingRequest,
    PingResponse,
    FindNodeRequest,
    FindNodeResponse,
}

#[derive(Debug, Clone)]
pub enum Payload {
    PingRequest,
    PingResponse,
    FindNodeRequest { target: Key },
    FindNodeResponse { peers: Vec<Peer> },
}

/// A self-contained protocol message. Peers travel as descriptors (key and
/// address only), so a message never leaks sender-local contact state and
/// is safe to hand to another node as a value.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: CallId,
    pub source: Peer,
    pub payload: Payload,
}

impl Message {
    pub fn ping(source: &Peer) -> Message {
        Message {
            id: random_call_id(),
            source: source.descriptor(),
            payload: Payload::PingRequest,
        }
    }

    pub fn ping_reply(id: CallId, source: &Peer) -> Message {
        Message {
            id,
            source: source.descriptor(),
            payload: Payload::PingResponse,
        }
    }

    pub fn find_node(source: &Peer, target: Key) -> Message {
        Message {
            id: random_call_id(),
            source: source.descriptor(),
            payload: Payload::FindNodeRequest { target },
        }
    }

    pub fn find_node_reply(id: CallId, source: &Peer, peers: Vec<Peer>) -> Message {
        let peers = peers.iter().map(Peer::descriptor).collect();

        Message {
            id,
            source: source.descriptor(),
            payload: Payload::FindNodeResponse { peers },
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self.payload {
            Payload::PingRequest => MessageKind::PingRequest,
            Payload::PingResponse => MessageKind::PingResponse,
            Payload::FindNodeRequest { .. } => MessageKind::FindNodeRequest,
            Payload::FindNodeResponse { .. } => MessageKind::FindNodeResponse,
        }
    }

    /// The peers carried by a find-node response, when present.
    pub fn carried_peers(&self) -> Option<&[Peer]> {
        match &self.payload {
            Payload::FindNodeResponse { peers } => Some(peers),
            _ => None,
        }
    }
}
