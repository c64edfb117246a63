use std::collections::VecDeque;

use parking_lot::RwLock;
use tracing::trace;

use crate::constants::{K, NUM_BUCKETS};
use crate::key::Key;
use crate::peer::Peer;

/// A bounded, recency-ordered list of peers. Position 0 is the most
/// recently observed entry.
#[derive(Debug, Default)]
pub struct Bucket {
    peers: VecDeque<Peer>,
}

impl Bucket {
    pub fn new() -> Bucket {
        Bucket {
            peers: VecDeque::with_capacity(K),
        }
    }

    /// Prepend a peer. Uncontacted peers and keys already present are
    /// ignored; a full bucket drops its oldest entry first.
    pub fn insert(&mut self, peer: Peer) {
        if !peer.contacted() {
            return;
        }
        if self.peers.iter().any(|p| p.key == peer.key) {
            return;
        }
        if self.peers.len() == K {
            self.peers.pop_back();
        }
        self.peers.push_front(peer);
    }

    /// Snapshot in recency order, most recent first.
    pub fn peers(&self) -> Vec<Peer> {
        self.peers.iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.peers.len()
    }
}

/// 160 buckets indexed by the XOR-distance bit between a peer's key and
/// our own. Bucket 0 holds peers differing only in the lowest bit; bucket
/// 159 holds the far half of the identifier space.
pub struct RoutingTable {
    own_key: Key,
    buckets: Vec<RwLock<Bucket>>,
}

impl RoutingTable {
    pub fn new(own_key: Key) -> RoutingTable {
        let buckets = (0..NUM_BUCKETS).map(|_| RwLock::new(Bucket::new())).collect();

        RoutingTable { own_key, buckets }
    }

    pub fn own_key(&self) -> &Key {
        &self.own_key
    }

    fn index_for(&self, key: &Key) -> Option<usize> {
        let distance = self.own_key.xor(key).ok()?;
        distance.leading_set_bit_index()
    }

    pub fn insert(&self, peer: Peer) {
        match self.index_for(&peer.key) {
            Some(index) => self.buckets[index].write().insert(peer),
            // Our own key has no bucket.
            None => trace!(key = %peer.key, "peer maps to no bucket, skipping"),
        }
    }

    /// Up to k peers from the buckets nearest the target's distance shell,
    /// expanding outward one bucket at a time. The result is not sorted by
    /// distance; the lookup owns the final ordering.
    pub fn closest_for(&self, target: &Key) -> Vec<Peer> {
        let start = self.index_for(target).unwrap_or(0);
        let mut gathered = Vec::with_capacity(K);

        gathered.extend(self.buckets[start].read().peers());

        for step in 1..NUM_BUCKETS {
            if gathered.len() >= K {
                break;
            }

            let below = start.checked_sub(step);
            let above = start + step;
            if below.is_none() && above >= NUM_BUCKETS {
                break;
            }

            if let Some(index) = below {
                gathered.extend(self.buckets[index].read().peers());
            }
            if above < NUM_BUCKETS {
                gathered.extend(self.buckets[above].read().peers());
            }
        }

        gathered.truncate(K);
        gathered
    }

    pub fn peer_count(&self) -> usize {
        self.buckets.iter().map(|b| b.read().count()).sum()
    }
}
