use std::cmp::Ordering;
use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, trace};

use crate::constants::{K, LOOKUP_MAX_ROUNDS};
use crate::key::Key;
use crate::message::{Message, MessageKind};
use crate::node::Node;
use crate::peer::Peer;

/// Convergence-driven find-node search.
///
/// Each round dispatches find-node calls to up to α of the closest
/// unqueried candidates, awaits the batch, and folds the replies back
/// into the candidate set. The search is done when every candidate has
/// been queried and nothing is in flight.
pub(crate) struct IterativeLookup<'a> {
    node: &'a Node,
    target: Key,
    closest: Vec<Peer>,
    queried: HashSet<Key>,
}

impl<'a> IterativeLookup<'a> {
    pub(crate) fn new(node: &'a Node, target: Key) -> IterativeLookup<'a> {
        IterativeLookup {
            node,
            target,
            closest: Vec::new(),
            queried: HashSet::new(),
        }
    }

    pub(crate) async fn run(mut self) -> Vec<Peer> {
        for peer in self.node.routing_table().closest_for(&self.target) {
            self.add_candidate(peer);
        }
        self.add_candidate(self.node.peer().clone());
        self.queried.insert(self.node.peer().key.clone());
        self.sort_and_truncate();

        let alpha = self.node.config().alpha;

        for round in 0..LOOKUP_MAX_ROUNDS {
            let batch: Vec<Peer> = self
                .closest
                .iter()
                .filter(|p| !self.queried.contains(&p.key))
                .take(alpha)
                .cloned()
                .collect();

            if batch.is_empty() {
                trace!(round, candidates = self.closest.len(), "lookup converged");
                break;
            }

            let mut calls = Vec::with_capacity(batch.len());
            for peer in &batch {
                let request = Message::find_node(self.node.peer(), self.target.clone());
                calls.push(self.node.call(peer, request, MessageKind::FindNodeResponse));
            }
            let results = join_all(calls).await;

            for (peer, result) in batch.iter().zip(results) {
                self.queried.insert(peer.key.clone());
                match result {
                    Ok(response) => {
                        if let Some(peers) = response.carried_peers() {
                            for candidate in peers {
                                self.add_candidate(candidate.clone());
                            }
                        }
                    }
                    Err(error) => {
                        // Queried with no contribution.
                        debug!(addr = %peer.addr, %error, "find-node query failed");
                    }
                }
            }

            self.sort_and_truncate();
        }

        self.closest
    }

    fn add_candidate(&mut self, peer: Peer) {
        if self.queried.contains(&peer.key) {
            return;
        }
        if self.closest.iter().any(|p| p.key == peer.key) {
            return;
        }
        self.closest.push(peer);
    }

    fn sort_and_truncate(&mut self) {
        let target = self.target.clone();
        self.closest.sort_by(|a, b| distance_cmp(&target, a, b));
        self.closest.truncate(K);
    }
}

/// Order two peers by XOR distance to the target. A peer whose key width
/// does not match the target sorts last.
fn distance_cmp(target: &Key, a: &Peer, b: &Peer) -> Ordering {
    match (target.xor(&a.key), target.xor(&b.key)) {
        (Ok(da), Ok(db)) => da.cmp(&db),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => Ordering::Equal,
    }
}
