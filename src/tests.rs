use super::*;

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::constants::{K, KEY_BYTES};
use crate::message::random_call_id;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), port)
}

fn contacted_peer(key: Key, port: u16) -> Peer {
    let mut peer = Peer::new(key, addr(port));
    peer.touch();
    peer
}

#[test]
fn test_key_generate() {
    let a = Key::generate();
    let b = Key::generate();

    assert_eq!(a.as_bytes().len(), KEY_BYTES);
    assert_ne!(a, b);
}

#[test]
fn test_key_from_bytes_round_trip() {
    let bytes = [7u8; 20];
    let key = Key::from_bytes(&bytes);
    assert_eq!(key.as_bytes(), &bytes);
}

#[test]
fn test_key_random_size_validation() {
    assert!(matches!(Key::random(0), Err(Error::InvalidKeySize(0))));
    assert!(matches!(Key::random(12), Err(Error::InvalidKeySize(12))));

    let key = Key::random(16).unwrap();
    assert_eq!(key.bit_len(), 16);
}

#[test]
fn test_key_xor_self_is_zero() {
    let key = Key::generate();
    let distance = key.xor(&key).unwrap();

    assert!(distance.as_bytes().iter().all(|b| *b == 0));
    assert_eq!(distance.leading_set_bit_index(), None);
}

#[test]
fn test_key_xor_size_mismatch() {
    let a = Key::from_bytes(&[0u8; 20]);
    let b = Key::from_bytes(&[0u8; 2]);

    assert!(matches!(
        a.xor(&b),
        Err(Error::SizeMismatch { left: 160, right: 16 })
    ));
}

#[test]
fn test_leading_set_bit_index() {
    assert_eq!(
        Key::from_bytes(&[0xF0, 0x00]).leading_set_bit_index(),
        Some(15)
    );
    assert_eq!(
        Key::from_bytes(&[0x00, 0x01]).leading_set_bit_index(),
        Some(0)
    );
    assert_eq!(Key::from_bytes(&[0x00, 0x00]).leading_set_bit_index(), None);
}

#[test]
fn test_leading_set_bit_index_full_width() {
    let mut high = [0u8; 20];
    high[0] = 0x80;
    assert_eq!(Key::from_bytes(&high).leading_set_bit_index(), Some(159));

    let mut low = [0u8; 20];
    low[19] = 0x01;
    assert_eq!(Key::from_bytes(&low).leading_set_bit_index(), Some(0));
}

#[test]
fn test_key_display_is_url_safe_base64() {
    let key = Key::generate();
    let text = key.to_string();

    let decoded = URL_SAFE_NO_PAD.decode(&text).unwrap();
    assert_eq!(decoded, key.as_bytes());
}

#[test]
fn test_xor_distance_spread() {
    let fixed = Key::generate();
    let mut seen = HashSet::new();

    for _ in 0..4_000_000 {
        let other = Key::generate();
        if let Some(index) = fixed.xor(&other).unwrap().leading_set_bit_index() {
            seen.insert(index);
        }
    }

    // Index i appears with probability 2^(i-160), so draws concentrate in
    // the top few dozen shells; a healthy RNG still covers all of those.
    assert!(seen.len() >= 20, "only {} distinct indices", seen.len());
    assert!(seen.contains(&159));
    assert!(seen.iter().all(|i| *i < 160));
}

#[test]
fn test_bucket_rejects_uncontacted() {
    let mut bucket = Bucket::new();
    bucket.insert(Peer::new(Key::generate(), addr(7000)));

    assert_eq!(bucket.count(), 0);
}

#[test]
fn test_bucket_recency_order() {
    let mut bucket = Bucket::new();
    let first = contacted_peer(Key::generate(), 7000);
    let second = contacted_peer(Key::generate(), 7001);

    bucket.insert(first.clone());
    bucket.insert(second.clone());

    let peers = bucket.peers();
    assert_eq!(peers[0].key, second.key);
    assert_eq!(peers[1].key, first.key);
}

#[test]
fn test_bucket_duplicate_key_is_noop() {
    let mut bucket = Bucket::new();
    let key = Key::generate();

    bucket.insert(contacted_peer(key.clone(), 7000));
    bucket.insert(contacted_peer(Key::generate(), 7001));
    // Re-observation of the oldest entry must not move it to the front.
    bucket.insert(contacted_peer(key.clone(), 7002));

    let peers = bucket.peers();
    assert_eq!(bucket.count(), 2);
    assert_eq!(peers[1].key, key);
    assert_eq!(peers[1].addr, addr(7000));
}

#[test]
fn test_bucket_evicts_oldest_when_full() {
    let mut bucket = Bucket::new();
    let oldest = contacted_peer(Key::generate(), 7000);
    bucket.insert(oldest.clone());

    for port in 1..K as u16 {
        bucket.insert(contacted_peer(Key::generate(), 7000 + port));
    }
    assert_eq!(bucket.count(), K);

    let newest = contacted_peer(Key::generate(), 8000);
    bucket.insert(newest.clone());

    let peers = bucket.peers();
    assert_eq!(bucket.count(), K);
    assert_eq!(peers[0].key, newest.key);
    assert!(peers.iter().all(|p| p.key != oldest.key));
}

#[test]
fn test_routing_table_skips_own_key() {
    let own = Key::generate();
    let table = RoutingTable::new(own.clone());

    table.insert(contacted_peer(own, 7000));

    assert_eq!(table.peer_count(), 0);
}

#[test]
fn test_routing_table_keys_unique() {
    let table = RoutingTable::new(Key::generate());
    let key = Key::generate();

    table.insert(contacted_peer(key.clone(), 7000));
    table.insert(contacted_peer(key, 7001));

    assert_eq!(table.peer_count(), 1);
}

#[test]
fn test_routing_table_bucket_placement() {
    let table = RoutingTable::new(Key::from_bytes(&[0u8; 20]));

    // Differs from the zero key only in the lowest bit: bucket 0.
    let mut near = [0u8; 20];
    near[19] = 0x01;
    // Differs in the highest bit: bucket 159.
    let mut far = [0u8; 20];
    far[0] = 0x80;

    table.insert(contacted_peer(Key::from_bytes(&near), 7000));
    table.insert(contacted_peer(Key::from_bytes(&far), 7001));

    assert_eq!(table.peer_count(), 2);
}

#[test]
fn test_closest_for_returns_all_when_sparse() {
    let table = RoutingTable::new(Key::generate());

    for port in 0..3 {
        table.insert(contacted_peer(Key::generate(), 7000 + port));
    }

    let closest = table.closest_for(&Key::generate());
    assert_eq!(closest.len(), 3);
}

#[test]
fn test_closest_for_caps_at_k() {
    let table = RoutingTable::new(Key::from_bytes(&[0u8; 20]));

    // Fill bucket 159 to capacity, then some of bucket 158.
    for i in 0..K as u8 {
        let mut bytes = [0u8; 20];
        bytes[0] = 0x80;
        bytes[19] = i;
        table.insert(contacted_peer(Key::from_bytes(&bytes), 7000 + i as u16));
    }
    for i in 0..5u8 {
        let mut bytes = [0u8; 20];
        bytes[0] = 0x40;
        bytes[19] = i;
        table.insert(contacted_peer(Key::from_bytes(&bytes), 8000 + i as u16));
    }
    assert_eq!(table.peer_count(), K + 5);

    let mut target = [0u8; 20];
    target[0] = 0x80;
    let closest = table.closest_for(&Key::from_bytes(&target));
    assert_eq!(closest.len(), K);
}

#[test]
fn test_closest_for_own_key_falls_back_to_nearest_buckets() {
    let table = RoutingTable::new(Key::from_bytes(&[0u8; 20]));

    let mut far = [0u8; 20];
    far[0] = 0x80;
    table.insert(contacted_peer(Key::from_bytes(&far), 7000));

    let closest = table.closest_for(table.own_key());
    assert_eq!(closest.len(), 1);
}

#[test]
fn test_message_reply_echoes_id() {
    let peer = contacted_peer(Key::generate(), 7000);
    let request = Message::ping(&peer);
    let reply = Message::ping_reply(request.id.clone(), &peer);

    assert_eq!(request.id, reply.id);
    assert_eq!(request.kind(), MessageKind::PingRequest);
    assert_eq!(reply.kind(), MessageKind::PingResponse);
}

#[test]
fn test_message_requests_draw_fresh_ids() {
    let peer = contacted_peer(Key::generate(), 7000);
    let a = Message::ping(&peer);
    let b = Message::ping(&peer);

    assert_ne!(a.id, b.id);
}

#[test]
fn test_message_peers_travel_as_descriptors() {
    let source = contacted_peer(Key::generate(), 7000);
    let carried = contacted_peer(Key::generate(), 7001);

    let reply = Message::find_node_reply(random_call_id(), &source, vec![carried.clone()]);

    assert!(!reply.source.contacted());
    let peers = reply.carried_peers().unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].key, carried.key);
    assert!(!peers[0].contacted());
}

#[test]
fn test_find_node_request_carries_no_peers() {
    let peer = contacted_peer(Key::generate(), 7000);
    let request = Message::find_node(&peer, Key::generate());

    assert_eq!(request.kind(), MessageKind::FindNodeRequest);
    assert!(request.carried_peers().is_none());
}
