use std::collections::HashMap;

use url::Url;

use crate::fetch::SegmentRequest;

/// Advisory lookup of a peer holding a copy of a segment.
///
/// A returned URL replaces the origin for that single download; `None`
/// falls back to the origin.
#[expect(async_fn_in_trait)]
pub trait PeerResolver {
    async fn resolve(&self, request: &SegmentRequest) -> Option<Url>;
}

/// Always downloads from the origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPeers;

impl PeerResolver for NoPeers {
    async fn resolve(&self, _request: &SegmentRequest) -> Option<Url> {
        None
    }
}

/// Fixed origin-to-peer URL map.
#[derive(Clone, Debug, Default)]
pub struct PeerTable {
    peers: HashMap<Url, Url>,
}

impl PeerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, origin: Url, peer: Url) {
        self.peers.insert(origin, peer);
    }
}

impl PeerResolver for PeerTable {
    async fn resolve(&self, request: &SegmentRequest) -> Option<Url> {
        self.peers.get(&request.url).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn table_redirects_known_segments_only() {
        let origin = Url::parse("http://origin.test/seg_1.m4s").unwrap();
        let peer = Url::parse("http://peer.test/seg_1.m4s").unwrap();
        let mut table = PeerTable::new();
        table.insert(origin.clone(), peer.clone());

        assert_eq!(table.resolve(&SegmentRequest::new(origin)).await, Some(peer));
        let other = Url::parse("http://origin.test/seg_2.m4s").unwrap();
        assert_eq!(table.resolve(&SegmentRequest::new(other.clone())).await, None);
        assert_eq!(NoPeers.resolve(&SegmentRequest::new(other)).await, None);
    }
}
