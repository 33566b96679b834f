use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use parking_lot::RwLock;

use crate::rpc::Version;
use crate::NodeError;

/// Accepts Go-style `:3000` as shorthand for `127.0.0.1:3000`.
pub fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("127.0.0.1{addr}")
    } else {
        addr.to_string()
    }
}

pub fn make_client(addr: &str, timeout: Duration) -> Result<HttpClient, NodeError> {
    let url = format!("http://{}", normalize_addr(addr));
    HttpClientBuilder::default()
        .request_timeout(timeout)
        .build(url)
        .map_err(|source| NodeError::Dial {
            addr: addr.to_string(),
            source,
        })
}

#[derive(Clone)]
pub struct Peer {
    pub client: Arc<HttpClient>,
    /// Handshake last exchanged with this peer.
    pub version: Version,
}

/// Live peers keyed by their advertised listen address.
#[derive(Default)]
pub struct PeerSet {
    peers: RwLock<HashMap<String, Peer>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the peer, replacing an earlier entry for the same address.
    pub fn add(&self, client: HttpClient, version: Version) {
        let peer = Peer {
            client: Arc::new(client),
            version,
        };
        self.peers
            .write()
            .insert(peer.version.listen_addr.clone(), peer);
    }

    pub fn delete(&self, addr: &str) -> Option<Peer> {
        self.peers.write().remove(addr)
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.peers.read().contains_key(addr)
    }

    /// Advertised listen addresses of every peer.
    pub fn list(&self) -> Vec<String> {
        self.peers.read().keys().cloned().collect()
    }

    /// Snapshot taken under the read lock; callers dial peers without holding it.
    pub fn snapshot(&self) -> Vec<Peer> {
        self.peers.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}
