use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::http_client::HttpClient;
use jsonrpsee::server::{Server, ServerHandle};
use mempool::Mempool;
use parking_lot::RwLock;
use strata_chain::Chain;
use strata_codec::hash_transaction;
use strata_crypto::PrivateKey;
use strata_types::{Block, Transaction};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::NodeConfig;
use crate::peers::{make_client, normalize_addr, PeerSet};
use crate::rpc::{Ack, NodeApiClient, NodeApiServer, Version};
use crate::NodeError;

/// Messages fanned out to every peer.
#[derive(Clone, Debug)]
pub enum Gossip {
    Transaction(Transaction),
}

struct Inner {
    config: NodeConfig,
    private_key: Option<PrivateKey>,
    // advertised address; the bound address once started
    listen_addr: RwLock<String>,
    peers: PeerSet,
    mempool: Mempool,
    chain: Mutex<Chain>,
    // flipped once by `NodeHandle::stop`; every background task watches it
    shutdown: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct Node {
    inner: Arc<Inner>,
}

/// Returned by [`Node::start`]. Stopping it shuts the RPC server down and
/// cancels every background task the node spawned: bootstrap dials, gossip
/// fan-outs and the validator loop.
pub struct NodeHandle {
    local_addr: SocketAddr,
    server: ServerHandle,
    node: Node,
}

impl NodeHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn stop(self) {
        self.node.inner.shutdown.send_replace(true);
        if self.server.stop().is_ok() {
            self.server.stopped().await;
        }
        debug!(listen_addr = %self.local_addr, "node stopped");
    }
}

impl Node {
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_chain(config, Chain::in_memory()?)
    }

    pub fn with_chain(config: NodeConfig, chain: Chain) -> Result<Self, NodeError> {
        let private_key = config.validator_key()?;
        let listen_addr = normalize_addr(&config.listen_addr);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                private_key,
                listen_addr: RwLock::new(listen_addr),
                peers: PeerSet::new(),
                mempool: Mempool::new(),
                chain: Mutex::new(chain),
                shutdown: watch::channel(false).0,
            }),
        })
    }

    /// Bind the RPC server, then bootstrap against the configured peers and,
    /// for validators, start the validator loop.
    pub async fn start(&self) -> Result<NodeHandle, NodeError> {
        let server = Server::builder().build(self.listen_addr()).await?;
        let local_addr = server.local_addr()?;
        *self.inner.listen_addr.write() = local_addr.to_string();

        let server = server.start(self.clone().into_rpc());
        info!(listen_addr = %local_addr, version = %self.inner.config.version, "node started");

        let bootstrap: Vec<String> = self
            .inner
            .config
            .bootstrap
            .iter()
            .map(|addr| normalize_addr(addr))
            .collect();
        if !bootstrap.is_empty() {
            let node = self.clone();
            self.spawn(async move { node.bootstrap_network(bootstrap).await });
        }

        if self.inner.private_key.is_some() {
            let node = self.clone();
            self.spawn(async move { node.validator_loop().await });
        }

        Ok(NodeHandle {
            local_addr,
            server,
            node: self.clone(),
        })
    }

    /// Run `task` in the background until it finishes or the node stops.
    /// Nothing is spawned once the node has stopped.
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown = self.inner.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }
        tokio::spawn(async move {
            tokio::select! {
                _ = task => {}
                _ = shutdown.wait_for(|stopped| *stopped) => {}
            }
        });
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    pub fn listen_addr(&self) -> String {
        self.inner.listen_addr.read().clone()
    }

    pub fn peers(&self) -> &PeerSet {
        &self.inner.peers
    }

    pub fn peer_list(&self) -> Vec<String> {
        self.inner.peers.list()
    }

    pub fn mempool(&self) -> &Mempool {
        &self.inner.mempool
    }

    pub async fn height(&self) -> u64 {
        self.inner.chain.lock().await.height()
    }

    pub async fn tip(&self) -> Result<Block, NodeError> {
        Ok(self.inner.chain.lock().await.tip()?)
    }

    /// Validate and append a block. Calls are serialized on the chain lock.
    pub async fn add_block(&self, block: Block) -> Result<(), NodeError> {
        let mut chain = self.inner.chain.lock().await;
        chain.add_block(block)?;
        info!(height = chain.height(), "block added");
        Ok(())
    }

    /// Insert into the mempool and, when new, gossip in the background.
    /// Returns whether the transaction was new.
    pub fn ingest_transaction(&self, tx: Transaction) -> bool {
        let hash = hex::encode(hash_transaction(&tx));
        if !self.inner.mempool.add(tx.clone()) {
            return false;
        }

        debug!(%hash, we = %self.listen_addr(), "received tx");
        let node = self.clone();
        self.spawn(async move {
            if let Err(err) = node.broadcast(&Gossip::Transaction(tx)).await {
                error!(%err, %hash, "broadcast failure");
            }
        });
        true
    }

    /// Send `msg` to every peer in turn. The first failing peer ends the fan-out.
    pub async fn broadcast(&self, msg: &Gossip) -> Result<(), NodeError> {
        for peer in self.inner.peers.snapshot() {
            let addr = peer.version.listen_addr.clone();
            match msg {
                Gossip::Transaction(tx) => {
                    peer.client
                        .handle_transaction(tx.clone())
                        .await
                        .map_err(|source| NodeError::Rpc { addr, source })?;
                }
            }
        }
        Ok(())
    }

    /// Record a peer. A non-empty peer list in its handshake triggers a
    /// background bootstrap against those addresses.
    pub fn add_peer(&self, client: HttpClient, version: Version) {
        let peer_list = version.peer_list.clone();
        debug!(
            we = %self.listen_addr(),
            remote = %version.listen_addr,
            height = version.height,
            "new peer connected"
        );
        self.inner.peers.add(client, version);

        if !peer_list.is_empty() {
            let node = self.clone();
            self.spawn(async move { node.bootstrap_network(peer_list).await });
        }
    }

    pub fn delete_peer(&self, addr: &str) {
        if self.inner.peers.delete(addr).is_some() {
            debug!(we = %self.listen_addr(), remote = %addr, "peer removed");
        }
    }

    /// Handshake with each address we are not yet linked to. A failed address
    /// is logged and skipped.
    pub async fn bootstrap_network(&self, addrs: Vec<String>) {
        for addr in addrs {
            if !self.can_connect_with(&addr) {
                continue;
            }
            debug!(we = %self.listen_addr(), remote = %addr, "dialing remote node");

            match self.dial_remote_node(&addr).await {
                Ok((client, version)) => self.add_peer(client, version),
                Err(err) => warn!(%err, remote = %addr, "bootstrap failed"),
            }
        }
    }

    async fn dial_remote_node(&self, addr: &str) -> Result<(HttpClient, Version), NodeError> {
        let client = make_client(addr, self.inner.config.rpc_timeout())?;
        let version = client
            .handshake(self.version().await)
            .await
            .map_err(|source| NodeError::Rpc {
                addr: addr.to_string(),
                source,
            })?;
        Ok((client, version))
    }

    async fn version(&self) -> Version {
        Version {
            version: self.inner.config.version.clone(),
            height: self.height().await,
            listen_addr: self.listen_addr(),
            peer_list: self.peer_list(),
        }
    }

    fn can_connect_with(&self, addr: &str) -> bool {
        addr != self.listen_addr() && !self.inner.peers.contains(addr)
    }

    async fn validator_loop(&self) {
        let Some(key) = &self.inner.private_key else {
            return;
        };
        let block_time = self.inner.config.block_time();
        info!(pubkey = %key.public(), ?block_time, "starting validator loop");

        let mut ticker = tokio::time::interval(block_time);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let txs = self.inner.mempool.clear();
            debug!(len_tx = txs.len(), "time to create a new block");
        }
    }
}

#[async_trait]
impl NodeApiServer for Node {
    async fn handshake(&self, version: Version) -> RpcResult<Version> {
        let addr = normalize_addr(&version.listen_addr);
        if addr == self.listen_addr() {
            warn!(remote = %addr, "handshake claims our own address, not recording it");
            return Ok(self.version().await);
        }

        let client = make_client(&addr, self.inner.config.rpc_timeout())?;
        self.add_peer(
            client,
            Version {
                listen_addr: addr,
                ..version
            },
        );
        Ok(self.version().await)
    }

    async fn handle_transaction(&self, tx: Transaction) -> RpcResult<Ack> {
        self.ingest_transaction(tx);
        Ok(Ack::default())
    }

    async fn height(&self) -> RpcResult<u64> {
        Ok(Node::height(self).await)
    }
}
