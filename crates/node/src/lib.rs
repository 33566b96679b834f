//! Peer-to-peer node: handshake discovery, transaction gossip through the
//! mempool, and the timed validator loop.

use jsonrpsee::core::client::Error as ClientError;
use strata_chain::ChainError;
use strata_crypto::KeyError;
use thiserror::Error;

pub mod config;
pub mod node;
pub mod peers;
pub mod rpc;

pub use config::NodeConfig;
pub use node::{Gossip, Node, NodeHandle};
pub use peers::{Peer, PeerSet};
pub use rpc::{Ack, NodeApiClient, NodeApiServer, Version};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid key: {0}")]
    Key(#[from] KeyError),
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to dial {addr}: {source}")]
    Dial { addr: String, source: ClientError },
    #[error("rpc to {addr} failed: {source}")]
    Rpc { addr: String, source: ClientError },
}
