//! JSON-RPC surface every node serves and dials.

use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::error::{ErrorObject, ErrorObjectOwned, INTERNAL_ERROR_CODE};
use serde::{Deserialize, Serialize};
use strata_types::Transaction;

use crate::NodeError;

/// Handshake payload, sent as the request and returned as the reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub version: String,
    pub height: u64,
    pub listen_addr: String,
    #[serde(default)]
    pub peer_list: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {}

#[rpc(server, client, namespace = "node")]
pub trait NodeApi {
    /// Peer discovery exchange.
    #[method(name = "handshake")]
    async fn handshake(&self, version: Version) -> RpcResult<Version>;

    /// Submit a transaction for the mempool and gossip. Returns before gossip completes.
    #[method(name = "handleTransaction")]
    async fn handle_transaction(&self, tx: Transaction) -> RpcResult<Ack>;

    #[method(name = "height")]
    async fn height(&self) -> RpcResult<u64>;
}

impl From<NodeError> for ErrorObjectOwned {
    fn from(err: NodeError) -> Self {
        ErrorObject::owned(INTERNAL_ERROR_CODE, err.to_string(), None::<()>)
    }
}
