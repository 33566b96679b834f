//! The ledger: an append-only header list plus block, transaction and UTXO
//! stores, extended only by blocks that pass validation.

use strata_crypto::KeyError;
use thiserror::Error;

mod chain;
pub mod store;

pub use chain::{Chain, HeaderList, GENESIS_AMOUNT, GENESIS_SEED};
pub use store::{
    utxo_key, BlockStorer, MemoryBlockStore, MemoryTxStore, MemoryUtxoStore, TxStorer, UtxoStorer,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("invalid block signature")]
    InvalidBlockSignature,
    #[error("invalid previous block hash: expected {expected}, got {got}")]
    InvalidPrevHash { expected: String, got: String },
    #[error("invalid block height: expected {expected}, got {got}")]
    InvalidHeight { expected: u64, got: u64 },
    #[error("invalid signature on transaction {0}")]
    InvalidTransactionSignature(String),
    #[error("transaction {0} is already in the ledger")]
    DuplicateTransaction(String),
    #[error("utxo {0} does not exist")]
    UtxoNotFound(String),
    #[error("utxo {0} is already spent")]
    UtxoAlreadySpent(String),
    #[error("input spending utxo {0} is not signed by its owner")]
    InputNotOwned(String),
    #[error("insufficient input value: inputs {inputs} < outputs {outputs}")]
    InsufficientInputs { inputs: u128, outputs: u128 },
    #[error("block {0} does not exist")]
    BlockNotFound(String),
    #[error("transaction {0} does not exist")]
    TxNotFound(String),
    #[error("invalid genesis identity: {0}")]
    Genesis(#[from] KeyError),
}

pub type ChainResult<T> = Result<T, ChainError>;
