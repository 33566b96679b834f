//! Storage capabilities behind the chain. Keys are lowercase hex digests;
//! UTXO keys append `_<output index>`.

use std::collections::HashMap;

use parking_lot::RwLock;
use strata_codec::{hash_block, hash_transaction};
use strata_types::{Block, Hash32, Transaction, Utxo};

use crate::{ChainError, ChainResult};

pub fn utxo_key(tx_hash: &Hash32, index: u32) -> String {
    format!("{}_{}", hex::encode(tx_hash), index)
}

pub trait BlockStorer: Send + Sync {
    fn put(&self, block: &Block) -> ChainResult<()>;
    fn get(&self, hash: &str) -> ChainResult<Block>;
}

pub trait TxStorer: Send + Sync {
    fn put(&self, tx: &Transaction) -> ChainResult<()>;
    fn get(&self, hash: &str) -> ChainResult<Transaction>;
}

pub trait UtxoStorer: Send + Sync {
    /// Insert or overwrite the entry under `utxo_key(tx_hash, out_index)`.
    fn put(&self, utxo: &Utxo) -> ChainResult<()>;
    fn get(&self, key: &str) -> ChainResult<Utxo>;
    fn list(&self) -> ChainResult<Vec<Utxo>>;
}

#[derive(Default)]
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<String, Block>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStorer for MemoryBlockStore {
    fn put(&self, block: &Block) -> ChainResult<()> {
        let hash = hex::encode(hash_block(block));
        self.blocks.write().insert(hash, block.clone());
        Ok(())
    }

    fn get(&self, hash: &str) -> ChainResult<Block> {
        self.blocks
            .read()
            .get(hash)
            .cloned()
            .ok_or_else(|| ChainError::BlockNotFound(hash.to_string()))
    }
}

#[derive(Default)]
pub struct MemoryTxStore {
    txs: RwLock<HashMap<String, Transaction>>,
}

impl MemoryTxStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TxStorer for MemoryTxStore {
    fn put(&self, tx: &Transaction) -> ChainResult<()> {
        let hash = hex::encode(hash_transaction(tx));
        self.txs.write().insert(hash, tx.clone());
        Ok(())
    }

    fn get(&self, hash: &str) -> ChainResult<Transaction> {
        self.txs
            .read()
            .get(hash)
            .cloned()
            .ok_or_else(|| ChainError::TxNotFound(hash.to_string()))
    }
}

#[derive(Default)]
pub struct MemoryUtxoStore {
    utxos: RwLock<HashMap<String, Utxo>>,
}

impl MemoryUtxoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UtxoStorer for MemoryUtxoStore {
    fn put(&self, utxo: &Utxo) -> ChainResult<()> {
        let key = utxo_key(&utxo.tx_hash, utxo.out_index);
        self.utxos.write().insert(key, utxo.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> ChainResult<Utxo> {
        self.utxos
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ChainError::UtxoNotFound(key.to_string()))
    }

    fn list(&self) -> ChainResult<Vec<Utxo>> {
        Ok(self.utxos.read().values().cloned().collect())
    }
}
