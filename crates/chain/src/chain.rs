use std::collections::HashSet;

use strata_codec::{hash_block, hash_header, hash_transaction};
use strata_crypto::{sign_block, verify_block, verify_transaction, Address, PrivateKey, PublicKey};
use strata_types::{Block, Hash32, Header, Transaction, TxOutput, Utxo};
use tracing::debug;

use crate::store::{
    utxo_key, BlockStorer, MemoryBlockStore, MemoryTxStore, MemoryUtxoStore, TxStorer, UtxoStorer,
};
use crate::{ChainError, ChainResult};

/// Seed of the identity that proposes the genesis block and owns its output.
pub const GENESIS_SEED: &str = "b927acba1ee5ebaf030af1a6ac2eb63922942ea39997ad7b2a23754cab1795d3";
pub const GENESIS_AMOUNT: u64 = 1000;

#[derive(Debug, Default)]
pub struct HeaderList {
    headers: Vec<Header>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, header: Header) {
        self.headers.push(header);
    }

    pub fn get(&self, height: u64) -> Option<&Header> {
        usize::try_from(height)
            .ok()
            .and_then(|idx| self.headers.get(idx))
    }

    /// One less than the number of headers; a list holding only genesis has height 0.
    pub fn height(&self) -> u64 {
        (self.headers.len() as u64).saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Hash-linked chain over a UTXO ledger.
///
/// `add_block` validates completely before it mutates anything, so a rejected
/// block leaves no trace. The chain is single-writer: callers sharing one
/// across tasks serialize `add_block` behind a lock.
pub struct Chain {
    block_store: Box<dyn BlockStorer>,
    tx_store: Box<dyn TxStorer>,
    utxo_store: Box<dyn UtxoStorer>,
    headers: HeaderList,
}

impl Chain {
    pub fn new(
        block_store: Box<dyn BlockStorer>,
        tx_store: Box<dyn TxStorer>,
        utxo_store: Box<dyn UtxoStorer>,
    ) -> ChainResult<Self> {
        Self::with_genesis(block_store, tx_store, utxo_store, GENESIS_SEED, GENESIS_AMOUNT)
    }

    pub fn in_memory() -> ChainResult<Self> {
        Self::new(
            Box::new(MemoryBlockStore::new()),
            Box::new(MemoryTxStore::new()),
            Box::new(MemoryUtxoStore::new()),
        )
    }

    /// Build a chain whose genesis block is proposed by `genesis_seed` and
    /// credits `amount` to that identity's address.
    pub fn with_genesis(
        block_store: Box<dyn BlockStorer>,
        tx_store: Box<dyn TxStorer>,
        utxo_store: Box<dyn UtxoStorer>,
        genesis_seed: &str,
        amount: u64,
    ) -> ChainResult<Self> {
        let key = PrivateKey::from_seed_hex(genesis_seed)?;
        let mut chain = Self {
            block_store,
            tx_store,
            utxo_store,
            headers: HeaderList::new(),
        };
        // genesis is committed without validation
        chain.commit(create_genesis_block(&key, amount))?;
        Ok(chain)
    }

    pub fn height(&self) -> u64 {
        self.headers.height()
    }

    pub fn add_block(&mut self, block: Block) -> ChainResult<()> {
        self.validate_block(&block)?;
        self.commit(block)
    }

    pub fn validate_block(&self, block: &Block) -> ChainResult<()> {
        if !verify_block(block) {
            return Err(ChainError::InvalidBlockSignature);
        }

        let tip = self.block_by_height(self.height())?;
        let tip_hash = hash_block(&tip);
        if tip_hash != block.header.prev_hash {
            return Err(ChainError::InvalidPrevHash {
                expected: hex::encode(tip_hash),
                got: hex::encode(block.header.prev_hash),
            });
        }

        let expected = self.height() + 1;
        if block.header.height != expected {
            return Err(ChainError::InvalidHeight {
                expected,
                got: block.header.height,
            });
        }

        let mut claimed = HashSet::new();
        let mut seen = HashSet::new();
        for tx in &block.transactions {
            let tx_hash = hash_transaction(tx);
            if !seen.insert(tx_hash) {
                return Err(ChainError::DuplicateTransaction(hex::encode(tx_hash)));
            }
            self.check_transaction(tx, &mut claimed)?;
        }
        Ok(())
    }

    pub fn validate_transaction(&self, tx: &Transaction) -> ChainResult<()> {
        self.check_transaction(tx, &mut HashSet::new())
    }

    // `claimed` collects the UTXO keys spent earlier in the same block.
    fn check_transaction(&self, tx: &Transaction, claimed: &mut HashSet<String>) -> ChainResult<()> {
        if !verify_transaction(tx) {
            return Err(ChainError::InvalidTransactionSignature(hex::encode(
                hash_transaction(tx),
            )));
        }

        // a committed transaction would rewrite its outputs as unspent
        let tx_hash = hex::encode(hash_transaction(tx));
        if self.tx_store.get(&tx_hash).is_ok() {
            return Err(ChainError::DuplicateTransaction(tx_hash));
        }

        let mut total_in: u128 = 0;
        for input in &tx.inputs {
            let key = utxo_key(&input.prev_tx_hash, input.prev_out_index);
            let utxo = self.utxo_store.get(&key)?;
            if utxo.spent || !claimed.insert(key.clone()) {
                return Err(ChainError::UtxoAlreadySpent(key));
            }
            // verify_transaction has already checked the key length
            let spender = PublicKey::from_bytes(&input.public_key).address();
            if spender.as_bytes() != utxo.address.as_slice() {
                return Err(ChainError::InputNotOwned(key));
            }
            total_in += u128::from(utxo.amount);
        }

        let total_out = tx.total_output();
        if total_in < total_out {
            return Err(ChainError::InsufficientInputs {
                inputs: total_in,
                outputs: total_out,
            });
        }
        Ok(())
    }

    fn commit(&mut self, block: Block) -> ChainResult<()> {
        for tx in &block.transactions {
            let tx_hash = hash_transaction(tx);
            self.tx_store.put(tx)?;

            for (index, output) in tx.outputs.iter().enumerate() {
                self.utxo_store.put(&Utxo {
                    tx_hash,
                    out_index: index as u32,
                    amount: output.amount,
                    address: output.address.clone(),
                    spent: false,
                })?;
            }
            for input in &tx.inputs {
                let mut utxo = self
                    .utxo_store
                    .get(&utxo_key(&input.prev_tx_hash, input.prev_out_index))?;
                utxo.spent = true;
                self.utxo_store.put(&utxo)?;
            }
            debug!(hash = %hex::encode(tx_hash), "new tx");
        }

        self.block_store.put(&block)?;
        // the tip only moves once the block is fully stored
        self.headers.add(block.header.clone());
        debug!(
            height = self.height(),
            hash = %hex::encode(hash_block(&block)),
            txs = block.transactions.len(),
            "block committed"
        );
        Ok(())
    }

    pub fn block_by_hash(&self, hash: &Hash32) -> ChainResult<Block> {
        self.block_store.get(&hex::encode(hash))
    }

    pub fn block_by_height(&self, height: u64) -> ChainResult<Block> {
        let header = self
            .headers
            .get(height)
            .ok_or_else(|| ChainError::BlockNotFound(format!("at height {height}")))?;
        self.block_by_hash(&hash_header(header))
    }

    pub fn tip(&self) -> ChainResult<Block> {
        self.block_by_height(self.height())
    }

    pub fn tx_by_hash(&self, hash: &Hash32) -> ChainResult<Transaction> {
        self.tx_store.get(&hex::encode(hash))
    }

    pub fn utxo(&self, tx_hash: &Hash32, index: u32) -> ChainResult<Utxo> {
        self.utxo_store.get(&utxo_key(tx_hash, index))
    }

    /// Sum of the unspent outputs paying `address`.
    pub fn balance(&self, address: &Address) -> ChainResult<u64> {
        Ok(self
            .utxo_store
            .list()?
            .iter()
            .filter(|u| !u.spent && u.address.as_slice() == address.as_bytes())
            .fold(0u64, |acc, u| acc.saturating_add(u.amount)))
    }
}

fn create_genesis_block(key: &PrivateKey, amount: u64) -> Block {
    let tx = Transaction::new(
        1,
        vec![],
        vec![TxOutput::new(amount, key.public().address().to_bytes())],
    );
    let mut block = Block::new(
        Header {
            version: 1,
            ..Default::default()
        },
        vec![tx],
    );
    sign_block(key, &mut block);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_list_height() {
        let mut list = HeaderList::new();
        assert!(list.is_empty());

        list.add(Header::default());
        assert_eq!(list.height(), 0);
        list.add(Header::default());
        assert_eq!(list.height(), 1);
        assert_eq!(list.len(), 2);
        assert!(list.get(1).is_some());
        assert!(list.get(2).is_none());
    }

    #[test]
    fn genesis_is_signed_and_credits_its_proposer() {
        let chain = Chain::in_memory().unwrap();
        let genesis = chain.block_by_height(0).unwrap();
        assert!(verify_block(&genesis));

        let owner = PrivateKey::from_seed_hex(GENESIS_SEED).unwrap();
        assert_eq!(chain.balance(&owner.public().address()).unwrap(), GENESIS_AMOUNT);

        let tx_hash = hash_transaction(&genesis.transactions[0]);
        let utxo = chain.utxo(&tx_hash, 0).unwrap();
        assert_eq!(utxo.amount, GENESIS_AMOUNT);
        assert!(!utxo.spent);
        assert_eq!(chain.tx_by_hash(&tx_hash).unwrap(), genesis.transactions[0]);
    }

    #[test]
    fn custom_genesis_seed() {
        let seed = "30df7d116d04af6b6869fd1407b37866f00c92359bc407290e1dfae6940afa34";
        let chain = Chain::with_genesis(
            Box::new(MemoryBlockStore::new()),
            Box::new(MemoryTxStore::new()),
            Box::new(MemoryUtxoStore::new()),
            seed,
            42,
        )
        .unwrap();

        let owner = PrivateKey::from_seed_hex(seed).unwrap().public().address();
        assert_eq!(chain.balance(&owner).unwrap(), 42);
    }

    #[test]
    fn invalid_genesis_seed() {
        let res = Chain::with_genesis(
            Box::new(MemoryBlockStore::new()),
            Box::new(MemoryTxStore::new()),
            Box::new(MemoryUtxoStore::new()),
            "not-hex",
            1,
        );
        assert!(matches!(res, Err(ChainError::Genesis(_))));
    }

    #[test]
    fn height_past_tip_is_not_found() {
        let chain = Chain::in_memory().unwrap();
        assert!(matches!(
            chain.block_by_height(1),
            Err(ChainError::BlockNotFound(_))
        ));
    }
}
