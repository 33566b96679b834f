use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use strata_codec::hash_transaction;
use strata_types::{Hash32, Transaction};

#[derive(Default)]
struct Pool {
    by_id: HashMap<Hash32, Transaction>,
    order: VecDeque<Hash32>,
}

/// Pending transactions keyed by transaction hash.
///
/// Notes:
/// - Each hash is admitted at most once while it is pending.
/// - `clear()` hands back everything in insertion order and empties the pool
///   under one write lock, so a concurrent `add` lands either in that batch or
///   in the next one, never both.
#[derive(Default)]
pub struct Mempool {
    inner: RwLock<Pool>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the mempool currently holds this transaction.
    pub fn has(&self, tx: &Transaction) -> bool {
        self.contains(&hash_transaction(tx))
    }

    pub fn contains(&self, id: &Hash32) -> bool {
        self.inner.read().by_id.contains_key(id)
    }

    /// Insert a transaction. Returns false, leaving the pool unchanged, for a duplicate.
    pub fn add(&self, tx: Transaction) -> bool {
        let id = hash_transaction(&tx);

        let mut pool = self.inner.write();
        if pool.by_id.contains_key(&id) {
            return false;
        }
        pool.by_id.insert(id, tx);
        pool.order.push_back(id);
        true
    }

    /// Remove and return every pending transaction, oldest first.
    pub fn clear(&self) -> Vec<Transaction> {
        let mut pool = self.inner.write();
        let Pool { by_id, order } = &mut *pool;

        let mut out = Vec::with_capacity(order.len());
        for id in order.drain(..) {
            if let Some(tx) = by_id.remove(&id) {
                out.push(tx);
            }
        }
        out
    }

    /// Number of currently-pending transactions.
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_id.is_empty()
    }
}
