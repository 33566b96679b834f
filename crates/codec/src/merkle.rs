//! Binary Merkle tree over transaction hashes.
//!
//! Leaves keep input order. A node without a right sibling is paired with
//! itself, including a lone leaf, so every root is at least one hash deep.

use sha2::{Digest, Sha256};
use strata_types::{Hash32, Transaction};

use crate::hash_transaction;

fn hash_pair(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    // levels[0] holds the leaves, the last level holds the root alone.
    levels: Vec<Vec<Hash32>>,
}

impl MerkleTree {
    /// Returns `None` for an empty leaf set.
    pub fn from_leaves(leaves: Vec<Hash32>) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }

        let mut levels = vec![leaves];
        loop {
            let current = &levels[levels.len() - 1];
            let next: Vec<Hash32> = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    [single] => hash_pair(single, single),
                    _ => unreachable!("chunks(2) yields one or two items"),
                })
                .collect();
            let done = next.len() == 1;
            levels.push(next);
            if done {
                break;
            }
        }

        Some(Self { levels })
    }

    pub fn from_transactions(txs: &[Transaction]) -> Option<Self> {
        Self::from_leaves(txs.iter().map(hash_transaction).collect())
    }

    pub fn root(&self) -> Hash32 {
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaves(&self) -> &[Hash32] {
        &self.levels[0]
    }

    /// Sibling path from leaf `index` up to (not including) the root.
    pub fn proof(&self, index: usize) -> Option<Vec<Hash32>> {
        if index >= self.levels[0].len() {
            return None;
        }

        let mut idx = index;
        let mut path = Vec::with_capacity(self.levels.len() - 1);
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = level.get(idx ^ 1).unwrap_or(&level[idx]);
            path.push(*sibling);
            idx >>= 1;
        }
        Some(path)
    }

    pub fn verify_proof(leaf: &Hash32, index: usize, proof: &[Hash32], root: &Hash32) -> bool {
        let mut idx = index;
        let mut acc = *leaf;
        for sibling in proof {
            acc = if idx % 2 == 0 {
                hash_pair(&acc, sibling)
            } else {
                hash_pair(sibling, &acc)
            };
            idx >>= 1;
        }
        idx == 0 && acc == *root
    }
}

/// Merkle root over `hash_transaction` of each transaction; `None` when empty.
pub fn merkle_root(txs: &[Transaction]) -> Option<Hash32> {
    MerkleTree::from_transactions(txs).map(|tree| tree.root())
}
