use serde::{Deserialize, Serialize};

/// SHA-256 digest used for block, header and transaction identifiers.
pub type Hash32 = [u8; 32];

/// All-zero digest; marks an absent `prev_hash` (genesis) or `root_hash` (no transactions).
pub const ZERO_HASH: Hash32 = [0u8; 32];

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_tx_hash: Hash32,
    pub prev_out_index: u32,
    pub public_key: Vec<u8>,
    /// Empty until the spender attaches its signature.
    #[serde(default)]
    pub signature: Vec<u8>,
}

impl TxInput {
    pub fn new(prev_tx_hash: Hash32, prev_out_index: u32, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            prev_tx_hash,
            prev_out_index,
            public_key: public_key.into(),
            signature: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxOutput {
    pub amount: u64,
    pub address: Vec<u8>,
}

impl TxOutput {
    pub fn new(amount: u64, address: impl Into<Vec<u8>>) -> Self {
        Self {
            amount,
            address: address.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    pub fn new(version: u32, inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            version,
            inputs,
            outputs,
        }
    }

    /// Copy of this transaction with every input signature cleared.
    pub fn without_signatures(&self) -> Self {
        let mut tx = self.clone();
        for input in &mut tx.inputs {
            input.signature.clear();
        }
        tx
    }

    pub fn total_output(&self) -> u128 {
        self.outputs.iter().map(|o| u128::from(o.amount)).sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub height: u64,
    pub prev_hash: Hash32,
    pub root_hash: Hash32,
    pub timestamp: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    /// Proposer public key, set by block signing.
    #[serde(default)]
    pub public_key: Vec<u8>,
    #[serde(default)]
    pub signature: Vec<u8>,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            public_key: Vec::new(),
            signature: Vec::new(),
            transactions,
        }
    }
}

/// One record per transaction output ever accepted into the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: Hash32,
    pub out_index: u32,
    pub amount: u64,
    pub address: Vec<u8>,
    pub spent: bool,
}
