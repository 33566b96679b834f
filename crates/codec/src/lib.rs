use sha2::{Digest, Sha256};
use strata_types::{Block, Hash32, Header, Transaction, TxInput, TxOutput};
use thiserror::Error;

pub mod merkle;

pub use merkle::{merkle_root, MerkleTree};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("length does not fit in a u32 prefix")]
    LengthOverflow,
}

fn write_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_i64_le(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_32(out: &mut Vec<u8>, v: &[u8; 32]) {
    out.extend_from_slice(v);
}

fn write_len(out: &mut Vec<u8>, len: usize) -> Result<(), CodecError> {
    let len_u32: u32 = len.try_into().map_err(|_| CodecError::LengthOverflow)?;
    write_u32_le(out, len_u32);
    Ok(())
}

fn write_bytes(out: &mut Vec<u8>, b: &[u8]) -> Result<(), CodecError> {
    write_len(out, b.len())?;
    out.extend_from_slice(b);
    Ok(())
}

fn write_input(out: &mut Vec<u8>, input: &TxInput) -> Result<(), CodecError> {
    write_32(out, &input.prev_tx_hash);
    write_u32_le(out, input.prev_out_index);
    write_bytes(out, &input.public_key)?;
    write_bytes(out, &input.signature)
}

fn write_output(out: &mut Vec<u8>, output: &TxOutput) -> Result<(), CodecError> {
    write_u64_le(out, output.amount);
    write_bytes(out, &output.address)
}

/// Canonical encoding of a block header.
/// Field order is CONSENSUS-RELEVANT. Changing it is a hard fork.
pub fn encode_header(h: &Header) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(4 + 8 + 32 + 32 + 8);
    write_u32_le(&mut out, h.version);
    write_u64_le(&mut out, h.height);
    write_32(&mut out, &h.prev_hash);
    write_32(&mut out, &h.root_hash);
    write_i64_le(&mut out, h.timestamp);
    Ok(out)
}

/// Canonical encoding of a transaction, including whatever input signatures are set.
pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    write_u32_le(&mut out, tx.version);
    write_len(&mut out, tx.inputs.len())?;
    for input in &tx.inputs {
        write_input(&mut out, input)?;
    }
    write_len(&mut out, tx.outputs.len())?;
    for output in &tx.outputs {
        write_output(&mut out, output)?;
    }
    Ok(out)
}

pub fn sha256(data: &[u8]) -> Hash32 {
    Sha256::digest(data).into()
}

/// Digest of a canonically encoded header.
///
/// # Panics
///
/// Never in practice: a header has no variable-length fields.
pub fn hash_header(header: &Header) -> Hash32 {
    let bytes = encode_header(header).expect("header encoding has fixed length");
    sha256(&bytes)
}

/// A block is identified by its header alone; transactions enter through `root_hash`.
pub fn hash_block(block: &Block) -> Hash32 {
    hash_header(&block.header)
}

/// # Panics
///
/// If a field is longer than `u32::MAX` bytes, which no well-formed transaction is.
pub fn hash_transaction(tx: &Transaction) -> Hash32 {
    let bytes = encode_transaction(tx).expect("transaction fields exceed u32 length");
    sha256(&bytes)
}

/// Digest of the transaction with every input signature cleared.
/// This is the message each input signs.
pub fn hash_transaction_unsigned(tx: &Transaction) -> Hash32 {
    hash_transaction(&tx.without_signatures())
}
