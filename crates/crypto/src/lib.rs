pub mod keys;

pub use keys::{
    Address, KeyError, PrivateKey, PublicKey, Signature, ADDRESS_LEN, PRIVATE_KEY_LEN,
    PUBLIC_KEY_LEN, SEED_LEN, SIGNATURE_LEN,
};

use strata_codec::{hash_block, hash_transaction_unsigned, merkle_root};
use strata_types::{Block, Transaction};

/// Sign a block as its proposer.
///
/// The Merkle root is embedded into the header first (when there are
/// transactions) so that the signature covers it. The proposer public key and
/// the signature are stored on the block.
pub fn sign_block(key: &PrivateKey, block: &mut Block) -> Signature {
    if let Some(root) = merkle_root(&block.transactions) {
        block.header.root_hash = root;
    }

    let sig = key.sign(&hash_block(block));
    block.public_key = key.public().to_bytes().to_vec();
    block.signature = sig.to_bytes().to_vec();
    sig
}

pub fn verify_root_hash(block: &Block) -> bool {
    merkle_root(&block.transactions) == Some(block.header.root_hash)
}

pub fn verify_block(block: &Block) -> bool {
    if !block.transactions.is_empty() && !verify_root_hash(block) {
        return false;
    }
    if block.public_key.len() != PUBLIC_KEY_LEN || block.signature.len() != SIGNATURE_LEN {
        return false;
    }

    let sig = Signature::from_bytes(&block.signature);
    let public_key = PublicKey::from_bytes(&block.public_key);
    sig.verify(&hash_block(block), &public_key)
}

/// Inputs sign the transaction digest with every input signature cleared,
/// so signatures can be attached in any order.
pub fn sign_transaction(key: &PrivateKey, tx: &Transaction) -> Signature {
    key.sign(&hash_transaction_unsigned(tx))
}

/// Attach `key`'s signature to every input that carries `key`'s public key.
/// Returns the number of inputs signed.
pub fn sign_inputs(key: &PrivateKey, tx: &mut Transaction) -> usize {
    let sig = sign_transaction(key, tx).to_bytes();
    let public = key.public().to_bytes();

    let mut signed = 0;
    for input in tx
        .inputs
        .iter_mut()
        .filter(|input| input.public_key == public)
    {
        input.signature = sig.to_vec();
        signed += 1;
    }
    signed
}

/// Every input's signature must verify against its own public key.
/// Wrong-length keys or signatures fail verification rather than panic,
/// since transactions arrive from the network.
pub fn verify_transaction(tx: &Transaction) -> bool {
    let hash = hash_transaction_unsigned(tx);

    tx.inputs.iter().all(|input| {
        if input.public_key.len() != PUBLIC_KEY_LEN || input.signature.len() != SIGNATURE_LEN {
            return false;
        }
        let sig = Signature::from_bytes(&input.signature);
        let public_key = PublicKey::from_bytes(&input.public_key);
        sig.verify(&hash, &public_key)
    })
}
