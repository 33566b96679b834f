//! Ed25519 identities: private keys, public keys, signatures and addresses.
//!
//! The `from_bytes` constructors sit on trusted internal boundaries and panic
//! on a length mismatch. Callers handling untrusted input check lengths first.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand_core::OsRng;
use thiserror::Error;

pub const SEED_LEN: usize = 32;
/// Seed followed by the public key.
pub const PRIVATE_KEY_LEN: usize = 64;
pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
pub const ADDRESS_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
}

fn fixed<const N: usize>(bytes: &[u8], what: &str) -> [u8; N] {
    bytes
        .try_into()
        .unwrap_or_else(|_| panic!("invalid {what} length: expected {N}, got {}", bytes.len()))
}

#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
}

impl PrivateKey {
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// Deterministic key from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(seed_hex).map_err(|e| KeyError::InvalidSeed(e.to_string()))?;
        let seed: [u8; SEED_LEN] = bytes.as_slice().try_into().map_err(|_| {
            KeyError::InvalidSeed(format!("expected {SEED_LEN} bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    /// # Panics
    ///
    /// If `bytes` is not `PRIVATE_KEY_LEN` long or its public half does not match the seed.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let raw: [u8; PRIVATE_KEY_LEN] = fixed(bytes, "private key");
        let key = SigningKey::from_keypair_bytes(&raw)
            .unwrap_or_else(|e| panic!("inconsistent private key bytes: {e}"));
        Self { key }
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.key.to_keypair_bytes()
    }

    pub fn public(&self) -> PublicKey {
        PublicKey {
            bytes: self.key.verifying_key().to_bytes(),
        }
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        Signature {
            bytes: self.key.sign(msg).to_bytes(),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public", &self.public())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LEN],
}

impl PublicKey {
    /// # Panics
    ///
    /// If `bytes` is not `PUBLIC_KEY_LEN` long.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: fixed(bytes, "public key"),
        }
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.bytes
    }

    /// The trailing `ADDRESS_LEN` bytes of the key.
    pub fn address(&self) -> Address {
        Address::from_bytes(&self.bytes[PUBLIC_KEY_LEN - ADDRESS_LEN..])
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.bytes))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.bytes))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; SIGNATURE_LEN],
}

impl Signature {
    /// # Panics
    ///
    /// If `bytes` is not `SIGNATURE_LEN` long.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: fixed(bytes, "signature"),
        }
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.bytes
    }

    /// False on a wrong message, a wrong key, or a key that is not a curve point.
    pub fn verify(&self, msg: &[u8], public_key: &PublicKey) -> bool {
        let Ok(vk) = VerifyingKey::from_bytes(&public_key.bytes) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&self.bytes);
        vk.verify_strict(msg, &sig).is_ok()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.bytes))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    bytes: [u8; ADDRESS_LEN],
}

impl Address {
    /// # Panics
    ///
    /// If `bytes` is not `ADDRESS_LEN` long.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: fixed(bytes, "address"),
        }
    }

    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        self.bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.bytes))
    }
}
