//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 / HASH160 hashing
//! - secp256k1 signer keys and the identities derived from them

pub mod hash;
pub mod keys;

pub use hash::{hash160, sha256, sha256_hex};
pub use keys::{public_key_from_hex, public_key_to_address, KeyError, KeyPair};
