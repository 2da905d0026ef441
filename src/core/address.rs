//! Account identities
//!
//! Signers, recipients, assets and the custody wallet itself are all
//! identified by an [`Address`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the hex body of a derived address (20 bytes)
pub const ADDRESS_HEX_LEN: usize = 40;

/// An account identity, stored lowercase
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an address from any string form
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_lowercase())
    }

    /// The null identity (`0x` followed by 40 zeros)
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(ADDRESS_HEX_LEN)))
    }

    /// Build an address from raw hash bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Whether this is the null identity
    ///
    /// Empty strings and `0x`-prefixed all-zero strings both count as null.
    pub fn is_zero(&self) -> bool {
        if self.0.is_empty() {
            return true;
        }
        match self.0.strip_prefix("0x") {
            Some(body) => body.chars().all(|c| c == '0'),
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
