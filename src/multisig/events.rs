//! Wallet event log
//!
//! Events are appended only for committed state changes. An approval that
//! was discarded because execution failed leaves no event behind.
//!
//! Amounts are written as decimal strings: serde buffers the tagged,
//! flattened layout before decoding and that buffer cannot hold a `u128`.

use crate::core::Address;
use crate::multisig::transaction::Asset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEventKind {
    TransactionInitiated {
        id: u64,
        initiator: Address,
        asset: Asset,
        recipient: Address,
        #[serde(with = "decimal")]
        amount: u128,
    },
    TransactionApproved {
        id: u64,
        signer: Address,
        approval_count: usize,
    },
    TransactionExecuted {
        id: u64,
        asset: Asset,
        recipient: Address,
        #[serde(with = "decimal")]
        amount: u128,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WalletEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: WalletEventKind,
}

impl WalletEvent {
    pub fn now(kind: WalletEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Transaction the event refers to
    pub fn transaction_id(&self) -> u64 {
        match &self.kind {
            WalletEventKind::TransactionInitiated { id, .. }
            | WalletEventKind::TransactionApproved { id, .. }
            | WalletEventKind::TransactionExecuted { id, .. } => *id,
        }
    }
}

mod decimal {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
