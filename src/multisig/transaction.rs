//! Transfer proposals awaiting quorum
//!
//! A [`Transaction`] moves a fixed amount of one asset to one recipient. It
//! collects signer approvals until the quorum is reached, at which point it
//! is executed and becomes immutable.

use crate::core::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which ledger a transfer moves funds on
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Native,
    ExternalAsset,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Native => f.write_str("native"),
            AssetKind::ExternalAsset => f.write_str("external-asset"),
        }
    }
}

/// The asset being transferred
///
/// External assets carry the token address on the asset ledger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "asset_id", rename_all = "snake_case")]
pub enum Asset {
    Native,
    External(Address),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Native => AssetKind::Native,
            Asset::External(_) => AssetKind::ExternalAsset,
        }
    }

    /// Token address for external assets
    pub fn asset_id(&self) -> Option<&Address> {
        match self {
            Asset::Native => None,
            Asset::External(id) => Some(id),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::External(id) => write!(f, "asset:{}", id),
        }
    }
}

/// Lifecycle of a transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Waiting for more approvals
    PendingApproval,
    /// Funds released (terminal)
    Executed,
}

/// A transfer proposal tracked from creation to execution
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Position in the ledger, starting at 1
    pub id: u64,
    pub asset: Asset,
    pub recipient: Address,
    /// Amount in the asset's smallest unit
    pub amount: u128,
    /// Signer that proposed the transfer
    pub initiator: Address,
    /// Signers that approved, in approval order
    approved_by: Vec<Address>,
    executed: bool,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Create a new entry with the initiator's approval already recorded
    pub(crate) fn new(
        id: u64,
        asset: Asset,
        recipient: Address,
        amount: u128,
        initiator: Address,
    ) -> Self {
        Self {
            id,
            asset,
            recipient,
            amount,
            approved_by: vec![initiator.clone()],
            initiator,
            executed: false,
            created_at: Utc::now(),
            executed_at: None,
        }
    }

    pub fn asset_kind(&self) -> AssetKind {
        self.asset.kind()
    }

    /// Number of distinct approvals collected
    pub fn approval_count(&self) -> usize {
        self.approved_by.len()
    }

    pub fn approved_by(&self) -> &[Address] {
        &self.approved_by
    }

    pub fn has_approved(&self, signer: &Address) -> bool {
        self.approved_by.contains(signer)
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn status(&self) -> TransactionStatus {
        if self.executed {
            TransactionStatus::Executed
        } else {
            TransactionStatus::PendingApproval
        }
    }

    /// Add an approval and return the new count
    ///
    /// Callers check membership and duplicates first.
    pub(crate) fn record_approval(&mut self, signer: Address) -> usize {
        debug_assert!(!self.has_approved(&signer));
        self.approved_by.push(signer);
        self.approved_by.len()
    }

    pub(crate) fn mark_executed(&mut self, at: DateTime<Utc>) {
        self.executed = true;
        self.executed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(asset: Asset) -> Transaction {
        Transaction::new(1, asset, Address::new("recipient"), 100, Address::new("s1"))
    }

    #[test]
    fn test_new_transaction_counts_initiator() {
        let tx = sample(Asset::Native);

        assert_eq!(tx.approval_count(), 1);
        assert!(tx.has_approved(&Address::new("s1")));
        assert!(!tx.is_executed());
        assert_eq!(tx.status(), TransactionStatus::PendingApproval);
        assert!(tx.executed_at.is_none());
    }

    #[test]
    fn test_record_approval_and_execute() {
        let mut tx = sample(Asset::External(Address::new("0xtoken")));

        assert_eq!(tx.record_approval(Address::new("s2")), 2);
        assert_eq!(tx.approved_by(), &[Address::new("s1"), Address::new("s2")]);

        tx.mark_executed(Utc::now());
        assert!(tx.is_executed());
        assert_eq!(tx.status(), TransactionStatus::Executed);
        assert!(tx.executed_at.is_some());
    }

    #[test]
    fn test_asset_kind() {
        assert_eq!(sample(Asset::Native).asset_kind(), AssetKind::Native);

        let asset = Asset::External(Address::new("0xtoken"));
        assert_eq!(asset.kind(), AssetKind::ExternalAsset);
        assert_eq!(asset.asset_id(), Some(&Address::new("0xtoken")));
        assert_eq!(asset.to_string(), "asset:0xtoken");
        assert_eq!(Asset::Native.asset_id(), None);
    }

    #[test]
    fn test_asset_serialization() {
        let json = serde_json::to_string(&Asset::External(Address::new("0xT"))).unwrap();
        assert_eq!(json, r#"{"kind":"external","asset_id":"0xt"}"#);

        let native: Asset = serde_json::from_str(r#"{"kind":"native"}"#).unwrap();
        assert_eq!(native, Asset::Native);
    }
}
