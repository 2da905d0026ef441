//! Append-only transaction ledger
//!
//! Entries are indexed densely from 1 and never removed or re-indexed.
//! A deserialized ledger is checked against the same invariants before use.

use crate::core::Address;
use crate::multisig::transaction::{Asset, Transaction};
use crate::multisig::MultisigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Saved ledger contents that break a ledger invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Entry at position {position} has id {id}")]
    IdOutOfSequence { position: u64, id: u64 },
    #[error("Transaction {0} has a zero amount")]
    ZeroAmount(u64),
    #[error("Transaction {0} is missing its initiator's approval")]
    MissingInitiatorApproval(u64),
    #[error("Transaction {id} lists {signer} more than once")]
    DuplicateApproval { id: u64, signer: Address },
    #[error("Transaction {0} is executed without an execution time")]
    MissingExecutionTime(u64),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "LedgerRecord", into = "LedgerRecord")]
pub struct TransactionLedger {
    entries: Vec<Transaction>,
}

/// Serialized form of [`TransactionLedger`]
#[derive(Serialize, Deserialize)]
struct LedgerRecord {
    entries: Vec<Transaction>,
}

impl TryFrom<LedgerRecord> for TransactionLedger {
    type Error = LedgerError;

    fn try_from(record: LedgerRecord) -> Result<Self, Self::Error> {
        for (position, tx) in (1..).zip(&record.entries) {
            validate_entry(position, tx)?;
        }
        Ok(Self {
            entries: record.entries,
        })
    }
}

impl From<TransactionLedger> for LedgerRecord {
    fn from(ledger: TransactionLedger) -> Self {
        Self {
            entries: ledger.entries,
        }
    }
}

fn validate_entry(position: u64, tx: &Transaction) -> Result<(), LedgerError> {
    if tx.id != position {
        return Err(LedgerError::IdOutOfSequence {
            position,
            id: tx.id,
        });
    }
    if tx.amount == 0 {
        return Err(LedgerError::ZeroAmount(tx.id));
    }
    if tx.approved_by().first() != Some(&tx.initiator) {
        return Err(LedgerError::MissingInitiatorApproval(tx.id));
    }

    let mut seen = HashSet::with_capacity(tx.approval_count());
    for signer in tx.approved_by() {
        if !seen.insert(signer) {
            return Err(LedgerError::DuplicateApproval {
                id: tx.id,
                signer: signer.clone(),
            });
        }
    }

    if tx.is_executed() && tx.executed_at.is_none() {
        return Err(LedgerError::MissingExecutionTime(tx.id));
    }
    Ok(())
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries; also the highest id in use
    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id the next appended entry will receive
    pub fn next_id(&self) -> u64 {
        self.len() + 1
    }

    /// Build the entry that `append` would store, without storing it
    pub(crate) fn draft(
        &self,
        asset: Asset,
        recipient: Address,
        amount: u128,
        initiator: Address,
    ) -> Transaction {
        Transaction::new(self.next_id(), asset, recipient, amount, initiator)
    }

    /// Store a drafted entry
    pub(crate) fn append(&mut self, tx: Transaction) -> u64 {
        debug_assert_eq!(tx.id, self.next_id());
        let id = tx.id;
        self.entries.push(tx);
        id
    }

    pub fn get(&self, id: u64) -> Result<&Transaction, MultisigError> {
        id.checked_sub(1)
            .and_then(|index| self.entries.get(index as usize))
            .ok_or(MultisigError::TransactionNotFound(id))
    }

    /// Replace an entry with its staged successor
    pub(crate) fn commit(&mut self, staged: Transaction) -> Result<(), MultisigError> {
        let index = staged
            .id
            .checked_sub(1)
            .filter(|&index| index < self.len())
            .ok_or(MultisigError::TransactionNotFound(staged.id))?;
        self.entries[index as usize] = staged;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.entries.iter()
    }
}
