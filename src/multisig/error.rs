//! Errors raised by the quorum wallet

use crate::core::Address;
use crate::multisig::transaction::AssetKind;
use thiserror::Error;

/// Errors related to multisig operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid quorum: {quorum} of {signers} signers")]
    InvalidQuorum { quorum: usize, signers: usize },
    #[error("Duplicate signer: {0}")]
    DuplicateSigner(Address),
    #[error("Invalid identity: {0} is null")]
    InvalidIdentity(&'static str),
    #[error("Signer not authorized: {0}")]
    InvalidSigner(Address),
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: u128, required: u128 },
    #[error("Transaction not found: {0}")]
    TransactionNotFound(u64),
    #[error("Transaction {id} already signed by {signer}")]
    AlreadySigned { id: u64, signer: Address },
    #[error("Transaction {0} already executed")]
    TransactionAlreadyCompleted(u64),
    #[error("Transaction {id} has asset kind {actual}, expected {expected}")]
    AssetKindMismatch {
        id: u64,
        expected: AssetKind,
        actual: AssetKind,
    },
}

impl MultisigError {
    /// Whether resubmitting the same call later may succeed
    ///
    /// Only fund shortfalls clear up on their own (once custody is refilled).
    pub fn is_transient(&self) -> bool {
        matches!(self, MultisigError::InsufficientFunds { .. })
    }
}
