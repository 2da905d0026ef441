//! Native currency ledger
//!
//! Account-based balances for the chain's own coin. The custody wallet
//! holds its native funds here under its derived address.

use crate::core::Address;
use crate::multisig::NativeBank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Number of transfers kept in history
const HISTORY_LIMIT: usize = 100;

/// Native ledger errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NativeError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Null address")]
    NullAddress,
    #[error("Balance overflow")]
    Overflow,
}

/// A completed native transfer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NativeTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: u128,
    pub timestamp: DateTime<Utc>,
}

/// Native coin balances by account
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NativeLedger {
    balances: HashMap<Address, u128>,
    /// Recent transfers (last 100)
    pub history: Vec<NativeTransfer>,
}

impl NativeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get balance of an account
    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Sum of all balances
    pub fn total_supply(&self) -> u128 {
        self.balances.values().sum()
    }

    /// Mint new coins into an account
    pub fn credit(&mut self, to: &Address, amount: u128) -> Result<u128, NativeError> {
        if amount == 0 {
            return Err(NativeError::InvalidAmount);
        }
        if to.is_zero() {
            return Err(NativeError::NullAddress);
        }

        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(NativeError::Overflow)?;
        self.balances.insert(to.clone(), balance);

        log::debug!("Credited {} to {}", amount, to);
        Ok(balance)
    }

    /// Move coins between accounts
    ///
    /// Nothing is changed when the transfer fails.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<NativeTransfer, NativeError> {
        if amount == 0 {
            return Err(NativeError::InvalidAmount);
        }
        if from.is_zero() || to.is_zero() {
            return Err(NativeError::NullAddress);
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(NativeError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        if from != to {
            let to_balance = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(NativeError::Overflow)?;
            self.balances.insert(from.clone(), from_balance - amount);
            self.balances.insert(to.clone(), to_balance);
        }

        let transfer = NativeTransfer {
            from: from.clone(),
            to: to.clone(),
            amount,
            timestamp: Utc::now(),
        };

        self.history.push(transfer.clone());
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }

        Ok(transfer)
    }

    /// Accounts holding a non-zero balance
    pub fn holders(&self) -> Vec<(&Address, u128)> {
        let mut holders: Vec<_> = self
            .balances
            .iter()
            .filter(|(_, &b)| b > 0)
            .map(|(a, &b)| (a, b))
            .collect();
        holders.sort_by(|a, b| a.0.cmp(b.0));
        holders
    }
}

impl NativeBank for NativeLedger {
    type Error = NativeError;

    fn native_balance(&self, holder: &Address) -> u128 {
        self.balance_of(holder)
    }

    fn send_native(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), NativeError> {
        self.transfer(from, to, amount).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    #[test]
    fn test_credit_and_balance() {
        let mut ledger = NativeLedger::new();
        assert_eq!(ledger.balance_of(&addr("alice")), 0);

        ledger.credit(&addr("alice"), 500).unwrap();
        ledger.credit(&addr("alice"), 250).unwrap();

        assert_eq!(ledger.balance_of(&addr("alice")), 750);
        assert_eq!(ledger.total_supply(), 750);
    }

    #[test]
    fn test_credit_validation() {
        let mut ledger = NativeLedger::new();
        assert_eq!(
            ledger.credit(&addr("alice"), 0),
            Err(NativeError::InvalidAmount)
        );
        assert_eq!(
            ledger.credit(&Address::zero(), 10),
            Err(NativeError::NullAddress)
        );
    }

    #[test]
    fn test_transfer() {
        let mut ledger = NativeLedger::new();
        ledger.credit(&addr("alice"), 1000).unwrap();

        let transfer = ledger.transfer(&addr("alice"), &addr("bob"), 400).unwrap();

        assert_eq!(transfer.amount, 400);
        assert_eq!(ledger.balance_of(&addr("alice")), 600);
        assert_eq!(ledger.balance_of(&addr("bob")), 400);
        assert_eq!(ledger.history.len(), 1);
        assert_eq!(ledger.holders().len(), 2);
    }

    #[test]
    fn test_transfer_insufficient_balance_leaves_state() {
        let mut ledger = NativeLedger::new();
        ledger.credit(&addr("alice"), 100).unwrap();

        let result = ledger.transfer(&addr("alice"), &addr("bob"), 101);
        assert_eq!(
            result.unwrap_err(),
            NativeError::InsufficientBalance {
                have: 100,
                need: 101
            }
        );
        assert_eq!(ledger.balance_of(&addr("alice")), 100);
        assert_eq!(ledger.balance_of(&addr("bob")), 0);
        assert!(ledger.history.is_empty());
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let mut ledger = NativeLedger::new();
        ledger.credit(&addr("alice"), 100).unwrap();

        ledger.transfer(&addr("alice"), &addr("alice"), 60).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), 100);
    }
}
