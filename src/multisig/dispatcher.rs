//! Execution dispatch
//!
//! Runs when an approval first brings a transaction to quorum. Funds are
//! re-checked against the live custody balance, not the balance seen when
//! the transfer was proposed, and then moved through the relevant ledger.

use crate::core::Address;
use crate::multisig::transaction::{Asset, AssetKind, Transaction};
use crate::multisig::MultisigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native currency balances as seen by the wallet
pub trait NativeBank {
    type Error: fmt::Display;

    fn native_balance(&self, holder: &Address) -> u128;

    /// Move native funds; must not change any balance on failure
    fn send_native(&mut self, from: &Address, to: &Address, amount: u128)
        -> Result<(), Self::Error>;
}

/// External fungible asset ledger as seen by the wallet
pub trait AssetLedger {
    type Error: fmt::Display;

    fn asset_balance(&self, asset: &Address, holder: &Address) -> u128;

    /// Move asset funds; must not change any balance on failure
    fn send_asset(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), Self::Error>;
}

/// Proof of a released transfer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecutionReceipt {
    pub id: u64,
    pub asset: Asset,
    pub recipient: Address,
    pub amount: u128,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionReceipt {
    fn for_transaction(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            asset: tx.asset.clone(),
            recipient: tx.recipient.clone(),
            amount: tx.amount,
            executed_at: Utc::now(),
        }
    }
}

fn ensure_funds(available: u128, required: u128) -> Result<(), MultisigError> {
    if available < required {
        return Err(MultisigError::InsufficientFunds {
            available,
            required,
        });
    }
    Ok(())
}

/// Release a native transfer from custody
pub fn execute_native<N>(
    custody: &Address,
    tx: &Transaction,
    bank: &mut N,
) -> Result<ExecutionReceipt, MultisigError>
where
    N: NativeBank + ?Sized,
{
    if tx.asset != Asset::Native {
        return Err(MultisigError::AssetKindMismatch {
            id: tx.id,
            expected: AssetKind::Native,
            actual: tx.asset_kind(),
        });
    }

    let available = bank.native_balance(custody);
    ensure_funds(available, tx.amount)?;

    bank.send_native(custody, &tx.recipient, tx.amount)
        .map_err(|e| {
            log::warn!("Native transfer for transaction {} rejected: {}", tx.id, e);
            MultisigError::InsufficientFunds {
                available,
                required: tx.amount,
            }
        })?;

    Ok(ExecutionReceipt::for_transaction(tx))
}

/// Release an external asset transfer from custody
pub fn execute_asset<A>(
    custody: &Address,
    tx: &Transaction,
    ledger: &mut A,
) -> Result<ExecutionReceipt, MultisigError>
where
    A: AssetLedger + ?Sized,
{
    let asset_id = tx
        .asset
        .asset_id()
        .ok_or(MultisigError::AssetKindMismatch {
            id: tx.id,
            expected: AssetKind::ExternalAsset,
            actual: tx.asset_kind(),
        })?;

    let available = ledger.asset_balance(asset_id, custody);
    ensure_funds(available, tx.amount)?;

    ledger
        .send_asset(asset_id, custody, &tx.recipient, tx.amount)
        .map_err(|e| {
            log::warn!(
                "Asset transfer of {} for transaction {} rejected: {}",
                asset_id,
                tx.id,
                e
            );
            MultisigError::InsufficientFunds {
                available,
                required: tx.amount,
            }
        })?;

    Ok(ExecutionReceipt::for_transaction(tx))
}

/// One side of custody the wallet can draw on
///
/// Ties an asset kind to the ledger that holds it, so the approval engine can
/// run one routine for both kinds.
pub(crate) trait CustodyRail {
    const KIND: AssetKind;

    fn available(&self, custody: &Address, asset: &Asset) -> u128;

    fn execute(
        &mut self,
        custody: &Address,
        tx: &Transaction,
    ) -> Result<ExecutionReceipt, MultisigError>;
}

pub(crate) struct NativeRail<'a, N: ?Sized>(pub &'a mut N);

impl<N: NativeBank + ?Sized> CustodyRail for NativeRail<'_, N> {
    const KIND: AssetKind = AssetKind::Native;

    fn available(&self, custody: &Address, _asset: &Asset) -> u128 {
        self.0.native_balance(custody)
    }

    fn execute(
        &mut self,
        custody: &Address,
        tx: &Transaction,
    ) -> Result<ExecutionReceipt, MultisigError> {
        execute_native(custody, tx, &mut *self.0)
    }
}

pub(crate) struct AssetRail<'a, A: ?Sized>(pub &'a mut A);

impl<A: AssetLedger + ?Sized> CustodyRail for AssetRail<'_, A> {
    const KIND: AssetKind = AssetKind::ExternalAsset;

    fn available(&self, custody: &Address, asset: &Asset) -> u128 {
        asset
            .asset_id()
            .map(|id| self.0.asset_balance(id, custody))
            .unwrap_or(0)
    }

    fn execute(
        &mut self,
        custody: &Address,
        tx: &Transaction,
    ) -> Result<ExecutionReceipt, MultisigError> {
        execute_asset(custody, tx, &mut *self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NativeLedger;
    use crate::token::TokenManager;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn native_tx(amount: u128) -> Transaction {
        Transaction::new(1, Asset::Native, addr("recipient"), amount, addr("s1"))
    }

    /// Ledger that reports funds but refuses every transfer
    struct RejectingLedger;

    impl AssetLedger for RejectingLedger {
        type Error = String;

        fn asset_balance(&self, _asset: &Address, _holder: &Address) -> u128 {
            u128::MAX
        }

        fn send_asset(
            &mut self,
            _asset: &Address,
            _from: &Address,
            _to: &Address,
            _amount: u128,
        ) -> Result<(), String> {
            Err("paused".to_string())
        }
    }

    #[test]
    fn test_native_release() {
        let mut bank = NativeLedger::new();
        bank.credit(&addr("vault"), 100).unwrap();

        let receipt = execute_native(&addr("vault"), &native_tx(60), &mut bank).unwrap();

        assert_eq!(receipt.amount, 60);
        assert_eq!(receipt.recipient, addr("recipient"));
        assert_eq!(bank.balance_of(&addr("vault")), 40);
        assert_eq!(bank.balance_of(&addr("recipient")), 60);
    }

    #[test]
    fn test_native_shortfall() {
        let mut bank = NativeLedger::new();
        bank.credit(&addr("vault"), 50).unwrap();

        let err = execute_native(&addr("vault"), &native_tx(60), &mut bank).unwrap_err();

        assert_eq!(
            err,
            MultisigError::InsufficientFunds {
                available: 50,
                required: 60
            }
        );
        assert_eq!(bank.balance_of(&addr("vault")), 50);
    }

    #[test]
    fn test_asset_release() {
        let mut tokens = TokenManager::new();
        let token = tokens
            .create_token("A".into(), "TTA".into(), 18, 1000, &addr("vault"))
            .unwrap();
        let tx = Transaction::new(
            1,
            Asset::External(token.address.clone()),
            addr("recipient"),
            1000,
            addr("s1"),
        );

        execute_asset(&addr("vault"), &tx, &mut tokens).unwrap();

        assert_eq!(tokens.asset_balance(&token.address, &addr("recipient")), 1000);
        assert_eq!(tokens.asset_balance(&token.address, &addr("vault")), 0);
    }

    #[test]
    fn test_ledger_rejection_reads_as_insufficient_funds() {
        let tx = Transaction::new(
            1,
            Asset::External(addr("0xtoken")),
            addr("recipient"),
            10,
            addr("s1"),
        );

        let err = execute_asset(&addr("vault"), &tx, &mut RejectingLedger).unwrap_err();
        assert!(matches!(err, MultisigError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_kind_guard() {
        let mut tokens = TokenManager::new();
        let err = execute_asset(&addr("vault"), &native_tx(1), &mut tokens).unwrap_err();
        assert!(matches!(err, MultisigError::AssetKindMismatch { .. }));
    }
}
