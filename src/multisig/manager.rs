//! Custody manager
//!
//! Keeps the quorum wallet together with the two ledgers it draws on, so the
//! whole custody state can be persisted and restored as one value.

use crate::core::{Address, NativeError, NativeLedger, NativeTransfer};
use crate::multisig::registry::WalletConfig;
use crate::multisig::wallet::{ApprovalOutcome, QuorumWallet};
use crate::multisig::{AssetLedger, MultisigError, NativeBank};
use crate::token::{TokenError, TokenManager, TransferEvent};
use serde::{Deserialize, Serialize};

/// Quorum wallet plus the native and asset ledgers it holds funds on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyManager {
    wallet: QuorumWallet,
    native: NativeLedger,
    tokens: TokenManager,
}

impl CustodyManager {
    /// Create a manager with empty ledgers
    pub fn new(config: WalletConfig) -> Result<Self, MultisigError> {
        Ok(Self {
            wallet: QuorumWallet::new(config)?,
            native: NativeLedger::new(),
            tokens: TokenManager::new(),
        })
    }

    pub fn wallet(&self) -> &QuorumWallet {
        &self.wallet
    }

    pub fn native(&self) -> &NativeLedger {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut NativeLedger {
        &mut self.native
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut TokenManager {
        &mut self.tokens
    }

    pub fn custody_address(&self) -> &Address {
        self.wallet.custody_address()
    }

    /// Native funds currently held in custody
    pub fn native_custody_balance(&self) -> u128 {
        self.native.native_balance(self.wallet.custody_address())
    }

    /// Asset funds currently held in custody (0 for unknown assets)
    pub fn asset_custody_balance(&self, asset: &Address) -> u128 {
        self.tokens
            .asset_balance(asset, self.wallet.custody_address())
    }

    /// Send native funds from an account into custody
    pub fn deposit_native(
        &mut self,
        from: &Address,
        amount: u128,
    ) -> Result<NativeTransfer, NativeError> {
        let custody = self.wallet.custody_address().clone();
        let transfer = self.native.transfer(from, &custody, amount)?;
        log::info!("Deposit: {} native from {} into custody", amount, from);
        Ok(transfer)
    }

    /// Send asset funds from an account into custody
    pub fn deposit_asset(
        &mut self,
        asset: &Address,
        from: &Address,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        let custody = self.wallet.custody_address().clone();
        let event = self.tokens.transfer(asset, from, &custody, amount)?;
        log::info!(
            "Deposit: {} of asset {} from {} into custody",
            amount,
            asset,
            from
        );
        Ok(event)
    }

    pub fn initiate_native_transfer(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: u128,
    ) -> Result<u64, MultisigError> {
        self.wallet
            .initiate_native_transfer(caller, recipient, amount, &mut self.native)
    }

    pub fn initiate_asset_transfer(
        &mut self,
        caller: &Address,
        asset_id: &Address,
        recipient: &Address,
        amount: u128,
    ) -> Result<u64, MultisigError> {
        self.wallet
            .initiate_asset_transfer(caller, asset_id, recipient, amount, &mut self.tokens)
    }

    pub fn approve_native_transfer(
        &mut self,
        id: u64,
        caller: &Address,
    ) -> Result<ApprovalOutcome, MultisigError> {
        self.wallet
            .approve_native_transfer(id, caller, &mut self.native)
    }

    pub fn approve_asset_transfer(
        &mut self,
        id: u64,
        caller: &Address,
    ) -> Result<ApprovalOutcome, MultisigError> {
        self.wallet.approve_asset_transfer(id, caller, &mut self.tokens)
    }
}
