//! Quorum wallet
//!
//! The approval engine. Signers propose transfers out of custody, other
//! signers approve them, and the approval that reaches the quorum releases
//! the funds.
//!
//! Approving is all-or-nothing once quorum is involved: the approval is
//! staged on a copy of the transaction, execution runs against that copy,
//! and the stored record is replaced only if execution succeeded. A failed
//! execution therefore never consumes the signer's approval.

use crate::core::Address;
use crate::multisig::dispatcher::{
    AssetLedger, AssetRail, CustodyRail, ExecutionReceipt, NativeBank, NativeRail,
};
use crate::multisig::events::{WalletEvent, WalletEventKind};
use crate::multisig::ledger::TransactionLedger;
use crate::multisig::registry::{SignerRegistry, WalletConfig};
use crate::multisig::transaction::{Asset, Transaction};
use crate::multisig::MultisigError;
use serde::{Deserialize, Serialize};

/// Result of a successful approval
#[derive(Clone, Debug, PartialEq)]
pub enum ApprovalOutcome {
    /// Recorded; more approvals are needed
    Pending { approval_count: usize, quorum: usize },
    /// This approval reached quorum and the funds were released
    Executed(ExecutionReceipt),
}

/// A custody wallet controlled by a fixed quorum of signers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuorumWallet {
    registry: SignerRegistry,
    ledger: TransactionLedger,
    #[serde(default)]
    events: Vec<WalletEvent>,
}

impl QuorumWallet {
    /// Create a wallet, validating the signer configuration
    pub fn new(config: WalletConfig) -> Result<Self, MultisigError> {
        let registry = SignerRegistry::new(config)?;

        log::info!(
            "Quorum wallet {} created ({})",
            registry.custody_address(),
            registry.description()
        );

        Ok(Self {
            registry,
            ledger: TransactionLedger::new(),
            events: Vec::new(),
        })
    }

    pub fn registry(&self) -> &SignerRegistry {
        &self.registry
    }

    pub fn quorum(&self) -> usize {
        self.registry.quorum()
    }

    pub fn is_member(&self, identity: &Address) -> bool {
        self.registry.is_member(identity)
    }

    pub fn signers(&self) -> &[Address] {
        self.registry.signers()
    }

    /// Identity holding the wallet's funds on both ledgers
    pub fn custody_address(&self) -> &Address {
        self.registry.custody_address()
    }

    /// Snapshot of a transaction
    pub fn transaction(&self, id: u64) -> Result<&Transaction, MultisigError> {
        self.ledger.get(id)
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.ledger.iter()
    }

    /// Transactions still collecting approvals
    pub fn pending(&self) -> Vec<&Transaction> {
        self.ledger.iter().filter(|tx| !tx.is_executed()).collect()
    }

    pub fn transaction_count(&self) -> u64 {
        self.ledger.len()
    }

    /// Whether `identity` approved transaction `id` (false for unknown ids)
    pub fn has_approved(&self, id: u64, identity: &Address) -> bool {
        self.ledger
            .get(id)
            .map(|tx| tx.has_approved(identity))
            .unwrap_or(false)
    }

    pub fn events(&self) -> &[WalletEvent] {
        &self.events
    }

    /// Propose a native currency transfer out of custody
    ///
    /// The caller's approval is recorded with the proposal. Returns the new
    /// transaction id.
    pub fn initiate_native_transfer<N>(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: u128,
        bank: &mut N,
    ) -> Result<u64, MultisigError>
    where
        N: NativeBank + ?Sized,
    {
        self.initiate(caller, Asset::Native, recipient, amount, &mut NativeRail(bank))
    }

    /// Propose an external asset transfer out of custody
    pub fn initiate_asset_transfer<A>(
        &mut self,
        caller: &Address,
        asset_id: &Address,
        recipient: &Address,
        amount: u128,
        ledger: &mut A,
    ) -> Result<u64, MultisigError>
    where
        A: AssetLedger + ?Sized,
    {
        self.initiate(
            caller,
            Asset::External(asset_id.clone()),
            recipient,
            amount,
            &mut AssetRail(ledger),
        )
    }

    /// Approve a pending native transfer
    ///
    /// Fails with `AssetKindMismatch` for asset transfers.
    pub fn approve_native_transfer<N>(
        &mut self,
        id: u64,
        caller: &Address,
        bank: &mut N,
    ) -> Result<ApprovalOutcome, MultisigError>
    where
        N: NativeBank + ?Sized,
    {
        self.approve(id, caller, &mut NativeRail(bank))
    }

    /// Approve a pending external asset transfer
    ///
    /// Fails with `AssetKindMismatch` for native transfers.
    pub fn approve_asset_transfer<A>(
        &mut self,
        id: u64,
        caller: &Address,
        ledger: &mut A,
    ) -> Result<ApprovalOutcome, MultisigError>
    where
        A: AssetLedger + ?Sized,
    {
        self.approve(id, caller, &mut AssetRail(ledger))
    }

    fn initiate<R: CustodyRail>(
        &mut self,
        caller: &Address,
        asset: Asset,
        recipient: &Address,
        amount: u128,
        rail: &mut R,
    ) -> Result<u64, MultisigError> {
        if !self.registry.is_member(caller) {
            return Err(MultisigError::InvalidSigner(caller.clone()));
        }
        if recipient.is_zero() {
            return Err(MultisigError::InvalidIdentity("recipient"));
        }
        if asset.asset_id().is_some_and(Address::is_zero) {
            return Err(MultisigError::InvalidIdentity("asset"));
        }
        if amount == 0 {
            return Err(MultisigError::InvalidAmount);
        }

        let custody = self.registry.custody_address().clone();
        let available = rail.available(&custody, &asset);
        if available < amount {
            return Err(MultisigError::InsufficientFunds {
                available,
                required: amount,
            });
        }

        let mut staged = self
            .ledger
            .draft(asset, recipient.clone(), amount, caller.clone());

        // With a quorum of one the proposer's own approval is decisive.
        let receipt = if staged.approval_count() >= self.registry.quorum() {
            let receipt = rail.execute(&custody, &staged)?;
            staged.mark_executed(receipt.executed_at);
            Some(receipt)
        } else {
            None
        };

        self.events.push(WalletEvent::now(WalletEventKind::TransactionInitiated {
            id: staged.id,
            initiator: caller.clone(),
            asset: staged.asset.clone(),
            recipient: staged.recipient.clone(),
            amount,
        }));
        if let Some(receipt) = receipt {
            self.push_executed(&receipt);
        }

        let id = self.ledger.append(staged);
        log::info!(
            "Transaction {} initiated by {}: {} {} to {}",
            id,
            caller,
            amount,
            self.ledger.get(id)?.asset,
            recipient
        );

        Ok(id)
    }

    fn approve<R: CustodyRail>(
        &mut self,
        id: u64,
        caller: &Address,
        rail: &mut R,
    ) -> Result<ApprovalOutcome, MultisigError> {
        if !self.registry.is_member(caller) {
            return Err(MultisigError::InvalidSigner(caller.clone()));
        }

        let current = self.ledger.get(id)?;
        if current.asset_kind() != R::KIND {
            return Err(MultisigError::AssetKindMismatch {
                id,
                expected: R::KIND,
                actual: current.asset_kind(),
            });
        }
        if current.is_executed() {
            return Err(MultisigError::TransactionAlreadyCompleted(id));
        }
        if current.has_approved(caller) {
            return Err(MultisigError::AlreadySigned {
                id,
                signer: caller.clone(),
            });
        }

        let mut staged = current.clone();
        let approval_count = staged.record_approval(caller.clone());
        let quorum = self.registry.quorum();

        if approval_count < quorum {
            self.ledger.commit(staged)?;
            self.push_approved(id, caller, approval_count);
            log::debug!(
                "Transaction {} approved by {} ({}/{})",
                id,
                caller,
                approval_count,
                quorum
            );
            return Ok(ApprovalOutcome::Pending {
                approval_count,
                quorum,
            });
        }

        let custody = self.registry.custody_address().clone();
        let receipt = match rail.execute(&custody, &staged) {
            Ok(receipt) => receipt,
            Err(e) => {
                log::warn!(
                    "Approval by {} on transaction {} discarded: {}",
                    caller,
                    id,
                    e
                );
                return Err(e);
            }
        };

        staged.mark_executed(receipt.executed_at);
        self.ledger.commit(staged)?;
        self.push_approved(id, caller, approval_count);
        self.push_executed(&receipt);

        log::info!(
            "Transaction {} executed: {} {} released to {}",
            id,
            receipt.amount,
            receipt.asset,
            receipt.recipient
        );

        Ok(ApprovalOutcome::Executed(receipt))
    }

    fn push_approved(&mut self, id: u64, signer: &Address, approval_count: usize) {
        self.events
            .push(WalletEvent::now(WalletEventKind::TransactionApproved {
                id,
                signer: signer.clone(),
                approval_count,
            }));
    }

    fn push_executed(&mut self, receipt: &ExecutionReceipt) {
        self.events
            .push(WalletEvent::now(WalletEventKind::TransactionExecuted {
                id: receipt.id,
                asset: receipt.asset.clone(),
                recipient: receipt.recipient.clone(),
                amount: receipt.amount,
            }));
    }
}
