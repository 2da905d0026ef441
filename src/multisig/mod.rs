//! Quorum multi-signature custody
//!
//! A fixed set of signers jointly controls funds held under the wallet's
//! custody address. Any signer may propose a transfer of the native
//! currency or of an external asset; the transfer is released only when a
//! quorum of distinct signers has approved it, and only if custody still
//! holds enough funds at that moment.
//!
//! # Example
//!
//! ```ignore
//! use quorum_custody::core::Address;
//! use quorum_custody::multisig::{CustodyManager, WalletConfig};
//!
//! // Create a 2-of-3 custody wallet
//! let signers = vec![Address::new("alice"), Address::new("bob"), Address::new("carol")];
//! let mut custody = CustodyManager::new(WalletConfig::new(2, signers, None))?;
//!
//! // Fund it
//! custody.native_mut().credit(&Address::new("funder"), 100)?;
//! custody.deposit_native(&Address::new("funder"), 100)?;
//!
//! // Propose, then approve; the second approval releases the funds
//! let id = custody.initiate_native_transfer(&Address::new("alice"), &Address::new("dave"), 40)?;
//! custody.approve_native_transfer(id, &Address::new("bob"))?;
//! ```

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod ledger;
pub mod manager;
pub mod registry;
pub mod transaction;
pub mod wallet;

pub use dispatcher::{execute_asset, execute_native, AssetLedger, ExecutionReceipt, NativeBank};
pub use error::MultisigError;
pub use events::{WalletEvent, WalletEventKind};
pub use ledger::{LedgerError, TransactionLedger};
pub use manager::CustodyManager;
pub use registry::{SignerRegistry, WalletConfig};
pub use transaction::{Asset, AssetKind, Transaction, TransactionStatus};
pub use wallet::{ApprovalOutcome, QuorumWallet};
