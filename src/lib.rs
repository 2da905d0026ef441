//! Quorum Custody: a quorum multi-signature custody wallet in Rust
//!
//! This crate provides a custody wallet controlled by a fixed set of
//! signers:
//! - M-of-N signer registry with a derived custody address
//! - Append-only transaction ledger with per-signer approvals
//! - Quorum-triggered release of native coins or fungible tokens
//! - Atomic approvals: a failed release leaves no trace
//! - ERC-20 style token ledger and native coin ledger
//! - JSON persistence with backups, CLI and REST API
//!
//! # Example
//!
//! ```rust
//! use quorum_custody::core::Address;
//! use quorum_custody::multisig::{ApprovalOutcome, CustodyManager, WalletConfig};
//!
//! // Create a 2-of-3 custody wallet
//! let signers = vec![Address::new("alice"), Address::new("bob"), Address::new("carol")];
//! let mut custody = CustodyManager::new(WalletConfig::new(2, signers, None)).unwrap();
//!
//! // Fund custody with native coins
//! custody.native_mut().credit(&Address::new("funder"), 100).unwrap();
//! custody.deposit_native(&Address::new("funder"), 100).unwrap();
//!
//! // Alice proposes, Bob's approval reaches quorum and releases the funds
//! let id = custody
//!     .initiate_native_transfer(&Address::new("alice"), &Address::new("dave"), 40)
//!     .unwrap();
//! let outcome = custody.approve_native_transfer(id, &Address::new("bob")).unwrap();
//!
//! assert!(matches!(outcome, ApprovalOutcome::Executed(_)));
//! assert_eq!(custody.native_custody_balance(), 60);
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use core::{Address, NativeLedger};
pub use crypto::KeyPair;
pub use multisig::{
    ApprovalOutcome, CustodyManager, MultisigError, QuorumWallet, Transaction, WalletConfig,
};
pub use storage::{Storage, StorageConfig};
pub use token::{Token, TokenManager, TokenMetadata};
