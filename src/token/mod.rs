//! ERC-20 style fungible tokens
//!
//! The external asset ledger of the custody wallet:
//! - Balances per address
//! - Transfer, mint (creator only) and burn
//!
//! # Example
//!
//! ```ignore
//! use quorum_custody::core::Address;
//! use quorum_custody::token::TokenManager;
//!
//! let mut manager = TokenManager::new();
//! let creator = Address::new("creator");
//!
//! let token = manager
//!     .create_token("Test Token A".to_string(), "TTA".to_string(), 18, 0, &creator)
//!     .unwrap();
//!
//! manager.mint(&token.address, &creator, &creator, 10_000).unwrap();
//! manager.transfer(&token.address, &creator, &Address::new("vault"), 10_000).unwrap();
//! ```

pub mod manager;
pub mod token;

pub use manager::TokenManager;
pub use token::{Token, TokenError, TokenMetadata, TransferEvent};
