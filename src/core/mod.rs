//! Core account primitives
//!
//! - Addresses (signers, recipients, assets, the custody wallet)
//! - The native currency ledger

pub mod address;
pub mod native;

pub use address::{Address, ADDRESS_HEX_LEN};
pub use native::{NativeError, NativeLedger, NativeTransfer};
