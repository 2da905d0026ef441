//! ERC-20 style token implementation
//!
//! Provides a fungible token with standard interface.

use crate::core::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Number of transfer events kept per token
const HISTORY_LIMIT: usize = 100;

/// Token-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Token not found: {0}")]
    TokenNotFound(Address),
    #[error("Token already exists: {0}")]
    TokenAlreadyExists(Address),
    #[error("Invalid address: null identity")]
    NullAddress,
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Only the token creator can mint: {0}")]
    Unauthorized(Address),
    #[error("Supply overflow")]
    Overflow,
}

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    /// Token name (e.g., "Test Token A")
    pub name: String,
    /// Token symbol (e.g., "TTA")
    pub symbol: String,
    /// Decimal places (usually 18)
    pub decimals: u8,
    /// Supply minted to the creator at deployment (may be 0)
    pub initial_supply: u128,
    /// Creator address, the only account allowed to mint
    pub creator: Address,
    /// Timestamp when created
    pub created_at: DateTime<Utc>,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(
        name: String,
        symbol: String,
        decimals: u8,
        initial_supply: u128,
        creator: Address,
    ) -> Result<Self, TokenError> {
        if name.is_empty() || name.len() > 50 {
            return Err(TokenError::InvalidName);
        }

        if symbol.is_empty() || symbol.len() > 10 {
            return Err(TokenError::InvalidSymbol);
        }

        if decimals > 18 {
            return Err(TokenError::InvalidDecimals);
        }

        if creator.is_zero() {
            return Err(TokenError::NullAddress);
        }

        Ok(Self {
            name,
            symbol,
            decimals,
            initial_supply,
            creator,
            created_at: Utc::now(),
        })
    }
}

/// Transfer event (emitted when tokens move, are minted or burned)
///
/// Mints carry `from = None`, burns carry `to = None`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferEvent {
    pub token: Address,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub amount: u128,
    pub timestamp: DateTime<Utc>,
}

/// An ERC-20 style fungible token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Unique token address
    pub address: Address,
    /// Token metadata
    pub metadata: TokenMetadata,
    /// Current supply (changes with mint and burn)
    total_supply: u128,
    /// Balances: address -> amount
    balances: HashMap<Address, u128>,
    /// Transfer history (last 100)
    pub transfer_history: Vec<TransferEvent>,
}

impl Token {
    /// Create a new token with the initial supply allocated to its creator
    pub fn new(address: Address, metadata: TokenMetadata) -> Self {
        let mut balances = HashMap::new();
        if metadata.initial_supply > 0 {
            balances.insert(metadata.creator.clone(), metadata.initial_supply);
        }

        Self {
            address,
            total_supply: metadata.initial_supply,
            metadata,
            balances,
            transfer_history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Get balance of an address
    pub fn balance_of(&self, address: &Address) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Get holder count
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    /// Transfer tokens from one address to another
    ///
    /// Balances are untouched when any check fails.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        if to.is_zero() {
            return Err(TokenError::NullAddress);
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        // A transfer to self is recorded but leaves balances unchanged
        if from != to {
            *self.balances.entry(from.clone()).or_insert(0) -= amount;
            *self.balances.entry(to.clone()).or_insert(0) += amount;
        }

        Ok(self.record(Some(from.clone()), Some(to.clone()), amount))
    }

    /// Mint new tokens (creator only)
    pub fn mint(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        if caller != &self.metadata.creator {
            return Err(TokenError::Unauthorized(caller.clone()));
        }
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }
        if to.is_zero() {
            return Err(TokenError::NullAddress);
        }

        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        *self.balances.entry(to.clone()).or_insert(0) += amount;

        Ok(self.record(None, Some(to.clone()), amount))
    }

    /// Destroy tokens held by `from`
    pub fn burn(&mut self, from: &Address, amount: u128) -> Result<TransferEvent, TokenError> {
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let balance = self.balance_of(from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }

        *self.balances.entry(from.clone()).or_insert(0) -= amount;
        self.total_supply -= amount;

        Ok(self.record(Some(from.clone()), None, amount))
    }

    fn record(&mut self, from: Option<Address>, to: Option<Address>, amount: u128) -> TransferEvent {
        let event = TransferEvent {
            token: self.address.clone(),
            from,
            to,
            amount,
            timestamp: Utc::now(),
        };

        self.transfer_history.push(event.clone());
        if self.transfer_history.len() > HISTORY_LIMIT {
            self.transfer_history.remove(0);
        }

        event
    }
}
