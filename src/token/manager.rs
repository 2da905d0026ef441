//! Token manager for creating and managing tokens
//!
//! Handles token deployment and provides high-level operations. The manager
//! is the fungible asset ledger the custody wallet releases assets through.

use crate::core::Address;
use crate::crypto::sha256;
use crate::multisig::AssetLedger;
use crate::token::token::{Token, TokenError, TokenMetadata, TransferEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Manages all tokens in the system
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenManager {
    /// All tokens by address
    tokens: HashMap<Address, Token>,
    /// Deployment counter for address generation
    nonce: u64,
}

impl TokenManager {
    /// Create a new token manager
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
            nonce: 0,
        }
    }

    /// Create a new token
    ///
    /// The initial supply is allocated to the creator.
    pub fn create_token(
        &mut self,
        name: String,
        symbol: String,
        decimals: u8,
        initial_supply: u128,
        creator: &Address,
    ) -> Result<Token, TokenError> {
        let metadata = TokenMetadata::new(name, symbol, decimals, initial_supply, creator.clone())?;

        let address = self.generate_address(creator, &metadata.symbol);
        self.nonce += 1;

        if self.tokens.contains_key(&address) {
            return Err(TokenError::TokenAlreadyExists(address));
        }

        let token = Token::new(address.clone(), metadata);
        self.tokens.insert(address.clone(), token.clone());

        log::info!(
            "Token created: {} ({}) at {}",
            token.name(),
            token.symbol(),
            address
        );

        Ok(token)
    }

    /// Derive token address from creator, symbol and nonce
    fn generate_address(&self, creator: &Address, symbol: &str) -> Address {
        let input = format!("{}:{}:{}", creator, symbol, self.nonce);
        let hash = sha256(input.as_bytes());
        Address::from_bytes(&hash[..20])
    }

    /// Get a token by address
    pub fn get(&self, address: &Address) -> Option<&Token> {
        self.tokens.get(address)
    }

    /// List all tokens, ordered by address
    pub fn list(&self) -> Vec<&Token> {
        let mut tokens: Vec<&Token> = self.tokens.values().collect();
        tokens.sort_by(|a, b| a.address.cmp(&b.address));
        tokens
    }

    /// Get token count
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    /// Check if a token exists
    pub fn exists(&self, address: &Address) -> bool {
        self.tokens.contains_key(address)
    }

    fn token_mut(&mut self, address: &Address) -> Result<&mut Token, TokenError> {
        self.tokens
            .get_mut(address)
            .ok_or_else(|| TokenError::TokenNotFound(address.clone()))
    }

    /// Transfer tokens
    pub fn transfer(
        &mut self,
        token_address: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        self.token_mut(token_address)?.transfer(from, to, amount)
    }

    /// Mint new tokens
    pub fn mint(
        &mut self,
        token_address: &Address,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        self.token_mut(token_address)?.mint(caller, to, amount)
    }

    /// Burn tokens
    pub fn burn(
        &mut self,
        token_address: &Address,
        from: &Address,
        amount: u128,
    ) -> Result<TransferEvent, TokenError> {
        self.token_mut(token_address)?.burn(from, amount)
    }

    /// Get balance of a holder for a specific token
    pub fn balance_of(&self, token_address: &Address, holder: &Address) -> Result<u128, TokenError> {
        let token = self
            .tokens
            .get(token_address)
            .ok_or_else(|| TokenError::TokenNotFound(token_address.clone()))?;

        Ok(token.balance_of(holder))
    }

    /// Get all tokens held by an address
    pub fn tokens_for_holder(&self, holder: &Address) -> Vec<(&Token, u128)> {
        self.list()
            .into_iter()
            .filter_map(|token| {
                let balance = token.balance_of(holder);
                (balance > 0).then_some((token, balance))
            })
            .collect()
    }
}

impl AssetLedger for TokenManager {
    type Error = TokenError;

    /// Unknown tokens report a zero balance
    fn asset_balance(&self, asset: &Address, holder: &Address) -> u128 {
        self.balance_of(asset, holder).unwrap_or(0)
    }

    fn send_asset(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.transfer(asset, from, to, amount).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn deploy(manager: &mut TokenManager, symbol: &str, supply: u128) -> Token {
        manager
            .create_token(
                format!("Test Token {}", symbol),
                symbol.to_string(),
                18,
                supply,
                &addr("creator"),
            )
            .unwrap()
    }

    #[test]
    fn test_manager_creation() {
        let manager = TokenManager::new();
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_token_creation() {
        let mut manager = TokenManager::new();
        let token = deploy(&mut manager, "TTA", 1_000_000);

        assert!(token.address.as_str().starts_with("0x"));
        assert!(manager.exists(&token.address));
        assert_eq!(token.balance_of(&addr("creator")), 1_000_000);
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_same_symbol_gets_distinct_addresses() {
        let mut manager = TokenManager::new();
        let a = deploy(&mut manager, "TTA", 1);
        let b = deploy(&mut manager, "TTA", 1);
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn test_transfer_via_manager() {
        let mut manager = TokenManager::new();
        let address = deploy(&mut manager, "TTA", 1_000_000).address;

        manager
            .transfer(&address, &addr("creator"), &addr("recipient"), 1000)
            .unwrap();

        assert_eq!(manager.balance_of(&address, &addr("creator")).unwrap(), 999_000);
        assert_eq!(manager.balance_of(&address, &addr("recipient")).unwrap(), 1000);
    }

    #[test]
    fn test_mint_then_transfer() {
        let mut manager = TokenManager::new();
        let address = deploy(&mut manager, "TTA", 0).address;

        manager
            .mint(&address, &addr("creator"), &addr("owner"), 10_000)
            .unwrap();
        manager
            .transfer(&address, &addr("owner"), &addr("vault"), 10_000)
            .unwrap();

        assert_eq!(manager.balance_of(&address, &addr("vault")).unwrap(), 10_000);
        assert_eq!(manager.balance_of(&address, &addr("owner")).unwrap(), 0);
    }

    #[test]
    fn test_tokens_for_holder() {
        let mut manager = TokenManager::new();
        let token1 = deploy(&mut manager, "TK1", 1000);
        let _token2 = deploy(&mut manager, "TK2", 2000);

        assert_eq!(manager.tokens_for_holder(&addr("creator")).len(), 2);
        assert!(manager.tokens_for_holder(&addr("bob")).is_empty());

        manager
            .transfer(&token1.address, &addr("creator"), &addr("bob"), 500)
            .unwrap();

        let bob_tokens = manager.tokens_for_holder(&addr("bob"));
        assert_eq!(bob_tokens.len(), 1);
        assert_eq!(bob_tokens[0].1, 500);
    }

    #[test]
    fn test_transfer_nonexistent_token() {
        let mut manager = TokenManager::new();

        let result = manager.transfer(&addr("0xnone"), &addr("from"), &addr("to"), 100);
        assert!(matches!(result, Err(TokenError::TokenNotFound(_))));
    }

    #[test]
    fn test_asset_ledger_view() {
        let mut manager = TokenManager::new();
        let address = deploy(&mut manager, "TTA", 300).address;

        assert_eq!(manager.asset_balance(&address, &addr("creator")), 300);
        assert_eq!(manager.asset_balance(&addr("0xmissing"), &addr("creator")), 0);

        manager
            .send_asset(&address, &addr("creator"), &addr("bob"), 100)
            .unwrap();
        assert_eq!(manager.asset_balance(&address, &addr("bob")), 100);

        let err = manager
            .send_asset(&address, &addr("creator"), &addr("bob"), 1000)
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { have: 200, .. }));
    }
}
