//! Signer registry
//!
//! The fixed signer set and quorum of a custody wallet. Validated once at
//! construction and never mutated afterwards.

use crate::core::Address;
use crate::crypto::hash160;
use crate::multisig::MultisigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for a quorum wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WalletConfig {
    /// Distinct approvals required to release funds
    pub quorum: usize,
    /// Authorized signers, in registration order
    pub signers: Vec<Address>,
    /// Optional human-readable label
    #[serde(default)]
    pub label: Option<String>,
}

impl WalletConfig {
    pub fn new(quorum: usize, signers: Vec<Address>, label: Option<String>) -> Self {
        Self {
            quorum,
            signers,
            label,
        }
    }

    /// Get description like "5-of-6"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.quorum, self.signers.len())
    }

    /// Derive the wallet's own identity
    ///
    /// Address = HASH160(quorum || sorted signers), so the same configuration
    /// always yields the same custody address.
    pub fn custody_address(&self) -> Address {
        let mut sorted_signers: Vec<&Address> = self.signers.iter().collect();
        sorted_signers.sort();

        let mut data = (self.quorum as u64).to_be_bytes().to_vec();
        for signer in sorted_signers {
            data.extend_from_slice(signer.as_str().as_bytes());
            data.push(0);
        }

        Address::from_bytes(&hash160(&data))
    }
}

/// Validated, immutable signer set with O(1) membership
///
/// Serialized as its [`WalletConfig`]; deserializing runs the same
/// validation as [`SignerRegistry::new`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "WalletConfig", into = "WalletConfig")]
pub struct SignerRegistry {
    config: WalletConfig,
    members: HashSet<Address>,
    custody_address: Address,
}

impl SignerRegistry {
    /// Validate a configuration and build the registry
    ///
    /// Identities are checked before the quorum: a null signer fails with
    /// `InvalidIdentity`, a repeated one with `DuplicateSigner`, and only then
    /// is `1 <= quorum <= signers` enforced.
    pub fn new(config: WalletConfig) -> Result<Self, MultisigError> {
        let mut members = HashSet::with_capacity(config.signers.len());

        for signer in &config.signers {
            if signer.is_zero() {
                return Err(MultisigError::InvalidIdentity("signer"));
            }
            if !members.insert(signer.clone()) {
                return Err(MultisigError::DuplicateSigner(signer.clone()));
            }
        }

        if config.quorum == 0 || config.quorum > config.signers.len() {
            return Err(MultisigError::InvalidQuorum {
                quorum: config.quorum,
                signers: config.signers.len(),
            });
        }

        let custody_address = config.custody_address();

        Ok(Self {
            config,
            members,
            custody_address,
        })
    }

    /// Check if an identity is an authorized signer
    pub fn is_member(&self, identity: &Address) -> bool {
        self.members.contains(identity)
    }

    pub fn quorum(&self) -> usize {
        self.config.quorum
    }

    /// Signers in registration order
    pub fn signers(&self) -> &[Address] {
        &self.config.signers
    }

    pub fn signer_count(&self) -> usize {
        self.config.signers.len()
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// The wallet's own identity on the native and asset ledgers
    pub fn custody_address(&self) -> &Address {
        &self.custody_address
    }

    pub fn description(&self) -> String {
        self.config.description()
    }
}

impl TryFrom<WalletConfig> for SignerRegistry {
    type Error = MultisigError;

    fn try_from(config: WalletConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl From<SignerRegistry> for WalletConfig {
    fn from(registry: SignerRegistry) -> Self {
        registry.config
    }
}
