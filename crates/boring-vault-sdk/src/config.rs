use crate::indexer::DEFAULT_INDEXER_URL;
use crate::ConfigError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A fungible asset the vault accepts or pays out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub address: Address,
    pub decimals: u8,
    pub display_name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Token {
    pub fn new(address: Address, decimals: u8, display_name: impl Into<String>) -> Self {
        Self {
            address,
            decimals,
            display_name: display_name.into(),
            image: None,
        }
    }
}

/// Immutable configuration of one vault deployment.
///
/// Optional contracts gate the operations that need them: an operation
/// whose contract is absent fails with "Contracts or user not ready".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultConfig {
    pub chain: String,
    pub vault: Address,
    pub teller: Address,
    pub accountant: Address,
    pub lens: Address,
    #[serde(default)]
    pub delay_withdraw: Option<Address>,
    #[serde(default)]
    pub withdraw_queue: Option<Address>,
    #[serde(default)]
    pub boring_queue: Option<Address>,
    #[serde(default)]
    pub layer_zero_teller: Option<Address>,
    #[serde(default)]
    pub incentive_distributor: Option<Address>,
    pub base_token: Token,
    #[serde(default)]
    pub deposit_tokens: Vec<Token>,
    #[serde(default)]
    pub withdraw_tokens: Vec<Token>,
    /// Read from the vault contract when absent
    #[serde(default)]
    pub vault_decimals: Option<u8>,
    #[serde(default = "default_indexer_url")]
    pub indexer_url: String,
    /// Path segment of the merkle rewards endpoint
    #[serde(default)]
    pub vault_slug: Option<String>,
}

fn default_indexer_url() -> String {
    DEFAULT_INDEXER_URL.to_string()
}

impl VaultConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("vault", self.vault),
            ("teller", self.teller),
            ("accountant", self.accountant),
            ("lens", self.lens),
            ("base token", self.base_token.address),
        ];
        for (name, address) in required {
            if address.is_zero() {
                return Err(ConfigError::MissingAddress(name));
            }
        }

        let optional = [
            ("delay withdraw", self.delay_withdraw),
            ("withdraw queue", self.withdraw_queue),
            ("boring queue", self.boring_queue),
            ("layer zero teller", self.layer_zero_teller),
            ("incentive distributor", self.incentive_distributor),
        ];
        for (name, address) in optional {
            if address.is_some_and(|a| a.is_zero()) {
                return Err(ConfigError::MissingAddress(name));
            }
        }

        if self.chain.trim().is_empty() {
            return Err(ConfigError::Invalid("chain must not be empty".to_string()));
        }
        Ok(())
    }

    /// Finds a configured token by address. Address comparison is byte-wise,
    /// so hex casing does not matter.
    pub fn token(&self, address: Address) -> Option<&Token> {
        std::iter::once(&self.base_token)
            .chain(&self.deposit_tokens)
            .chain(&self.withdraw_tokens)
            .find(|token| token.address == address)
    }
}
