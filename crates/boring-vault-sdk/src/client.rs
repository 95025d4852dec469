use crate::abi::IERC20;
use crate::config::{Token, VaultConfig};
use crate::indexer::{HttpIndexer, RequestIndexer};
use crate::provider::{read, EvmProvider, EvmSigner, TransactionRequest};
use crate::status::{Phase, Status, StatusTracker};
use crate::{ConfigError, VaultError};
use alloy_primitives::aliases::{U24, U40, U96};
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use chrono::Utc;
use log::{debug, info};

/// Validity window of permits signed by the client
pub const PERMIT_VALIDITY_SECONDS: u64 = 3_600;

/// Label of the `"{label} reverted"` status shared by most writes
pub(crate) const TRANSACTION: &str = "Transaction";

/// Client for one vault deployment.
///
/// Construction validates the configuration and resolves the vault's share
/// decimals, so every operation can assume the contracts are known. Write
/// operations take the signer per call; `P` is used for reads.
pub struct VaultClient<P, I = HttpIndexer> {
    pub(crate) config: VaultConfig,
    pub(crate) provider: P,
    pub(crate) indexer: I,
    pub(crate) vault_decimals: u8,
    pub(crate) deposit_status: StatusTracker,
    pub(crate) withdraw_status: StatusTracker,
    pub(crate) bridge_status: StatusTracker,
    pub(crate) claim_status: StatusTracker,
}

impl<P: EvmProvider> VaultClient<P, HttpIndexer> {
    /// Connects with the REST indexer named in the configuration
    pub fn connect(config: VaultConfig, provider: P) -> Result<Self, ConfigError> {
        let indexer = HttpIndexer::new(&config.indexer_url);
        Self::with_indexer(config, provider, indexer)
    }
}

impl<P: EvmProvider, I: RequestIndexer> VaultClient<P, I> {
    pub fn with_indexer(config: VaultConfig, provider: P, indexer: I) -> Result<Self, ConfigError> {
        config.validate()?;
        let vault_decimals = match config.vault_decimals {
            Some(decimals) => decimals,
            None => {
                read(&provider, config.vault, &IERC20::decimalsCall {})
                    .map_err(ConfigError::VaultDecimals)?
                    .decimals
            }
        };
        info!(
            "connected to vault {} on {} ({vault_decimals} decimals)",
            config.vault, config.chain
        );

        Ok(Self {
            config,
            provider,
            indexer,
            vault_decimals,
            deposit_status: StatusTracker::default(),
            withdraw_status: StatusTracker::default(),
            bridge_status: StatusTracker::default(),
            claim_status: StatusTracker::default(),
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn vault_decimals(&self) -> u8 {
        self.vault_decimals
    }

    pub fn base_token(&self) -> &Token {
        &self.config.base_token
    }

    pub fn token_by_address(&self, address: Address) -> Option<&Token> {
        self.config.token(address)
    }

    pub fn deposit_status(&self) -> Status {
        self.deposit_status.get()
    }

    pub fn withdraw_status(&self) -> Status {
        self.withdraw_status.get()
    }

    pub fn bridge_status(&self) -> Status {
        self.bridge_status.get()
    }

    pub fn claim_status(&self) -> Status {
        self.claim_status.get()
    }

    pub(crate) fn known_token(&self, address: Address) -> Result<&Token, VaultError> {
        self.config
            .token(address)
            .ok_or(VaultError::UnknownToken(address))
    }

    /// Approves `spender` for `amount` of `token` unless the current
    /// allowance already covers it. Re-checked on every call.
    pub(crate) fn ensure_allowance<S>(
        &self,
        signer: &S,
        tracker: &StatusTracker,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), VaultError>
    where
        S: EvmSigner + ?Sized,
    {
        let owner = signer.address();
        let current = read(&self.provider, token, &IERC20::allowanceCall { owner, spender })?.amount;
        if current >= amount {
            debug!("allowance of {spender} on {token} is {current}, no approval needed");
            return Ok(());
        }

        tracker.transition(Phase::Approving);
        info!("approving {spender} for {amount} of {token}");
        let receipt = signer.send_transaction(TransactionRequest::new(
            token,
            &IERC20::approveCall { spender, amount },
        ))?;
        match receipt.transaction_hash {
            Some(_) if receipt.status => Ok(()),
            _ => Err(VaultError::ApprovalReverted),
        }
    }

    /// Sends `call` to `to` and waits for its receipt. A receipt without a
    /// hash or with a failed status is reported as `"{label} reverted"`.
    pub(crate) fn submit<S, C>(
        &self,
        signer: &S,
        tracker: &StatusTracker,
        to: Address,
        call: &C,
        value: U256,
        label: &'static str,
    ) -> Result<B256, VaultError>
    where
        S: EvmSigner + ?Sized,
        C: SolCall,
    {
        tracker.transition(Phase::Submitted);
        info!("submitting {} to {to}", C::SIGNATURE);
        let receipt = signer.send_transaction(TransactionRequest::new(to, call).with_value(value))?;
        match receipt.transaction_hash {
            Some(hash) if receipt.status => Ok(hash),
            _ => Err(VaultError::Reverted(label)),
        }
    }
}

pub(crate) fn require(address: Option<Address>) -> Result<Address, VaultError> {
    address.ok_or(VaultError::NotReady)
}

pub(crate) fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

// Narrow a value into a uint96, uint24 or uint40 contract field, rejecting
// values the field cannot hold.

pub(crate) fn to_u96(value: u128, field: &'static str) -> Result<U96, VaultError> {
    U96::try_from(value).map_err(|_| VaultError::ValueTooLarge(field))
}

pub(crate) fn to_u24(value: u64, field: &'static str) -> Result<U24, VaultError> {
    U24::try_from(value).map_err(|_| VaultError::ValueTooLarge(field))
}

pub(crate) fn to_u40(value: u64, field: &'static str) -> Result<U40, VaultError> {
    U40::try_from(value).map_err(|_| VaultError::ValueTooLarge(field))
}

pub(crate) fn to_u128(value: U256, field: &'static str) -> Result<u128, VaultError> {
    u128::try_from(value).map_err(|_| VaultError::ValueTooLarge(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrowing_bounds() {
        assert_eq!(
            to_u96((1u128 << 96) - 1, "shares").unwrap().to::<u128>(),
            (1u128 << 96) - 1
        );
        assert!(matches!(
            to_u96(1u128 << 96, "shares"),
            Err(VaultError::ValueTooLarge("shares"))
        ));
        assert_eq!(to_u24((1 << 24) - 1, "seconds").unwrap().to::<u32>(), (1 << 24) - 1);
        assert!(to_u24(1 << 24, "seconds").is_err());
        assert_eq!(to_u40(1_700_000_000, "creationTime").unwrap(), U40::from(1_700_000_000u64));
        assert!(to_u40(1 << 40, "creationTime").is_err());
        assert_eq!(to_u128(U256::from(7u8), "x").unwrap(), 7);
        assert!(to_u128(U256::MAX, "x").is_err());
    }

    #[test]
    fn test_require_missing_contract() {
        assert!(matches!(require(None), Err(VaultError::NotReady)));
        let address = Address::repeat_byte(1);
        assert_eq!(require(Some(address)).unwrap(), address);
    }
}
