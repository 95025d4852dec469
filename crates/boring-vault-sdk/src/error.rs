use crate::permit::PermitError;
use crate::provider::ProviderError;
use alloy_primitives::{Address, U256};
use common::UnitsError;

/// Errors raised while building a [`crate::VaultClient`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {0} address")]
    MissingAddress(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Failed to read vault decimals: {0}")]
    VaultDecimals(ProviderError),
}

/// Errors surfaced by orchestrator operations.
///
/// The `Display` output of each variant is what ends up in
/// [`crate::Status::error`].
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    // Readiness
    #[error("Contracts or user not ready")]
    NotReady,
    #[error("Token {0} is not configured")]
    UnknownToken(Address),

    // Validation
    #[error(transparent)]
    Units(#[from] UnitsError),
    #[error("shares are locked until {unlock_time}")]
    SharesLocked { unlock_time: u64 },
    #[error("Withdraws not allowed for asset {0}")]
    WithdrawsNotAllowed(Address),
    #[error("Discount {requested} is outside the allowed range [{min}, {max}]")]
    DiscountOutOfRange { requested: u128, min: u16, max: u16 },
    #[error("Share amount {requested} is below the minimum of {minimum}")]
    BelowMinimumShares { requested: u128, minimum: u128 },
    #[error("Seconds to deadline {requested} is below the minimum of {minimum}")]
    DeadlineTooShort { requested: u64, minimum: u64 },
    #[error("{0} does not fit its on-chain field")]
    ValueTooLarge(&'static str),
    #[error("Bridge fee {fee} exceeds the maximum of {max_fee}")]
    FeeTooHigh { fee: U256, max_fee: U256 },

    // Authorization
    #[error("Token approval reverted")]
    ApprovalReverted,
    #[error("Error signing permit: {0}")]
    Permit(#[from] PermitError),
    #[error("Token does not support EIP-2612 permits")]
    PermitUnsupported,

    // Indexer reconciliation
    #[error("No request found for token")]
    NoRequestFound,
    #[error("Malformed indexer entry: {0}")]
    MalformedEntry(String),
    #[error("No incentives to claim")]
    NoIncentives,

    // Submission
    #[error("{0} reverted")]
    Reverted(&'static str),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
