//! Withdraw queue policy: discount encodings and per-asset bounds.

use crate::abi::IBoringOnChainQueue;
use crate::VaultError;
use common::{percent_to_units, UnitsError};

pub const MAX_UINT24: u64 = (1 << 24) - 1;

/// The two queue contracts encode discounts on different scales. The
/// difference is part of the contracts' ABI and is kept per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueVariant {
    /// Allowance-based atomic queue, 1% = 10000
    Legacy,
    /// Permit-capable boring on-chain queue, 1% = 100 (basis points)
    Permit,
}

impl QueueVariant {
    pub fn encode_discount(self, percent: &str) -> Result<u128, UnitsError> {
        match self {
            Self::Legacy => percent_to_units(percent, 10_000),
            Self::Permit => percent_to_units(percent, 100),
        }
    }
}

/// Per-asset withdraw policy of the boring queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoringQueueAssetParams {
    pub allow_withdraws: bool,
    pub seconds_to_maturity: u32,
    pub minimum_seconds_to_deadline: u32,
    pub min_discount: u16,
    pub max_discount: u16,
    pub minimum_shares: u128,
}

impl From<IBoringOnChainQueue::withdrawAssetsReturn> for BoringQueueAssetParams {
    fn from(ret: IBoringOnChainQueue::withdrawAssetsReturn) -> Self {
        Self {
            allow_withdraws: ret.allowWithdraws,
            seconds_to_maturity: ret.secondsToMaturity.to::<u32>(),
            minimum_seconds_to_deadline: ret.minimumSecondsToDeadline.to::<u32>(),
            min_discount: ret.minDiscount,
            max_discount: ret.maxDiscount,
            minimum_shares: ret.minimumShares.to::<u128>(),
        }
    }
}

/// Discount and deadline a boring-queue request will be submitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawTerms {
    pub discount: u16,
    pub seconds_to_deadline: u32,
}

impl BoringQueueAssetParams {
    /// Checks a request against the asset policy. An omitted discount uses
    /// `min_discount`, an omitted deadline uses `minimum_seconds_to_deadline`.
    pub fn resolve_terms(
        &self,
        shares: u128,
        discount: Option<u128>,
        seconds_to_deadline: Option<u64>,
    ) -> Result<WithdrawTerms, VaultError> {
        if shares < self.minimum_shares {
            return Err(VaultError::BelowMinimumShares {
                requested: shares,
                minimum: self.minimum_shares,
            });
        }

        let discount = discount.unwrap_or(self.min_discount as u128);
        if discount < self.min_discount as u128 || discount > self.max_discount as u128 {
            return Err(VaultError::DiscountOutOfRange {
                requested: discount,
                min: self.min_discount,
                max: self.max_discount,
            });
        }

        let seconds = seconds_to_deadline.unwrap_or(self.minimum_seconds_to_deadline as u64);
        if seconds < self.minimum_seconds_to_deadline as u64 {
            return Err(VaultError::DeadlineTooShort {
                requested: seconds,
                minimum: self.minimum_seconds_to_deadline as u64,
            });
        }
        if seconds > MAX_UINT24 {
            return Err(VaultError::ValueTooLarge("secondsToDeadline"));
        }

        Ok(WithdrawTerms {
            // bounded by max_discount above
            discount: discount as u16,
            seconds_to_deadline: seconds as u32,
        })
    }
}
