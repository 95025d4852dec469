//! Base-unit conversions for vault amounts
//!
//! This module provides:
//! - Parsing of human-entered decimal strings without floating point
//! - Truncating conversion into integer base units
//! - Zero-padded formatting of raw integer amounts
//! - Percent, basis-point and day conversions used by the withdraw queues

use crate::UnitsError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Digits a `Decimal` holds without rounding
const MAX_DIGITS: usize = 28;

/// Parses a human-entered decimal string
///
/// # Arguments
/// * `value` - The decimal string, e.g. `"1.5"`
///
/// # Errors
/// * `UnitsError::InvalidAmount` if the string is not a decimal number
/// * `UnitsError::NegativeAmount` if the number is below zero
///
/// Fractional digits beyond what a `Decimal` can carry are dropped, so the
/// result never exceeds the written value.
pub fn parse_decimal(value: &str) -> Result<Decimal, UnitsError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::InvalidAmount(value.to_string()));
    }
    let decimal = Decimal::from_str(truncate_fraction(trimmed))
        .map_err(|_| UnitsError::InvalidAmount(value.to_string()))?;
    if decimal < Decimal::ZERO {
        return Err(UnitsError::NegativeAmount(value.to_string()));
    }
    Ok(decimal)
}

// Decimal::from_str rounds to nearest once the digits run past its
// precision, which can round up. Cut the fraction first.
fn truncate_fraction(value: &str) -> &str {
    let Some((whole, fraction)) = value.split_once('.') else {
        return value;
    };
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return value;
    }
    let whole_digits = whole
        .trim_start_matches(['+', '-'])
        .trim_start_matches('0')
        .len();
    let keep = MAX_DIGITS.saturating_sub(whole_digits).min(fraction.len());
    if keep == 0 {
        return whole;
    }
    &value[..whole.len() + 1 + keep]
}

/// Converts a decimal into integer base units, truncating toward zero
///
/// # Arguments
/// * `amount` - The human readable amount
/// * `decimals` - Number of decimal places of the token
///
/// # Returns
/// * `Result<u128>` - `amount × 10^decimals` with any excess precision dropped
pub fn decimal_to_base_units(amount: Decimal, decimals: u8) -> Result<u128, UnitsError> {
    if amount < Decimal::ZERO {
        return Err(UnitsError::NegativeAmount(amount.to_string()));
    }
    let truncated = amount.round_dp_with_strategy(decimals as u32, RoundingStrategy::ToZero);
    let scale = truncated.scale();
    let mantissa = u128::try_from(truncated.mantissa()).map_err(|_| UnitsError::Overflow)?;
    // scale never exceeds `decimals` after rounding
    let factor = 10u128
        .checked_pow(decimals as u32 - scale)
        .ok_or(UnitsError::Overflow)?;
    mantissa.checked_mul(factor).ok_or(UnitsError::Overflow)
}

/// Parses `amount` and converts it into base units of a token with `decimals`
pub fn to_base_units(amount: &str, decimals: u8) -> Result<u128, UnitsError> {
    decimal_to_base_units(parse_decimal(amount)?, decimals)
}

/// Renders a raw integer amount as a decimal string with exactly `decimals`
/// fractional digits, e.g. `format_units(0, 6) == "0.000000"`
pub fn format_units(raw: u128, decimals: u8) -> String {
    let digits = raw.to_string();
    if decimals == 0 {
        return digits;
    }
    let places = decimals as usize;
    let padded = format!("{digits:0>width$}", width = places + 1);
    let (whole, fraction) = padded.split_at(padded.len() - places);
    format!("{whole}.{fraction}")
}

/// Converts a percentage string into integer units using a fixed multiplier,
/// truncating toward zero. `percent_to_units("2", 100) == 200`.
pub fn percent_to_units(percent: &str, multiplier: u32) -> Result<u128, UnitsError> {
    multiply_truncated(parse_decimal(percent)?, multiplier as u128)
}

/// Converts a (possibly fractional) number of days into whole seconds
pub fn days_to_seconds(days: &str) -> Result<u64, UnitsError> {
    let seconds = multiply_truncated(parse_decimal(days)?, SECONDS_PER_DAY as u128)?;
    u64::try_from(seconds).map_err(|_| UnitsError::Overflow)
}

// `amount × multiplier` rounded down, on the integer mantissa. Decimal
// multiplication rounds its result once it runs out of digits.
fn multiply_truncated(amount: Decimal, multiplier: u128) -> Result<u128, UnitsError> {
    let mantissa =
        u128::try_from(amount.mantissa()).map_err(|_| UnitsError::NegativeAmount(amount.to_string()))?;
    let divisor = 10u128
        .checked_pow(amount.scale())
        .ok_or(UnitsError::Overflow)?;
    mantissa
        .checked_mul(multiplier)
        .map(|product| product / divisor)
        .ok_or(UnitsError::Overflow)
}

/// Computes how many shares `assets` buy at `rate`, where `rate` is the price
/// of one whole share expressed in asset base units.
///
/// `shares = assets × 10^share_decimals / rate`, rounded down.
pub fn shares_at_rate(assets: u128, rate: u128, share_decimals: u8) -> Result<u128, UnitsError> {
    if rate == 0 {
        return Err(UnitsError::DivisionByZero);
    }
    let one_share = 10u128
        .checked_pow(share_decimals as u32)
        .ok_or(UnitsError::Overflow)?;
    assets
        .checked_mul(one_share)
        .map(|scaled| scaled / rate)
        .ok_or(UnitsError::Overflow)
}
