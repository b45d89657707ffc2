//! Decimal currency amounts <-> integer base units (wei)
//!
//! Conversion is alloy's. This layer only narrows the accepted input: plain
//! decimal digits, no sign or exponent, and no more fractional digits than the
//! unit carries (alloy would silently truncate them).

use crate::core::consts::NATIVE_DECIMALS;
use crate::error::WalletError;
use alloy_primitives::utils::{self, ParseUnits};
use alloy_primitives::U256;

/// Parse a decimal amount ("0.001") into base units with `decimals` fractional digits.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256, WalletError> {
    let invalid = || WalletError::InvalidAmount(value.to_string());
    let s = value.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits(whole) || !digits(frac) || frac.len() > decimals as usize {
        return Err(invalid());
    }

    let canonical = format!(
        "{}.{}",
        if whole.is_empty() { "0" } else { whole },
        if frac.is_empty() { "0" } else { frac }
    );
    match utils::parse_units(&canonical, decimals) {
        Ok(ParseUnits::U256(amount)) => Ok(amount),
        Ok(ParseUnits::I256(_)) | Err(_) => Err(invalid()),
    }
}

pub fn parse_ether(value: &str) -> Result<U256, WalletError> { parse_units(value, NATIVE_DECIMALS) }

/// Render base units as a decimal string, trimming trailing fractional zeros ("1.0" stays "1.0").
pub fn format_units(amount: U256, decimals: u8) -> Result<String, WalletError> {
    utils::format_units(amount, decimals)
        .map(|s| trim_fraction(&s))
        .map_err(|e| WalletError::InvalidAmount(format!("{} ({})", amount, e)))
}

pub fn format_ether(amount: U256) -> String { trim_fraction(&utils::format_ether(amount)) }

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            format!("{}.{}", whole, if frac.is_empty() { "0" } else { frac })
        }
        None => format!("{}.0", formatted),
    }
}
