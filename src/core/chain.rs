//! Chain id and address normalization

use crate::error::WalletError;
use alloy_primitives::Address;
use std::str::FromStr;

/// Render a numeric chain id as `0x`-prefixed lowercase hex.
pub fn to_hex(chain_id: u64) -> String { format!("0x{:x}", chain_id) }

/// Parse a chain id reported by a wallet. Accepts `0x`/`0X` hex or plain decimal.
pub fn parse_chain_id(raw: &str) -> Result<u64, WalletError> {
    let s = raw.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) if !digits.is_empty() => u64::from_str_radix(digits, 16).ok(),
        Some(_) => None,
        None => s.parse::<u64>().ok(),
    };
    parsed.ok_or_else(|| WalletError::InvalidChainId(raw.to_string()))
}

/// Canonical chain id: lowercase hex, `0x` prefix, no leading zeros.
pub fn normalize_chain_id(raw: &str) -> Result<String, WalletError> { parse_chain_id(raw).map(to_hex) }

/// Case-insensitive chain id comparison (`"0xA869" == "0xa869"`).
pub fn same_chain(a: &str, b: &str) -> bool {
    match (parse_chain_id(a), parse_chain_id(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// `0x`-prefixed 20-byte hex address. Checksum casing is not enforced.
pub fn is_address(value: &str) -> bool { parse_address(value).is_ok() }

pub fn parse_address(value: &str) -> Result<Address, WalletError> {
    let s = value.trim();
    let invalid = || WalletError::InvalidAddress(value.to_string());
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).ok_or_else(invalid)?;
    if digits.len() != 40 { return Err(invalid()); }
    Address::from_str(digits).map_err(|_| invalid())
}

/// Lowercase account address with a lowercase `0x` prefix.
pub fn normalize_address(value: &str) -> String { value.trim().to_ascii_lowercase() }
