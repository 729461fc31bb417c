//! Chain values and human-entered decimal amounts.
//!
//! Addresses, 32-byte words and 256-bit integers are the `ethereum-types`
//! re-exported by `ethabi`. Their serde form is `0x`-hex.

use thiserror::Error;

use crate::error::{Error, Result};

pub use ethabi::ethereum_types::{Address, H256, U256};

/// Parse a 20-byte address written as 40 hex digits, `0x` optional.
pub fn parse_address(s: &str) -> Result<Address> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != 40 {
        return Err(Error::InvalidAddress(s.to_string()));
    }
    let bytes = hex::decode(digits).map_err(|_| Error::InvalidAddress(s.to_string()))?;
    Ok(Address::from_slice(&bytes))
}

// ── Units ───────────────────────────────────────────────────────────────────

/// Why a human-entered decimal amount could not be scaled to base units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseUnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is negative")]
    Negative,
    #[error("amount is not a decimal number")]
    Invalid,
    #[error("amount has more than {0} fractional digits")]
    TooManyDecimals(u8),
    #[error("amount does not fit in 256 bits")]
    Overflow,
}

/// Scale a plain decimal string such as `"1.25"` by `10^decimals`.
///
/// Exponents, signs other than a leading `-` and `inf`/`NaN` spellings are
/// rejected. Fractional digits beyond `decimals` are an error, never truncated.
pub fn parse_units(input: &str, decimals: u8) -> std::result::Result<U256, ParseUnitsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseUnitsError::Empty);
    }
    if input.starts_with('-') {
        return Err(ParseUnitsError::Negative);
    }

    let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(ParseUnitsError::Invalid);
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(ParseUnitsError::Invalid);
    }

    let frac = frac.trim_end_matches('0');
    if frac.len() > decimals as usize {
        return Err(ParseUnitsError::TooManyDecimals(decimals));
    }

    let padded = format!("{whole}{frac:0<width$}", width = decimals as usize);
    let digits = padded.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| ParseUnitsError::Overflow)
}

/// Render a base-unit amount as a decimal string with trailing zeros trimmed.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}
