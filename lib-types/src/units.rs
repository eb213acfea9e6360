//! Unit conversion and floor-division helpers.
//!
//! Every proportional computation in the ledger (purchase cost, sponsor
//! match, claim entitlement) goes through [`mul_div_floor`], so rounding is
//! truncating and identical everywhere.

use primitive_types::U512;

use crate::errors::UnitsError;
use crate::primitives::{Amount, Bps, MAX_BPS, TOKEN_DECIMALS};

/// One whole token (10^18 smallest units)
pub fn one_token() -> Amount {
    Amount::exp10(TOKEN_DECIMALS as usize)
}

/// `n` whole tokens in smallest units
pub fn tokens(n: u64) -> Amount {
    Amount::from(n) * one_token()
}

/// floor(a * b / d) computed without intermediate overflow.
///
/// Returns `None` on division by zero or when the quotient does not fit in
/// 256 bits.
pub fn mul_div_floor(a: Amount, b: Amount, d: Amount) -> Option<Amount> {
    if d.is_zero() {
        return None;
    }
    let product: U512 = a.full_mul(b);
    let quotient = product / U512::from(d);
    Amount::try_from(quotient).ok()
}

/// floor(amount * bps / 10_000)
pub fn bps_of(amount: Amount, bps: Bps) -> Option<Amount> {
    mul_div_floor(amount, Amount::from(bps), Amount::from(MAX_BPS))
}

/// Parse a decimal string with up to `decimals` fractional digits into
/// smallest units. `parse_units("0.01", 18)` == 10^16.
pub fn parse_units(text: &str, decimals: u32) -> Result<Amount, UnitsError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::Empty);
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(UnitsError::InvalidDigit(text.to_string()));
    }
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals {
            max: decimals,
            got: fraction.len(),
        });
    }

    let scale = Amount::exp10(decimals as usize);
    let whole_units = if whole.is_empty() {
        Amount::zero()
    } else {
        Amount::from_dec_str(whole).map_err(|_| UnitsError::Overflow)?
    };
    let fraction_units = if fraction.is_empty() {
        Amount::zero()
    } else {
        let padding = decimals as usize - fraction.len();
        Amount::from_dec_str(fraction)
            .map_err(|_| UnitsError::Overflow)?
            .checked_mul(Amount::exp10(padding))
            .ok_or(UnitsError::Overflow)?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or(UnitsError::Overflow)
}

/// Render smallest units as a decimal string, trimming trailing zeros.
/// `format_units(1.5e18, 18)` == "1.5".
pub fn format_units(amount: Amount, decimals: u32) -> String {
    let scale = Amount::exp10(decimals as usize);
    let whole = amount / scale;
    let fraction = amount % scale;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let padded = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}
