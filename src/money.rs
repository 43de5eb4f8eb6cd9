//! Money Parsing
//!
//! Client-facing amounts travel as strings (JSON floats silently lose
//! precision); parsing into [`Decimal`] happens exactly once at the API
//! boundary, here. Internal code only ever sees validated `Decimal` values.
//!
//! Fiat amounts carry at most two fractional digits.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::LedgerError;

/// Maximum fractional digits accepted for fiat amounts
pub const MAX_SCALE: u32 = 2;

/// Parse a client-provided amount string into a positive `Decimal`
///
/// Rejects empty strings, non-numeric input, zero and negative values, and
/// amounts with more than [`MAX_SCALE`] decimal places.
pub fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LedgerError::MissingField("amount"));
    }

    let amount = Decimal::from_str(raw).map_err(|_| LedgerError::InvalidAmount)?;
    require_positive(amount)?;

    // Check the normalized value, not the textual scale: "1.10" is fine.
    if amount.normalize().scale() > MAX_SCALE {
        return Err(LedgerError::PrecisionOverflow);
    }

    Ok(amount.normalize())
}

/// Require a strictly positive amount
pub fn require_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(())
}
