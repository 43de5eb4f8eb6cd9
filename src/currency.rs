//! Currency Policy
//!
//! Fixed set of currencies the bank opens accounts in. Internal transfers
//! additionally require both legs to carry the same currency.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Account currency (fixed allowed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
    Gbp,
}

impl Currency {
    /// All currencies accounts may be opened in
    pub const ALL: [Currency; 3] = [Currency::Eur, Currency::Usd, Currency::Gbp];

    /// ISO 4217 code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }

    /// Check a raw currency code against the allowed set
    pub fn is_allowed(code: &str) -> bool {
        Currency::from_str(code).is_ok()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            other => Err(LedgerError::UnsupportedCurrency(other.to_string())),
        }
    }
}

/// Require both legs of an internal transfer to carry the same currency
pub fn require_match(from: Currency, to: Currency) -> Result<(), LedgerError> {
    if from != to {
        return Err(LedgerError::CurrencyMismatch { from, to });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed() {
        assert_eq!("EUR".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" gbp ".parse::<Currency>().unwrap(), Currency::Gbp);
    }

    #[test]
    fn test_parse_rejected() {
        let err = "JPY".parse::<Currency>().unwrap_err();
        assert!(matches!(err, LedgerError::UnsupportedCurrency(_)));
        assert!(!Currency::is_allowed("CHF"));
        assert!(!Currency::is_allowed(""));
    }

    #[test]
    fn test_require_match() {
        assert!(require_match(Currency::Eur, Currency::Eur).is_ok());
        let err = require_match(Currency::Eur, Currency::Usd).unwrap_err();
        assert!(matches!(err, LedgerError::CurrencyMismatch { .. }));
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&Currency::Gbp).unwrap();
        assert_eq!(json, "\"GBP\"");
        let back: Currency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Currency::Gbp);
    }
}
