//! Data models for bank accounts
//!
//! `AccountNumber` fields are private to force validation through the
//! public API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::currency::Currency;
use crate::error::LedgerError;

/// Validated bank account number (`PREFIX-123456`)
///
/// Guaranteed uppercase, dash-separated, 3-32 characters. Construction goes
/// through [`AccountNumber::new`]; storage and wire values round-trip
/// losslessly as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Create a new validated AccountNumber
    ///
    /// # Validation Rules
    /// - Length: 3-32 characters
    /// - Only A-Z, 0-9 and `-`
    /// - No leading or trailing dash
    pub fn new(raw: &str) -> Result<Self, LedgerError> {
        let raw = raw.trim();

        if raw.len() < 3 || raw.len() > 32 {
            return Err(LedgerError::InvalidAccountNumber(raw.to_string()));
        }

        if !raw
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(LedgerError::InvalidAccountNumber(raw.to_string()));
        }

        if raw.starts_with('-') || raw.ends_with('-') {
            return Err(LedgerError::InvalidAccountNumber(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    /// Get the validated account number as &str
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into owned String
    pub fn into_string(self) -> String {
        self.0
    }

    /// Check whether this number belongs to the bank with the given prefix
    ///
    /// The separator is part of the match: prefix `BANK` owns `BANK-...` but
    /// not `BANKX-...`.
    pub fn is_local(&self, bank_prefix: &str) -> bool {
        self.0
            .strip_prefix(bank_prefix)
            .is_some_and(|rest| rest.starts_with('-'))
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountNumber {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountNumber::new(s)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountNumber::new(&value)
    }
}

impl From<AccountNumber> for String {
    fn from(value: AccountNumber) -> Self {
        value.0
    }
}

/// Bank account
///
/// `balance` is mutated only through the transfer engine or the deposit
/// operation, and never drops below zero.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub owner_id: i64,
    #[schema(value_type = String, example = "BANK-482951")]
    pub account_number: AccountNumber,
    pub currency: Currency,
    #[schema(value_type = String, example = "100.00")]
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}
