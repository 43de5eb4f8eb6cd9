//! Ledger Error Types
//!
//! One error enum for the whole core. Error codes are stable strings used in
//! API responses; internal detail (SQL text, connection errors) never reaches
//! the caller.

use thiserror::Error;

use crate::currency::Currency;

/// Ledger error types
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Amount must be a positive number")]
    InvalidAmount,

    #[error("Amount has too many decimal places")]
    PrecisionOverflow,

    #[error("Currency not supported: {0}")]
    UnsupportedCurrency(String),

    #[error("Sender and receiver account currencies must match")]
    CurrencyMismatch { from: Currency, to: Currency },

    #[error("Source and destination account cannot be the same")]
    SameAccount,

    #[error("Invalid account number: {0}")]
    InvalidAccountNumber(String),

    #[error("Destination account belongs to this bank, use an internal transfer")]
    DestinationNotExternal,

    // === Authorization Errors ===
    // One generic denial for both "not yours" and "exists but hidden".
    #[error("Account access denied")]
    NotOwner,

    // === Not Found ===
    #[error("Account not found")]
    AccountNotFound,

    #[error("Transaction not found")]
    TransactionNotFound,

    // === Business Rules ===
    #[error("Insufficient funds in sender account")]
    InsufficientFunds,

    // === Internal (retried, never surfaced directly) ===
    #[error("Account number already taken: {0}")]
    AccountNumberConflict(String),

    // === System Errors ===
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Settlement channel error: {0}")]
    Settlement(String),
}

impl LedgerError {
    /// Get the stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::MissingField(_) => "MISSING_FIELD",
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::PrecisionOverflow => "PRECISION_OVERFLOW",
            LedgerError::UnsupportedCurrency(_) => "UNSUPPORTED_CURRENCY",
            LedgerError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            LedgerError::SameAccount => "SAME_ACCOUNT",
            LedgerError::InvalidAccountNumber(_) => "INVALID_ACCOUNT_NUMBER",
            LedgerError::DestinationNotExternal => "DESTINATION_NOT_EXTERNAL",
            LedgerError::NotOwner => "FORBIDDEN",
            LedgerError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            LedgerError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            LedgerError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            LedgerError::AccountNumberConflict(_) => "ACCOUNT_NUMBER_CONFLICT",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::Settlement(_) => "SETTLEMENT_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::MissingField(_)
            | LedgerError::InvalidAmount
            | LedgerError::PrecisionOverflow
            | LedgerError::UnsupportedCurrency(_)
            | LedgerError::CurrencyMismatch { .. }
            | LedgerError::SameAccount
            | LedgerError::InvalidAccountNumber(_)
            | LedgerError::DestinationNotExternal
            | LedgerError::InsufficientFunds => 400,
            LedgerError::NotOwner => 403,
            LedgerError::AccountNotFound | LedgerError::TransactionNotFound => 404,
            LedgerError::AccountNumberConflict(_)
            | LedgerError::Storage(_)
            | LedgerError::Settlement(_) => 500,
        }
    }

    /// Message safe to show to the caller.
    ///
    /// Storage and settlement errors carry internal detail in `Display`; this
    /// strips it for the API surface (the full text still goes to the log).
    pub fn public_message(&self) -> String {
        match self {
            LedgerError::Storage(_) => "Internal storage error".to_string(),
            LedgerError::Settlement(_) => "Settlement channel unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Storage(e.to_string())
    }
}
