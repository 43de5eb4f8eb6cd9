//! Ledger Entry Types
//!
//! Status strings match the persisted representation (`pending`,
//! `inProgress`, `completed`, `failed`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::account::AccountNumber;
use crate::currency::Currency;

/// Transfer lifecycle status
///
/// Internal transfers are single-shot and land directly on `Completed`.
/// External transfers walk `Pending -> InProgress -> Completed | Failed`.
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TransactionStatus {
    /// Check if this is a terminal status (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    /// Check whether the ledger accepts a `self -> to` status change
    pub fn can_transition(&self, to: TransactionStatus) -> bool {
        match (self, to) {
            (TransactionStatus::Pending, TransactionStatus::InProgress)
            | (TransactionStatus::Pending, TransactionStatus::Completed)
            | (TransactionStatus::Pending, TransactionStatus::Failed)
            | (TransactionStatus::InProgress, TransactionStatus::Completed)
            | (TransactionStatus::InProgress, TransactionStatus::Failed) => true,
            _ => false,
        }
    }

    /// Persisted representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::InProgress => "inProgress",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    /// Convert from the persisted representation
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "inProgress" => Some(TransactionStatus::InProgress),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionStatus::from_db(s).ok_or(())
    }
}

/// Transfer kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Both accounts held at this bank
    Internal,
    /// Destination account held at another institution
    External,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Internal => "internal",
            TransactionType::External => "external",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "internal" => Some(TransactionType::Internal),
            "external" => Some(TransactionType::External),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted ledger entry
///
/// `amount`, `from_account`, `to_account` and `currency` never change after
/// creation; only `status` may, and only while non-terminal.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    #[schema(value_type = String)]
    pub from_account: AccountNumber,
    /// External destinations are kept verbatim, so this is a plain string
    pub to_account: String,
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub owner_id: i64,
    pub transaction_type: TransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Client idempotency key, echoed back when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields the engine supplies when appending an entry (id and timestamp are
/// store-assigned)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub from_account: AccountNumber,
    pub to_account: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub owner_id: i64,
    pub transaction_type: TransactionType,
    pub external_id: Option<String>,
    pub cid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(!TransactionStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_transitions() {
        use TransactionStatus::*;
        assert!(Pending.can_transition(InProgress));
        assert!(Pending.can_transition(Failed));
        assert!(InProgress.can_transition(Completed));
        assert!(InProgress.can_transition(Failed));

        // Terminal statuses never move again
        assert!(!Completed.can_transition(Failed));
        assert!(!Failed.can_transition(Pending));
        assert!(!Completed.can_transition(InProgress));
        // No walking backwards
        assert!(!InProgress.can_transition(Pending));
    }

    #[test]
    fn test_status_db_roundtrip() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::InProgress,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
        ] {
            assert_eq!(TransactionStatus::from_db(status.as_str()), Some(status));
        }
        assert_eq!(TransactionStatus::from_db("settled"), None);
    }

    #[test]
    fn test_status_wire_format() {
        // The wire format is camelCase, matching the persisted strings
        let json = serde_json::to_string(&TransactionStatus::InProgress).unwrap();
        assert_eq!(json, "\"inProgress\"");
    }

    #[test]
    fn test_type_db_roundtrip() {
        assert_eq!(
            TransactionType::from_db("internal"),
            Some(TransactionType::Internal)
        );
        assert_eq!(
            TransactionType::from_db("external"),
            Some(TransactionType::External)
        );
        assert_eq!(TransactionType::from_db("wire"), None);
    }
}
