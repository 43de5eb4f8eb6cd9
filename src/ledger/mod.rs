//! Transaction Ledger
//!
//! Append-only record of money movement. Entries are immutable after
//! creation except for `status`, which only external transfers advance
//! (`pending -> inProgress -> completed | failed`).

pub mod entry;

pub use entry::{NewTransaction, Transaction, TransactionStatus, TransactionType};
