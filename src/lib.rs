//! Bankcore - Retail Banking Ledger Core
//!
//! Account balances and money movement under strict consistency guarantees.
//! The hard part is the transfer engine: even under concurrent requests and
//! partial failures, money is never created, destroyed, or left in an
//! inconsistent state.
//!
//! # Modules
//!
//! - [`account`] - Account model, number allocation, open/list/deposit
//! - [`ledger`] - Append-only transaction ledger and status lifecycle
//! - [`transfer`] - Transfer engine, per-account locks, settlement channel
//! - [`store`] - Storage boundary (PostgreSQL and in-memory)
//! - [`currency`] - Allowed currency set and matching policy
//! - [`money`] - Boundary parsing of decimal amounts
//! - [`principal`] - Trusted authenticated identity, role lookup
//! - [`audit`] - Fire-and-forget audit sinks
//! - [`gateway`] - Axum HTTP adapter
//! - [`error`] - Crate-wide error taxonomy

pub mod account;
pub mod audit;
pub mod config;
pub mod currency;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod principal;
pub mod store;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountNumber, AccountNumberAllocator, AccountService};
pub use currency::Currency;
pub use error::LedgerError;
pub use ledger::{Transaction, TransactionStatus, TransactionType};
pub use principal::Principal;
pub use store::{MemStore, PgStore, Store};
pub use transfer::{
    MockSettlementChannel, SettlementChannel, SettlementOutcome, TransferEngine,
};
