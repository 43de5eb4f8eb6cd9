//! Storage boundary
//!
//! One trait covers accounts and the transaction ledger because the core
//! correctness requirement spans both: a transfer's debit, credit and ledger
//! insert must commit or roll back as a unit. Each `commit_*` method is that
//! unit; everything else is a plain read or single-row write.
//!
//! Two implementations:
//! - [`PgStore`]: PostgreSQL via sqlx, row locks + transactions
//! - [`MemStore`]: in-process maps behind one mutex, for tests and dev mode

pub mod memory;
pub mod pg;

pub use memory::MemStore;
pub use pg::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::account::{Account, AccountNumber};
use crate::currency::Currency;
use crate::error::LedgerError;
use crate::ledger::{NewTransaction, Transaction, TransactionStatus};

/// Durable storage for accounts and ledger entries
#[async_trait]
pub trait Store: Send + Sync {
    // === Accounts ===

    /// Create an account with zero balance.
    ///
    /// Fails with `AccountNumberConflict` when the number is taken (the
    /// caller re-derives and retries).
    async fn create_account(
        &self,
        owner_id: i64,
        currency: Currency,
        number: &AccountNumber,
    ) -> Result<Account, LedgerError>;

    async fn accounts_by_owner(&self, owner_id: i64) -> Result<Vec<Account>, LedgerError>;

    async fn account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, LedgerError>;

    /// All accounts, for the admin listing. Order irrelevant.
    async fn all_accounts(&self) -> Result<Vec<Account>, LedgerError>;

    /// Overwrite one account's balance.
    ///
    /// Single-row atomic write; non-negativity is the caller's duty.
    async fn update_balance(
        &self,
        number: &AccountNumber,
        new_balance: Decimal,
    ) -> Result<(), LedgerError>;

    /// Atomically increment a balance and return the updated account.
    ///
    /// `amount` must already be validated strictly positive.
    async fn deposit(
        &self,
        number: &AccountNumber,
        amount: Decimal,
    ) -> Result<Account, LedgerError>;

    // === Ledger ===

    async fn insert_transaction(&self, new: NewTransaction) -> Result<Transaction, LedgerError>;

    async fn transaction_by_id(&self, id: i64) -> Result<Option<Transaction>, LedgerError>;

    /// Idempotency lookup: a prior entry this owner created with this key.
    async fn transaction_by_cid(
        &self,
        owner_id: i64,
        cid: &str,
    ) -> Result<Option<Transaction>, LedgerError>;

    async fn transaction_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Transaction>, LedgerError>;

    /// Entries initiated by this owner, newest first.
    async fn transactions_by_owner(&self, owner_id: i64) -> Result<Vec<Transaction>, LedgerError>;

    /// Compare-and-set status change.
    ///
    /// Returns `true` iff the entry was in `from` and is now in `to`. The
    /// store never moves a terminal entry, whatever `from` claims.
    async fn update_status_if(
        &self,
        id: i64,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<bool, LedgerError>;

    // === Atomic transfer commits ===

    /// Debit `from`, credit `to`, append the completed entry — one unit.
    ///
    /// Re-verifies sufficient funds inside the critical section and fails
    /// with `InsufficientFunds` (no partial state) if the engine's pre-check
    /// has gone stale.
    async fn commit_internal_transfer(
        &self,
        from: &AccountNumber,
        to: &AccountNumber,
        amount: Decimal,
        entry: NewTransaction,
    ) -> Result<Transaction, LedgerError>;

    /// Hold funds for an external transfer: debit `from` and append the
    /// pending entry — one unit. Same in-section funds re-verification.
    async fn commit_external_hold(
        &self,
        from: &AccountNumber,
        amount: Decimal,
        entry: NewTransaction,
    ) -> Result<Transaction, LedgerError>;

    /// Reverse a held external transfer: CAS the entry from `expected` to
    /// `Failed` and credit the held amount back — one unit.
    ///
    /// Returns `false` (and changes nothing) when the CAS loses, so a
    /// concurrent settlement and reversal cannot both apply.
    async fn commit_external_reversal(
        &self,
        id: i64,
        expected: TransactionStatus,
        account: &AccountNumber,
        amount: Decimal,
    ) -> Result<bool, LedgerError>;
}
