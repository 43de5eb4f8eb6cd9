//! In-memory store
//!
//! All maps live behind a single mutex, so every trait method — including
//! the multi-row `commit_*` operations — is one atomic section. Used by the
//! test suite and by `--mem` dev mode; no durability.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::Store;
use crate::account::{Account, AccountNumber};
use crate::currency::Currency;
use crate::error::LedgerError;
use crate::ledger::{NewTransaction, Transaction, TransactionStatus};

#[derive(Default)]
struct Inner {
    /// Keyed by account number
    accounts: HashMap<String, Account>,
    /// Keyed by id; BTreeMap keeps insertion order for history listings
    transactions: BTreeMap<i64, Transaction>,
    next_account_id: i64,
    next_transaction_id: i64,
}

impl Inner {
    fn append_transaction(&mut self, new: NewTransaction) -> Transaction {
        self.next_transaction_id += 1;
        let tx = Transaction {
            id: self.next_transaction_id,
            from_account: new.from_account,
            to_account: new.to_account,
            amount: new.amount,
            currency: new.currency,
            status: new.status,
            owner_id: new.owner_id,
            transaction_type: new.transaction_type,
            external_id: new.external_id,
            cid: new.cid,
            created_at: Utc::now(),
        };
        self.transactions.insert(tx.id, tx.clone());
        tx
    }

    fn debit_checked(
        &mut self,
        number: &AccountNumber,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let account = self
            .accounts
            .get_mut(number.as_str())
            .ok_or(LedgerError::AccountNotFound)?;
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        account.balance -= amount;
        Ok(())
    }
}

/// In-process implementation of [`Store`]
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_account(
        &self,
        owner_id: i64,
        currency: Currency,
        number: &AccountNumber,
    ) -> Result<Account, LedgerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.accounts.contains_key(number.as_str()) {
            return Err(LedgerError::AccountNumberConflict(number.to_string()));
        }
        inner.next_account_id += 1;
        let account = Account {
            id: inner.next_account_id,
            owner_id,
            account_number: number.clone(),
            currency,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        };
        inner
            .accounts
            .insert(number.as_str().to_string(), account.clone());
        Ok(account)
    }

    async fn accounts_by_owner(&self, owner_id: i64) -> Result<Vec<Account>, LedgerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .accounts
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, LedgerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.accounts.get(number.as_str()).cloned())
    }

    async fn all_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.accounts.values().cloned().collect())
    }

    async fn update_balance(
        &self,
        number: &AccountNumber,
        new_balance: Decimal,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let account = inner
            .accounts
            .get_mut(number.as_str())
            .ok_or(LedgerError::AccountNotFound)?;
        account.balance = new_balance;
        Ok(())
    }

    async fn deposit(
        &self,
        number: &AccountNumber,
        amount: Decimal,
    ) -> Result<Account, LedgerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let account = inner
            .accounts
            .get_mut(number.as_str())
            .ok_or(LedgerError::AccountNotFound)?;
        account.balance += amount;
        Ok(account.clone())
    }

    async fn insert_transaction(&self, new: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.append_transaction(new))
    }

    async fn transaction_by_id(&self, id: i64) -> Result<Option<Transaction>, LedgerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.transactions.get(&id).cloned())
    }

    async fn transaction_by_cid(
        &self,
        owner_id: i64,
        cid: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .transactions
            .values()
            .find(|t| t.owner_id == owner_id && t.cid.as_deref() == Some(cid))
            .cloned())
    }

    async fn transaction_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .transactions
            .values()
            .find(|t| t.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn transactions_by_owner(&self, owner_id: i64) -> Result<Vec<Transaction>, LedgerError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut out: Vec<Transaction> = inner
            .transactions
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        out.reverse(); // newest first
        Ok(out)
    }

    async fn update_status_if(
        &self,
        id: i64,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<bool, LedgerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let tx = inner
            .transactions
            .get_mut(&id)
            .ok_or(LedgerError::TransactionNotFound)?;
        if tx.status != from || !from.can_transition(to) {
            return Ok(false);
        }
        tx.status = to;
        Ok(true)
    }

    async fn commit_internal_transfer(
        &self,
        from: &AccountNumber,
        to: &AccountNumber,
        amount: Decimal,
        entry: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");

        if !inner.accounts.contains_key(to.as_str()) {
            return Err(LedgerError::AccountNotFound);
        }
        inner.debit_checked(from, amount)?;
        let receiver = inner
            .accounts
            .get_mut(to.as_str())
            .expect("receiver checked above");
        receiver.balance += amount;

        Ok(inner.append_transaction(entry))
    }

    async fn commit_external_hold(
        &self,
        from: &AccountNumber,
        amount: Decimal,
        entry: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.debit_checked(from, amount)?;
        Ok(inner.append_transaction(entry))
    }

    async fn commit_external_reversal(
        &self,
        id: i64,
        expected: TransactionStatus,
        account: &AccountNumber,
        amount: Decimal,
    ) -> Result<bool, LedgerError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");

        // Verify both rows before mutating either, this is one atomic unit
        if !inner.accounts.contains_key(account.as_str()) {
            return Err(LedgerError::AccountNotFound);
        }
        let tx = inner
            .transactions
            .get_mut(&id)
            .ok_or(LedgerError::TransactionNotFound)?;
        if tx.status != expected || !expected.can_transition(TransactionStatus::Failed) {
            return Ok(false);
        }
        tx.status = TransactionStatus::Failed;

        let acct = inner
            .accounts
            .get_mut(account.as_str())
            .expect("account checked above");
        acct.balance += amount;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionType;

    fn number(raw: &str) -> AccountNumber {
        AccountNumber::new(raw).unwrap()
    }

    fn entry(from: &AccountNumber, to: &str, amount: Decimal) -> NewTransaction {
        NewTransaction {
            from_account: from.clone(),
            to_account: to.to_string(),
            amount,
            currency: Currency::Usd,
            status: TransactionStatus::Completed,
            owner_id: 1,
            transaction_type: TransactionType::Internal,
            external_id: None,
            cid: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_conflict() {
        let store = MemStore::new();
        let n = number("BANK-100001");
        let account = store.create_account(1, Currency::Usd, &n).await.unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.owner_id, 1);

        let err = store.create_account(2, Currency::Usd, &n).await.unwrap_err();
        assert!(matches!(err, LedgerError::AccountNumberConflict(_)));
    }

    #[tokio::test]
    async fn test_update_balance_overwrites() {
        let store = MemStore::new();
        let n = number("BANK-100009");
        store.create_account(1, Currency::Usd, &n).await.unwrap();

        store.update_balance(&n, Decimal::from(77)).await.unwrap();
        assert_eq!(
            store.account_by_number(&n).await.unwrap().unwrap().balance,
            Decimal::from(77)
        );

        let ghost = number("BANK-999990");
        let err = store.update_balance(&ghost, Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));
    }

    #[tokio::test]
    async fn test_deposit_accumulates() {
        let store = MemStore::new();
        let n = number("BANK-100002");
        store.create_account(1, Currency::Eur, &n).await.unwrap();

        let account = store.deposit(&n, Decimal::from(30)).await.unwrap();
        assert_eq!(account.balance, Decimal::from(30));
        let account = store.deposit(&n, Decimal::from(12)).await.unwrap();
        assert_eq!(account.balance, Decimal::from(42));
    }

    #[tokio::test]
    async fn test_commit_internal_moves_funds_and_appends() {
        let store = MemStore::new();
        let a = number("BANK-100003");
        let b = number("BANK-100004");
        store.create_account(1, Currency::Usd, &a).await.unwrap();
        store.create_account(1, Currency::Usd, &b).await.unwrap();
        store.deposit(&a, Decimal::from(100)).await.unwrap();

        let tx = store
            .commit_internal_transfer(&a, &b, Decimal::from(40), entry(&a, b.as_str(), Decimal::from(40)))
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);

        let a_after = store.account_by_number(&a).await.unwrap().unwrap();
        let b_after = store.account_by_number(&b).await.unwrap().unwrap();
        assert_eq!(a_after.balance, Decimal::from(60));
        assert_eq!(b_after.balance, Decimal::from(40));
    }

    #[tokio::test]
    async fn test_commit_internal_insufficient_leaves_no_trace() {
        let store = MemStore::new();
        let a = number("BANK-100005");
        let b = number("BANK-100006");
        store.create_account(1, Currency::Usd, &a).await.unwrap();
        store.create_account(1, Currency::Usd, &b).await.unwrap();
        store.deposit(&a, Decimal::from(10)).await.unwrap();

        let err = store
            .commit_internal_transfer(&a, &b, Decimal::from(50), entry(&a, b.as_str(), Decimal::from(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds));

        assert_eq!(
            store.account_by_number(&a).await.unwrap().unwrap().balance,
            Decimal::from(10)
        );
        assert!(store.transactions_by_owner(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_cas_refuses_terminal() {
        let store = MemStore::new();
        let a = number("BANK-100007");
        store.create_account(1, Currency::Usd, &a).await.unwrap();
        let tx = store
            .insert_transaction(entry(&a, "OTHER-1", Decimal::ONE))
            .await
            .unwrap();

        // Completed is terminal; no CAS may move it
        let moved = store
            .update_status_if(tx.id, TransactionStatus::Completed, TransactionStatus::Failed)
            .await
            .unwrap();
        assert!(!moved);
    }

    #[tokio::test]
    async fn test_reversal_cas_applies_once() {
        let store = MemStore::new();
        let a = number("BANK-100008");
        store.create_account(1, Currency::Eur, &a).await.unwrap();
        store.deposit(&a, Decimal::from(100)).await.unwrap();

        let mut pending = entry(&a, "NORD-555555", Decimal::from(20));
        pending.status = TransactionStatus::Pending;
        let tx = store
            .commit_external_hold(&a, Decimal::from(20), pending)
            .await
            .unwrap();
        assert_eq!(
            store.account_by_number(&a).await.unwrap().unwrap().balance,
            Decimal::from(80)
        );

        let reversed = store
            .commit_external_reversal(tx.id, TransactionStatus::Pending, &a, Decimal::from(20))
            .await
            .unwrap();
        assert!(reversed);
        assert_eq!(
            store.account_by_number(&a).await.unwrap().unwrap().balance,
            Decimal::from(100)
        );

        // Second application loses the CAS and must not double-refund
        let reversed_again = store
            .commit_external_reversal(tx.id, TransactionStatus::Pending, &a, Decimal::from(20))
            .await
            .unwrap();
        assert!(!reversed_again);
        assert_eq!(
            store.account_by_number(&a).await.unwrap().unwrap().balance,
            Decimal::from(100)
        );
    }
}
