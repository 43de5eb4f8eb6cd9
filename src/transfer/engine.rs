//! Transfer Engine
//!
//! Orchestrates every balance mutation: validation, ownership, currency
//! policy, per-account serialization, the atomic store commit, and the
//! external-transfer lifecycle (`pending -> inProgress -> completed |
//! failed`).
//!
//! Locking discipline: the engine holds the [`AccountLocks`] mutex of every
//! account it touches across the whole read-check-commit sequence; the store
//! commit underneath is additionally atomic on its own, so a crash between
//! check and commit leaves no partial state.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::locks::AccountLocks;
use super::settlement::{SettlementChannel, SettlementOutcome};
use crate::account::AccountNumber;
use crate::audit::{AuditEvent, AuditSink};
use crate::currency::{self, Currency};
use crate::error::LedgerError;
use crate::ledger::{NewTransaction, Transaction, TransactionStatus, TransactionType};
use crate::money;
use crate::principal::Principal;
use crate::store::Store;

/// Transfer Engine
pub struct TransferEngine {
    store: Arc<dyn Store>,
    settlement: Arc<dyn SettlementChannel>,
    audit: Arc<dyn AuditSink>,
    locks: AccountLocks,
    bank_prefix: String,
}

impl TransferEngine {
    pub fn new(
        store: Arc<dyn Store>,
        settlement: Arc<dyn SettlementChannel>,
        audit: Arc<dyn AuditSink>,
        bank_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            settlement,
            audit,
            locks: AccountLocks::new(),
            bank_prefix: bank_prefix.into(),
        }
    }

    /// Move funds between two accounts held at this bank.
    ///
    /// Single-shot: the entry is appended already `completed`, in the same
    /// atomic unit as both balance mutations. Both accounts must belong to
    /// the requester. With a `cid`, resubmission returns the original entry
    /// without touching balances again.
    pub async fn transfer_internal(
        &self,
        principal: Principal,
        from: &AccountNumber,
        to: &AccountNumber,
        amount: Decimal,
        cid: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        money::require_positive(amount)?;
        if from == to {
            return Err(LedgerError::SameAccount);
        }

        if let Some(existing) = self.replayed(principal, cid.as_deref()).await? {
            return Ok(existing);
        }

        let _guards = self.locks.acquire_pair(from, to).await;

        // Re-check under the lock: two racing submissions with the same cid
        // must produce exactly one entry.
        if let Some(existing) = self.replayed(principal, cid.as_deref()).await? {
            return Ok(existing);
        }

        let sender = self
            .store
            .account_by_number(from)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;
        if sender.owner_id != principal.user_id {
            // Generic denial; existence of foreign accounts is not disclosed
            return Err(LedgerError::NotOwner);
        }

        let receiver = self
            .store
            .account_by_number(to)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;
        if receiver.owner_id != principal.user_id {
            return Err(LedgerError::NotOwner);
        }

        currency::require_match(sender.currency, receiver.currency)?;

        if sender.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }

        let entry = NewTransaction {
            from_account: from.clone(),
            to_account: to.as_str().to_string(),
            amount,
            currency: sender.currency,
            status: TransactionStatus::Completed,
            owner_id: principal.user_id,
            transaction_type: TransactionType::Internal,
            external_id: None,
            cid,
        };
        let committed = self
            .store
            .commit_internal_transfer(from, to, amount, entry)
            .await?;

        info!(
            transaction_id = committed.id,
            from = %from,
            to = %to,
            amount = %amount,
            currency = %committed.currency,
            "internal transfer completed"
        );
        self.emit_audit(
            AuditEvent::new(
                principal.user_id,
                "transfer_internal",
                "transactions",
                committed.id.to_string(),
            )
            .with_new_value(serde_json::json!({
                "from": from.as_str(),
                "to": to.as_str(),
                "amount": amount.to_string(),
            })),
        );

        Ok(committed)
    }

    /// Queue a transfer to an account at another institution.
    ///
    /// Funds are held (debited) atomically with the `pending` entry, then the
    /// entry moves to `inProgress` once the settlement channel accepts the
    /// hand-off. A failed hand-off reverses the hold immediately.
    pub async fn transfer_external(
        &self,
        principal: Principal,
        from: &AccountNumber,
        to_external: &str,
        amount: Decimal,
        currency: Currency,
        cid: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        money::require_positive(amount)?;

        let to_external = to_external.trim();
        if to_external.is_empty() {
            return Err(LedgerError::MissingField("toAccount"));
        }
        if is_local_number(to_external, &self.bank_prefix) {
            return Err(LedgerError::DestinationNotExternal);
        }

        if let Some(existing) = self.replayed(principal, cid.as_deref()).await? {
            return Ok(existing);
        }

        let _guard = self.locks.acquire(from).await;

        if let Some(existing) = self.replayed(principal, cid.as_deref()).await? {
            return Ok(existing);
        }

        let sender = self
            .store
            .account_by_number(from)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;
        if sender.owner_id != principal.user_id {
            return Err(LedgerError::NotOwner);
        }

        if sender.currency != currency {
            return Err(LedgerError::CurrencyMismatch {
                from: sender.currency,
                to: currency,
            });
        }

        if sender.balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }

        let external_id = Uuid::new_v4().to_string();
        let entry = NewTransaction {
            from_account: from.clone(),
            to_account: to_external.to_string(),
            amount,
            currency,
            status: TransactionStatus::Pending,
            owner_id: principal.user_id,
            transaction_type: TransactionType::External,
            external_id: Some(external_id.clone()),
            cid,
        };
        let held = self.store.commit_external_hold(from, amount, entry).await?;
        info!(
            transaction_id = held.id,
            external_id = %external_id,
            from = %from,
            amount = %amount,
            "external transfer pending, funds held"
        );

        match self.settlement.submit(&held).await {
            Ok(()) => {
                let moved = self
                    .store
                    .update_status_if(held.id, TransactionStatus::Pending, TransactionStatus::InProgress)
                    .await?;
                if !moved {
                    // Settlement already reported back before we got here
                    debug!(transaction_id = held.id, "hand-off raced a settlement report");
                }

                self.emit_audit(
                    AuditEvent::new(
                        principal.user_id,
                        "transfer_external",
                        "transactions",
                        held.id.to_string(),
                    )
                    .with_new_value(serde_json::json!({
                        "from": from.as_str(),
                        "to": to_external,
                        "amount": amount.to_string(),
                        "externalId": external_id,
                    })),
                );

                Ok(self
                    .store
                    .transaction_by_id(held.id)
                    .await?
                    .unwrap_or(held))
            }
            Err(e) => {
                warn!(
                    transaction_id = held.id,
                    error = %e,
                    "settlement hand-off failed, reversing hold"
                );
                match self
                    .store
                    .commit_external_reversal(held.id, TransactionStatus::Pending, from, amount)
                    .await
                {
                    Ok(true) => Err(LedgerError::Settlement(e.to_string())),
                    Ok(false) => {
                        // Someone else advanced the entry; its lifecycle owns
                        // the funds now.
                        warn!(transaction_id = held.id, "reversal lost status race");
                        Err(LedgerError::Settlement(e.to_string()))
                    }
                    Err(rollback_err) => {
                        error!(
                            consistency_alarm = true,
                            transaction_id = held.id,
                            error = %rollback_err,
                            "reversal of held funds failed, operator intervention required"
                        );
                        Err(LedgerError::Storage(rollback_err.to_string()))
                    }
                }
            }
        }
    }

    /// Apply the settlement channel's final word on an external transfer.
    ///
    /// Idempotent: a terminal entry is returned unchanged, so duplicate
    /// confirmations cannot double-refund.
    pub async fn settle_external(
        &self,
        external_id: &str,
        outcome: SettlementOutcome,
    ) -> Result<Transaction, LedgerError> {
        let entry = self
            .store
            .transaction_by_external_id(external_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound)?;

        if entry.status.is_terminal() {
            return Ok(entry);
        }

        let _guard = self.locks.acquire(&entry.from_account).await;

        match outcome {
            SettlementOutcome::Confirmed => {
                // `Pending` is reachable when confirmation overtakes the
                // in-progress mark.
                for from in [TransactionStatus::InProgress, TransactionStatus::Pending] {
                    if self
                        .store
                        .update_status_if(entry.id, from, TransactionStatus::Completed)
                        .await?
                    {
                        info!(
                            transaction_id = entry.id,
                            external_id = %external_id,
                            "external transfer settled"
                        );
                        break;
                    }
                }
            }
            SettlementOutcome::Rejected => {
                let mut reversed = false;
                for from in [TransactionStatus::InProgress, TransactionStatus::Pending] {
                    match self
                        .store
                        .commit_external_reversal(entry.id, from, &entry.from_account, entry.amount)
                        .await
                    {
                        Ok(true) => {
                            reversed = true;
                            break;
                        }
                        Ok(false) => continue,
                        Err(e) => {
                            error!(
                                consistency_alarm = true,
                                transaction_id = entry.id,
                                error = %e,
                                "refund of rejected external transfer failed, operator intervention required"
                            );
                            return Err(LedgerError::Storage(e.to_string()));
                        }
                    }
                }
                if reversed {
                    info!(
                        transaction_id = entry.id,
                        external_id = %external_id,
                        amount = %entry.amount,
                        "external transfer rejected, funds credited back"
                    );
                    self.emit_audit(
                        AuditEvent::new(
                            entry.owner_id,
                            "external_refund",
                            "transactions",
                            entry.id.to_string(),
                        )
                        .with_old_value(serde_json::json!({"status": entry.status}))
                        .with_new_value(serde_json::json!({"status": TransactionStatus::Failed})),
                    );
                }
            }
        }

        self.store
            .transaction_by_id(entry.id)
            .await?
            .ok_or(LedgerError::TransactionNotFound)
    }

    /// Transfers initiated by the requester, newest first
    pub async fn list_transactions(
        &self,
        principal: Principal,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.store.transactions_by_owner(principal.user_id).await
    }

    /// One ledger entry. Non-owners (unless `is_admin`) learn nothing beyond
    /// "not found".
    pub async fn get_transaction(
        &self,
        principal: Principal,
        id: i64,
        is_admin: bool,
    ) -> Result<Transaction, LedgerError> {
        let entry = self
            .store
            .transaction_by_id(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound)?;
        if !is_admin && entry.owner_id != principal.user_id {
            return Err(LedgerError::TransactionNotFound);
        }
        Ok(entry)
    }

    async fn replayed(
        &self,
        principal: Principal,
        cid: Option<&str>,
    ) -> Result<Option<Transaction>, LedgerError> {
        let Some(cid) = cid else { return Ok(None) };
        let existing = self
            .store
            .transaction_by_cid(principal.user_id, cid)
            .await?;
        if let Some(ref tx) = existing {
            debug!(cid = %cid, transaction_id = tx.id, "duplicate cid, replaying original entry");
        }
        Ok(existing)
    }

    fn emit_audit(&self, event: AuditEvent) {
        let sink = Arc::clone(&self.audit);
        tokio::spawn(async move {
            sink.record(event).await;
        });
    }
}

fn is_local_number(raw: &str, bank_prefix: &str) -> bool {
    raw.strip_prefix(bank_prefix)
        .is_some_and(|rest| rest.starts_with('-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::TracingAuditSink;
    use crate::store::MemStore;
    use crate::transfer::settlement::MockSettlementChannel;

    const OWNER: Principal = Principal { user_id: 1 };
    const STRANGER: Principal = Principal { user_id: 2 };

    struct Fixture {
        engine: TransferEngine,
        store: Arc<MemStore>,
        channel: Arc<MockSettlementChannel>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemStore::new());
        let channel = Arc::new(MockSettlementChannel::new());
        let engine = TransferEngine::new(
            store.clone(),
            channel.clone(),
            Arc::new(TracingAuditSink),
            "BANK",
        );
        Fixture {
            engine,
            store,
            channel,
        }
    }

    async fn funded_account(
        fx: &Fixture,
        owner: Principal,
        number: &str,
        currency: Currency,
        balance: i64,
    ) -> AccountNumber {
        let n = AccountNumber::new(number).unwrap();
        fx.store
            .create_account(owner.user_id, currency, &n)
            .await
            .unwrap();
        if balance > 0 {
            fx.store.deposit(&n, Decimal::from(balance)).await.unwrap();
        }
        n
    }

    async fn balance_of(fx: &Fixture, n: &AccountNumber) -> Decimal {
        fx.store
            .account_by_number(n)
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    #[tokio::test]
    async fn test_internal_transfer_moves_funds() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400001", Currency::Usd, 100).await;
        let b = funded_account(&fx, OWNER, "BANK-400002", Currency::Usd, 0).await;

        let tx = fx
            .engine
            .transfer_internal(OWNER, &a, &b, Decimal::from(40), None)
            .await
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.transaction_type, TransactionType::Internal);
        assert_eq!(tx.currency, Currency::Usd);
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(60));
        assert_eq!(balance_of(&fx, &b).await, Decimal::from(40));
    }

    #[tokio::test]
    async fn test_internal_transfer_entire_balance() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400003", Currency::Usd, 55).await;
        let b = funded_account(&fx, OWNER, "BANK-400004", Currency::Usd, 0).await;

        fx.engine
            .transfer_internal(OWNER, &a, &b, Decimal::from(55), None)
            .await
            .unwrap();
        assert_eq!(balance_of(&fx, &a).await, Decimal::ZERO);
        assert_eq!(balance_of(&fx, &b).await, Decimal::from(55));
    }

    #[tokio::test]
    async fn test_internal_rejects_self_transfer() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400005", Currency::Usd, 100).await;

        let err = fx
            .engine
            .transfer_internal(OWNER, &a, &a, Decimal::ONE, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::SameAccount));
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_internal_rejects_non_positive_amount() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400006", Currency::Usd, 100).await;
        let b = funded_account(&fx, OWNER, "BANK-400007", Currency::Usd, 0).await;

        for bad in [Decimal::ZERO, Decimal::from(-5)] {
            let err = fx
                .engine
                .transfer_internal(OWNER, &a, &b, bad, None)
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount));
        }
    }

    #[tokio::test]
    async fn test_internal_insufficient_funds_leaves_no_entry() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400008", Currency::Usd, 10).await;
        let b = funded_account(&fx, OWNER, "BANK-400009", Currency::Usd, 0).await;

        let err = fx
            .engine
            .transfer_internal(OWNER, &a, &b, Decimal::from(50), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds));
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(10));
        assert!(fx.engine.list_transactions(OWNER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_internal_currency_mismatch() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400010", Currency::Usd, 100).await;
        let b = funded_account(&fx, OWNER, "BANK-400011", Currency::Eur, 0).await;

        let err = fx
            .engine
            .transfer_internal(OWNER, &a, &b, Decimal::from(5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CurrencyMismatch { .. }));
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(100));
        assert!(fx.engine.list_transactions(OWNER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_internal_requires_ownership_of_both_accounts() {
        let fx = fixture();
        let theirs = funded_account(&fx, STRANGER, "BANK-400012", Currency::Usd, 100).await;
        let mine = funded_account(&fx, OWNER, "BANK-400013", Currency::Usd, 100).await;

        // Foreign source
        let err = fx
            .engine
            .transfer_internal(OWNER, &theirs, &mine, Decimal::from(5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotOwner));

        // Foreign destination
        let err = fx
            .engine
            .transfer_internal(OWNER, &mine, &theirs, Decimal::from(5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotOwner));

        assert_eq!(balance_of(&fx, &theirs).await, Decimal::from(100));
        assert_eq!(balance_of(&fx, &mine).await, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_internal_missing_accounts() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400014", Currency::Usd, 100).await;
        let ghost = AccountNumber::new("BANK-999999").unwrap();

        let err = fx
            .engine
            .transfer_internal(OWNER, &ghost, &a, Decimal::ONE, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));

        let err = fx
            .engine
            .transfer_internal(OWNER, &a, &ghost, Decimal::ONE, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));
    }

    #[tokio::test]
    async fn test_internal_idempotent_under_cid_retry() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400015", Currency::Usd, 100).await;
        let b = funded_account(&fx, OWNER, "BANK-400016", Currency::Usd, 0).await;

        let first = fx
            .engine
            .transfer_internal(OWNER, &a, &b, Decimal::from(30), Some("req-1".into()))
            .await
            .unwrap();
        let replay = fx
            .engine
            .transfer_internal(OWNER, &a, &b, Decimal::from(30), Some("req-1".into()))
            .await
            .unwrap();

        assert_eq!(first.id, replay.id);
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(70));
        assert_eq!(fx.engine.list_transactions(OWNER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_external_lifecycle_to_completed() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400017", Currency::Eur, 100).await;

        let tx = fx
            .engine
            .transfer_external(OWNER, &a, "NORD-700001", Decimal::from(20), Currency::Eur, None)
            .await
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::InProgress);
        assert_eq!(tx.transaction_type, TransactionType::External);
        let external_id = tx.external_id.clone().unwrap();
        assert_eq!(fx.channel.submitted(), vec![external_id.clone()]);
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(80));

        let settled = fx
            .engine
            .settle_external(&external_id, SettlementOutcome::Confirmed)
            .await
            .unwrap();
        assert_eq!(settled.status, TransactionStatus::Completed);
        // Funds stay debited
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(80));
    }

    #[tokio::test]
    async fn test_external_rejection_refunds() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400018", Currency::Eur, 100).await;

        let tx = fx
            .engine
            .transfer_external(OWNER, &a, "NORD-700002", Decimal::from(20), Currency::Eur, None)
            .await
            .unwrap();
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(80));

        let external_id = tx.external_id.clone().unwrap();
        let failed = fx
            .engine
            .settle_external(&external_id, SettlementOutcome::Rejected)
            .await
            .unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(100));

        // Duplicate rejection must not refund twice
        let again = fx
            .engine
            .settle_external(&external_id, SettlementOutcome::Rejected)
            .await
            .unwrap();
        assert_eq!(again.status, TransactionStatus::Failed);
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_external_rejects_local_destination() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400019", Currency::Eur, 100).await;

        let err = fx
            .engine
            .transfer_external(OWNER, &a, "BANK-400020", Decimal::from(5), Currency::Eur, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DestinationNotExternal));

        // A different bank whose prefix merely starts with ours is fine
        assert!(
            fx.engine
                .transfer_external(OWNER, &a, "BANKX-1", Decimal::from(5), Currency::Eur, None)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_external_currency_must_match_account() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400021", Currency::Eur, 100).await;

        let err = fx
            .engine
            .transfer_external(OWNER, &a, "NORD-700003", Decimal::from(5), Currency::Usd, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::CurrencyMismatch { .. }));
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(100));
    }

    #[tokio::test]
    async fn test_external_handoff_failure_reverses_hold() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400022", Currency::Gbp, 50).await;
        fx.channel.set_unavailable(true);

        let err = fx
            .engine
            .transfer_external(OWNER, &a, "NORD-700004", Decimal::from(10), Currency::Gbp, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Settlement(_)));
        assert_eq!(balance_of(&fx, &a).await, Decimal::from(50));

        // The failed attempt stays on the books as a failed entry
        let history = fx.engine.list_transactions(OWNER).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn test_settle_unknown_external_id() {
        let fx = fixture();
        let err = fx
            .engine
            .settle_external("no-such-id", SettlementOutcome::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::TransactionNotFound));
    }

    #[tokio::test]
    async fn test_get_transaction_hides_foreign_entries() {
        let fx = fixture();
        let a = funded_account(&fx, OWNER, "BANK-400023", Currency::Usd, 100).await;
        let b = funded_account(&fx, OWNER, "BANK-400024", Currency::Usd, 0).await;
        let tx = fx
            .engine
            .transfer_internal(OWNER, &a, &b, Decimal::ONE, None)
            .await
            .unwrap();

        assert!(fx.engine.get_transaction(OWNER, tx.id, false).await.is_ok());
        let err = fx
            .engine
            .get_transaction(STRANGER, tx.id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::TransactionNotFound));
        // Admin sees everything
        assert!(fx.engine.get_transaction(STRANGER, tx.id, true).await.is_ok());
    }
}
