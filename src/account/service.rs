//! Account Service
//!
//! Open/list/deposit operations. Transfers live in the transfer engine; this
//! service only ever touches one account at a time.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::allocator::AccountNumberAllocator;
use super::models::{Account, AccountNumber};
use crate::audit::{AuditEvent, AuditSink};
use crate::currency::Currency;
use crate::error::LedgerError;
use crate::money;
use crate::principal::Principal;
use crate::store::Store;

/// Allocation attempts before a collision storm is treated as a storage fault
const MAX_ALLOCATION_ATTEMPTS: u32 = 5;

pub struct AccountService {
    store: Arc<dyn Store>,
    allocator: AccountNumberAllocator,
    audit: Arc<dyn AuditSink>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Store>,
        allocator: AccountNumberAllocator,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            allocator,
            audit,
        }
    }

    /// Open a new zero-balance account in the given currency.
    ///
    /// Account numbers are random, so the store's uniqueness constraint is
    /// the authority; collisions are re-derived and retried a bounded number
    /// of times.
    pub async fn open_account(
        &self,
        principal: Principal,
        currency: Currency,
    ) -> Result<Account, LedgerError> {
        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let number = self.allocator.generate();
            match self
                .store
                .create_account(principal.user_id, currency, &number)
                .await
            {
                Ok(account) => {
                    info!(
                        owner_id = principal.user_id,
                        account_number = %account.account_number,
                        currency = %currency,
                        "account opened"
                    );
                    self.emit_audit(
                        AuditEvent::new(
                            principal.user_id,
                            "open_account",
                            "accounts",
                            account.account_number.to_string(),
                        )
                        .with_new_value(serde_json::json!({"currency": currency})),
                    );
                    return Ok(account);
                }
                Err(LedgerError::AccountNumberConflict(taken)) => {
                    warn!(
                        attempt,
                        account_number = %taken,
                        "account number collision, re-deriving"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(LedgerError::Storage(format!(
            "account number allocation exhausted after {MAX_ALLOCATION_ATTEMPTS} attempts"
        )))
    }

    /// Accounts held by the requester
    pub async fn list_accounts(&self, principal: Principal) -> Result<Vec<Account>, LedgerError> {
        self.store.accounts_by_owner(principal.user_id).await
    }

    /// Every account at the bank (admin listing)
    pub async fn all_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store.all_accounts().await
    }

    /// Credit the requester's own account
    pub async fn deposit(
        &self,
        principal: Principal,
        number: &AccountNumber,
        amount: Decimal,
    ) -> Result<Account, LedgerError> {
        money::require_positive(amount)?;

        let account = self
            .store
            .account_by_number(number)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;
        if account.owner_id != principal.user_id {
            return Err(LedgerError::NotOwner);
        }

        let updated = self.store.deposit(number, amount).await?;
        info!(
            account_number = %number,
            amount = %amount,
            balance = %updated.balance,
            "deposit applied"
        );
        self.emit_audit(
            AuditEvent::new(
                principal.user_id,
                "deposit",
                "accounts",
                number.to_string(),
            )
            .with_old_value(serde_json::json!({"balance": account.balance.to_string()}))
            .with_new_value(serde_json::json!({"balance": updated.balance.to_string()})),
        );
        Ok(updated)
    }

    fn emit_audit(&self, event: AuditEvent) {
        let sink = Arc::clone(&self.audit);
        tokio::spawn(async move {
            sink.record(event).await;
        });
    }
}
