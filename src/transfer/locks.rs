//! Per-Account Serialization
//!
//! Two transfers touching the same account must not interleave their
//! read-check-commit sequences: both could pass the funds check against the
//! same stale balance. Every engine operation that mutates balances takes
//! the async mutex of each account it touches, pairs always in ascending
//! account-number order so opposite-direction transfers cannot deadlock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::account::AccountNumber;

/// Lock table keyed by account number
///
/// Entries are created on first touch and kept for the process lifetime;
/// the set of accounts a single node serves keeps this bounded.
#[derive(Default)]
pub struct AccountLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.get(key) {
            return existing.clone();
        }
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock one account
    pub async fn acquire(&self, number: &AccountNumber) -> OwnedMutexGuard<()> {
        self.handle(number.as_str()).lock_owned().await
    }

    /// Lock two distinct accounts in canonical (ascending) order
    pub async fn acquire_pair(
        &self,
        a: &AccountNumber,
        b: &AccountNumber,
    ) -> (OwnedMutexGuard<()>, OwnedMutexGuard<()>) {
        debug_assert_ne!(a, b, "same-account transfers are rejected before locking");

        let (first, second) = if a.as_str() <= b.as_str() {
            (a, b)
        } else {
            (b, a)
        };
        let first_guard = self.handle(first.as_str()).lock_owned().await;
        let second_guard = self.handle(second.as_str()).lock_owned().await;
        (first_guard, second_guard)
    }
}
