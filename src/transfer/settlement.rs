//! External Settlement Channel
//!
//! The wire to other banks is a collaborator: the core hands a pending
//! transfer over and later applies the confirmation or rejection the channel
//! delivers. Network delivery, retries and the counterparty protocol live
//! behind this trait.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::ledger::Transaction;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Settlement channel unavailable: {0}")]
    Unavailable(String),

    #[error("Hand-off rejected: {0}")]
    HandoffRejected(String),
}

/// Final word from the external bank on a handed-off transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementOutcome {
    Confirmed,
    Rejected,
}

/// Hand-off point to the external bank network
#[async_trait]
pub trait SettlementChannel: Send + Sync + Debug {
    /// Submit a pending external transfer for settlement.
    ///
    /// `Ok` means the channel accepted the hand-off, not that funds settled;
    /// the final outcome arrives later via `TransferEngine::settle_external`.
    async fn submit(&self, entry: &Transaction) -> Result<(), SettlementError>;
}

/// Mock channel that records hand-offs, for tests and dev mode
#[derive(Debug, Default)]
pub struct MockSettlementChannel {
    unavailable: AtomicBool,
    submitted: Mutex<Vec<String>>,
}

impl MockSettlementChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `submit` fail with `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// External ids handed off so far
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().expect("mock mutex poisoned").clone()
    }
}

#[async_trait]
impl SettlementChannel for MockSettlementChannel {
    async fn submit(&self, entry: &Transaction) -> Result<(), SettlementError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SettlementError::Unavailable("mock channel down".into()));
        }
        let external_id = entry
            .external_id
            .clone()
            .ok_or_else(|| SettlementError::HandoffRejected("missing external id".into()))?;
        self.submitted
            .lock()
            .expect("mock mutex poisoned")
            .push(external_id);
        Ok(())
    }
}
