//! Transfer Engine
//!
//! Moves funds between accounts under strict consistency guarantees.
//!
//! # State Machines
//!
//! ```text
//! internal:  (validate) ──────────────────────────────▶ completed
//!
//! external:  pending ──▶ inProgress ──▶ completed
//!               │             │
//!               └─────────────┴──▶ failed  (hold credited back)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Per-account serialization**: every operation holds the lock of each
//!    account it touches across read-check-commit, pairs in ascending order
//! 2. **Atomic commit**: debit + credit + ledger insert are one store unit
//! 3. **Idempotency**: client `cid` replays return the original entry;
//!    settlement reports never apply to a terminal entry
//! 4. **Money conservation**: a failed path either commits nothing or
//!    compensates the hold in the same unit that marks the entry failed

pub mod engine;
pub mod locks;
pub mod settlement;

// Re-exports for convenience
pub use engine::TransferEngine;
pub use locks::AccountLocks;
pub use settlement::{
    MockSettlementChannel, SettlementChannel, SettlementError, SettlementOutcome,
};
