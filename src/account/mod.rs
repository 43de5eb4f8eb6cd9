//! Account management module
//!
//! Account model, bank-prefixed number allocation, and the open/list/deposit
//! operations.

pub mod allocator;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use allocator::AccountNumberAllocator;
pub use models::{Account, AccountNumber};
pub use service::AccountService;
