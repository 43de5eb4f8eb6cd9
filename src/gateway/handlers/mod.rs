//! Gateway HTTP handlers

pub mod accounts;
pub mod health;
pub mod transfers;

pub use accounts::{DepositRequest, OpenAccountRequest};
pub use health::HealthResponse;
pub use transfers::{ExternalTransferRequest, InternalTransferRequest, SettlementReport};
