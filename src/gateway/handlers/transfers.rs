//! Transfer handlers (internal, external, history, settlement reports)

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};
use crate::account::AccountNumber;
use crate::currency::Currency;
use crate::ledger::Transaction;
use crate::money;
use crate::principal::Principal;
use crate::transfer::SettlementOutcome;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternalTransferRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "fromAccount field is required"))]
    #[schema(example = "BANK-482951")]
    pub from_account: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "toAccount field is required"))]
    #[schema(example = "BANK-910533")]
    pub to_account: String,
    /// Amount as a decimal string
    #[serde(default)]
    #[validate(length(min = 1, message = "amount field is required"))]
    #[schema(example = "40.00")]
    pub amount: String,
    /// Client idempotency key: resubmitting with the same key replays the
    /// original result instead of moving funds again
    pub cid: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTransferRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "fromAccount field is required"))]
    #[schema(example = "BANK-482951")]
    pub from_account: String,
    /// Destination account at another institution
    #[serde(default)]
    #[validate(length(min = 1, message = "toAccount field is required"))]
    #[schema(example = "NORD-18837022")]
    pub to_account: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "amount field is required"))]
    #[schema(example = "20.00")]
    pub amount: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "currency field is required"))]
    #[schema(example = "EUR")]
    pub currency: String,
    pub cid: Option<String>,
}

/// Settlement report from the external bank network
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    #[schema(example = "3d1f2a94-6f2c-4b7e-9a51-0c8d6f1e2a33")]
    pub external_id: String,
    #[schema(value_type = String, example = "confirmed")]
    pub outcome: SettlementOutcome,
}

/// Transfer between two accounts held at this bank
///
/// POST /api/v1/transfers/internal
#[utoipa::path(
    post,
    path = "/api/v1/transfers/internal",
    request_body = InternalTransferRequest,
    responses(
        (status = 200, description = "Completed ledger entry"),
        (status = 400, description = "Validation failure or insufficient funds"),
        (status = 403, description = "Account owned by someone else"),
        (status = 404, description = "Account not found")
    ),
    tag = "Transfers"
)]
pub async fn transfer_internal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<InternalTransferRequest>,
) -> ApiResult<Transaction> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let from = AccountNumber::new(&req.from_account)?;
    let to = AccountNumber::new(&req.to_account)?;
    let amount = money::parse_amount(&req.amount)?;

    let tx = state
        .engine
        .transfer_internal(principal, &from, &to, amount, req.cid)
        .await?;
    ok(tx)
}

/// Queue a transfer to an account at another bank
///
/// POST /api/v1/transfers/external
#[utoipa::path(
    post,
    path = "/api/v1/transfers/external",
    request_body = ExternalTransferRequest,
    responses(
        (status = 200, description = "Ledger entry with held funds, inProgress"),
        (status = 400, description = "Validation failure or insufficient funds"),
        (status = 403, description = "Account owned by someone else"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Settlement channel unavailable (hold reversed)")
    ),
    tag = "Transfers"
)]
pub async fn transfer_external(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ExternalTransferRequest>,
) -> ApiResult<Transaction> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let from = AccountNumber::new(&req.from_account)?;
    let currency = Currency::from_str(&req.currency)?;
    let amount = money::parse_amount(&req.amount)?;

    let tx = state
        .engine
        .transfer_external(principal, &from, &req.to_account, amount, currency, req.cid)
        .await?;
    ok(tx)
}

/// Transfer history of the requester, newest first
///
/// GET /api/v1/transfers
#[utoipa::path(
    get,
    path = "/api/v1/transfers",
    responses(
        (status = 200, description = "Ledger entries initiated by the user"),
        (status = 401, description = "Missing principal")
    ),
    tag = "Transfers"
)]
pub async fn list_transfers(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<Transaction>> {
    let history = state.engine.list_transactions(principal).await?;
    ok(history)
}

/// One ledger entry by id
///
/// GET /api/v1/transfers/{id}
#[utoipa::path(
    get,
    path = "/api/v1/transfers/{id}",
    params(("id" = i64, Path, description = "Ledger entry id")),
    responses(
        (status = 200, description = "Ledger entry"),
        (status = 404, description = "No such entry visible to this user")
    ),
    tag = "Transfers"
)]
pub async fn get_transfer(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<Transaction> {
    let is_admin = state.roles.has_role(principal.user_id, "admin").await;
    let tx = state.engine.get_transaction(principal, id, is_admin).await?;
    ok(tx)
}

/// Apply a settlement outcome, simulating the external bank network
///
/// POST /api/v1/mock/settlement
///
/// Only compiled with the `mock-api` feature; production builds receive
/// settlement reports over the real inter-bank channel instead.
#[cfg(feature = "mock-api")]
#[utoipa::path(
    post,
    path = "/api/v1/mock/settlement",
    request_body = SettlementReport,
    responses(
        (status = 200, description = "Entry after applying the outcome"),
        (status = 404, description = "Unknown external id")
    ),
    tag = "Mock"
)]
pub async fn mock_settlement(
    State(state): State<AppState>,
    Json(report): Json<SettlementReport>,
) -> ApiResult<Transaction> {
    let tx = state
        .engine
        .settle_external(&report.external_id, report.outcome)
        .await?;
    ok(tx)
}
