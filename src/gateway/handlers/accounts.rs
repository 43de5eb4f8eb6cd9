//! Account handlers (open, list, deposit, admin listing)

use std::str::FromStr;

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};
use crate::account::{Account, AccountNumber};
use crate::currency::Currency;
use crate::money;
use crate::principal::Principal;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OpenAccountRequest {
    /// Account currency code (EUR, USD or GBP)
    #[serde(default)]
    #[validate(length(min = 1, message = "currency field is required"))]
    #[schema(example = "EUR")]
    pub currency: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "accountNumber field is required"))]
    #[schema(example = "BANK-482951")]
    pub account_number: String,
    /// Amount as a decimal string, two fractional digits at most
    #[serde(default)]
    #[validate(length(min = 1, message = "amount field is required"))]
    #[schema(example = "100.00")]
    pub amount: String,
}

/// Open a new account
///
/// POST /api/v1/accounts
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = OpenAccountRequest,
    responses(
        (status = 200, description = "Account opened"),
        (status = 400, description = "Unsupported currency"),
        (status = 401, description = "Missing principal")
    ),
    tag = "Accounts"
)]
pub async fn open_account(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<OpenAccountRequest>,
) -> ApiResult<Account> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let currency = Currency::from_str(&req.currency)?;
    let account = state.accounts.open_account(principal, currency).await?;
    ok(account)
}

/// List the requester's accounts
///
/// GET /api/v1/accounts
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    responses(
        (status = 200, description = "Accounts of the authenticated user"),
        (status = 401, description = "Missing principal")
    ),
    tag = "Accounts"
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<Account>> {
    let accounts = state.accounts.list_accounts(principal).await?;
    ok(accounts)
}

/// Deposit funds into an own account
///
/// POST /api/v1/accounts/deposit
#[utoipa::path(
    post,
    path = "/api/v1/accounts/deposit",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Updated account"),
        (status = 400, description = "Invalid amount"),
        (status = 403, description = "Account owned by someone else"),
        (status = 404, description = "Account not found")
    ),
    tag = "Accounts"
)]
pub async fn deposit(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<DepositRequest>,
) -> ApiResult<Account> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let number = AccountNumber::new(&req.account_number)?;
    let amount = money::parse_amount(&req.amount)?;
    let account = state.accounts.deposit(principal, &number, amount).await?;
    ok(account)
}

/// List every account at the bank (admin only)
///
/// GET /api/v1/admin/accounts
#[utoipa::path(
    get,
    path = "/api/v1/admin/accounts",
    responses(
        (status = 200, description = "All accounts"),
        (status = 403, description = "Admin role required")
    ),
    tag = "Admin"
)]
pub async fn list_all_accounts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<Account>> {
    if !state.roles.has_role(principal.user_id, "admin").await {
        return ApiError::forbidden("Access denied. Admin role required.").into_err();
    }
    let accounts = state.accounts.all_accounts().await?;
    ok(accounts)
}
