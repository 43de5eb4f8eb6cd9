//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::account::Account;
use crate::currency::Currency;
use crate::gateway::handlers::{
    DepositRequest, ExternalTransferRequest, HealthResponse, InternalTransferRequest,
    OpenAccountRequest, SettlementReport,
};
use crate::ledger::{Transaction, TransactionStatus, TransactionType};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bankcore Ledger API",
        version = "1.0.0",
        description = "Account ledger and transfer engine for a retail banking backend.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::accounts::open_account,
        crate::gateway::handlers::accounts::list_accounts,
        crate::gateway::handlers::accounts::deposit,
        crate::gateway::handlers::accounts::list_all_accounts,
        crate::gateway::handlers::transfers::transfer_internal,
        crate::gateway::handlers::transfers::transfer_external,
        crate::gateway::handlers::transfers::list_transfers,
        crate::gateway::handlers::transfers::get_transfer,
    ),
    components(schemas(
        Account,
        Currency,
        Transaction,
        TransactionStatus,
        TransactionType,
        HealthResponse,
        OpenAccountRequest,
        DepositRequest,
        InternalTransferRequest,
        ExternalTransferRequest,
        SettlementReport,
    )),
    tags(
        (name = "Accounts", description = "Account opening, listing and deposits"),
        (name = "Transfers", description = "Internal and external transfers"),
        (name = "Admin", description = "Admin-only listings"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
