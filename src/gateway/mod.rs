//! HTTP Gateway
//!
//! Thin axum adapter mapping the core operations 1:1 onto routes. No
//! business logic lives here: handlers parse, call into the services, and
//! wrap the result in the response envelope.

pub mod handlers;
pub mod openapi;
pub mod principal;
pub mod state;
pub mod types;

use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use handlers::{accounts, health, transfers};
use principal::principal_middleware;
pub use state::AppState;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    // Private routes require a principal
    let private = Router::new()
        .route(
            "/api/v1/accounts",
            post(accounts::open_account).get(accounts::list_accounts),
        )
        .route("/api/v1/accounts/deposit", post(accounts::deposit))
        .route("/api/v1/admin/accounts", get(accounts::list_all_accounts))
        .route(
            "/api/v1/transfers/internal",
            post(transfers::transfer_internal),
        )
        .route(
            "/api/v1/transfers/external",
            post(transfers::transfer_external),
        )
        .route("/api/v1/transfers", get(transfers::list_transfers))
        .route("/api/v1/transfers/{id}", get(transfers::get_transfer))
        .layer(from_fn(principal_middleware));

    let public = Router::new().route("/health", get(health::health_check));

    // The settlement report endpoint simulates the inter-bank channel; the
    // real channel replaces it in production builds.
    #[cfg(feature = "mock-api")]
    let public = public.route(
        "/api/v1/mock/settlement",
        post(transfers::mock_settlement),
    );

    Router::new()
        .merge(private)
        .merge(public)
        .layer(CorsLayer::permissive())
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
