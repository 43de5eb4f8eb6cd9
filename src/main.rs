//! Bankcore - Retail Banking Ledger Core
//!
//! Server entry point. Architecture:
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│   Store   │───▶│  Engine  │───▶│ Gateway  │
//! │  (YAML)  │    │ (PG/Mem)  │    │ (Locks)  │    │  (axum)  │
//! └──────────┘    └───────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Engine responsibilities:
//! - Per-account lock ordering
//! - Atomic debit + credit + ledger insert
//! - External transfer lifecycle (hold, hand-off, settle/refund)

use std::sync::Arc;

use anyhow::Context;

use bankcore::account::{AccountNumberAllocator, AccountService};
use bankcore::audit::{AuditSink, PgAuditSink, TracingAuditSink};
use bankcore::config::AppConfig;
use bankcore::gateway::{self, AppState};
use bankcore::logging::init_logging;
use bankcore::principal::StaticRoleProvider;
use bankcore::store::{MemStore, PgStore, Store};
use bankcore::transfer::{MockSettlementChannel, TransferEngine};

// ============================================================
// CLI ARGUMENTS
// ============================================================

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

/// Force the in-memory store even when postgres_url is configured
fn use_mem_store() -> bool {
    std::env::args().any(|a| a == "--mem")
}

// ============================================================
// MAIN
// ============================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    tracing::info!(
        env = %env,
        version = env!("GIT_HASH"),
        bank_prefix = %config.bank.prefix,
        "bankcore starting"
    );

    // Storage: PostgreSQL when configured, in-memory otherwise
    let (store, pg_pool): (Arc<dyn Store>, Option<sqlx::PgPool>) =
        match (&config.postgres_url, use_mem_store()) {
            (Some(url), false) => {
                let pg = PgStore::connect(url)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                pg.init_schema()
                    .await
                    .context("failed to bootstrap schema")?;
                pg.health_check().await.context("database health check")?;
                let pool = pg.pool().clone();
                (Arc::new(pg), Some(pool))
            }
            _ => {
                tracing::warn!("running on the in-memory store, state is not durable");
                (Arc::new(MemStore::new()), None)
            }
        };

    // Audit trail follows the storage choice
    let audit: Arc<dyn AuditSink> = match &pg_pool {
        Some(pool) => Arc::new(PgAuditSink::new(pool.clone())),
        None => Arc::new(TracingAuditSink),
    };

    let allocator = AccountNumberAllocator::new(&config.bank.prefix)
        .context("invalid bank prefix in config")?;
    let accounts = Arc::new(AccountService::new(
        store.clone(),
        allocator,
        audit.clone(),
    ));

    // The mock channel stands in for the inter-bank network; transfers land
    // inProgress and settle via the mock settlement endpoint.
    let settlement = Arc::new(MockSettlementChannel::new());
    let engine = Arc::new(TransferEngine::new(
        store,
        settlement,
        audit,
        config.bank.prefix.clone(),
    ));

    let roles = Arc::new(StaticRoleProvider::new(config.bank.admins.iter().copied()));

    let state = AppState::new(accounts, engine, roles);
    let port = get_port_override().unwrap_or(config.gateway.port);
    gateway::serve(state, &config.gateway.host, port).await
}
