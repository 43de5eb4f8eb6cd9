//! Audit Sink
//!
//! Fire-and-forget audit trail. A sink failure is logged and swallowed: the
//! ledger operation it describes has already committed and must not be failed
//! retroactively by observability plumbing.

use async_trait::async_trait;
use sqlx::PgPool;

/// One auditable action against a ledger row
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditEvent {
    pub actor_id: i64,
    pub action: &'static str,
    pub target_table: &'static str,
    pub target_id: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub source_ip: Option<String>,
}

impl AuditEvent {
    pub fn new(
        actor_id: i64,
        action: &'static str,
        target_table: &'static str,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            action,
            target_table,
            target_id: target_id.into(),
            old_value: None,
            new_value: None,
            source_ip: None,
        }
    }

    pub fn with_new_value(mut self, value: serde_json::Value) -> Self {
        self.new_value = Some(value);
        self
    }

    pub fn with_old_value(mut self, value: serde_json::Value) -> Self {
        self.old_value = Some(value);
        self
    }
}

/// Audit event consumer. Implementations must never propagate failure.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Sink that emits audit events as structured log lines
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        tracing::info!(
            actor_id = event.actor_id,
            action = event.action,
            target_table = event.target_table,
            target_id = %event.target_id,
            "audit"
        );
    }
}

/// Sink that persists audit rows to the `audit_log` table
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: AuditEvent) {
        let result = sqlx::query(
            r#"INSERT INTO audit_log
                   (actor_id, action, target_table, target_id, old_value, new_value, source_ip)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(event.actor_id)
        .bind(event.action)
        .bind(event.target_table)
        .bind(&event.target_id)
        .bind(&event.old_value)
        .bind(&event.new_value)
        .bind(&event.source_ip)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                action = event.action,
                target_id = %event.target_id,
                error = %e,
                "audit write failed (dropped)"
            );
        }
    }
}
