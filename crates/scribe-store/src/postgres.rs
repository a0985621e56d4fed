//! Postgres store backend.
//!
//! One `audit_logs` table with `(tenant_id, log_id)` as the primary key.
//! Upserts are `INSERT .. ON CONFLICT DO NOTHING`; a conflicting key is
//! re-read and compared so the caller can tell a harmless duplicate from a
//! genuine integrity conflict.

use async_trait::async_trait;
use scribe_core::{LogAction, LogEntry, LogSeverity};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::{Arguments, Row};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{LogFilter, LogStore, UpsertOutcome, content_matches};

const ENTRY_COLUMNS: &str = "tenant_id, log_id, user_id, session_id, action, resource_type, \
     resource_id, occurred_at, severity, message, before_state, after_state, \
     metadata, request_id, ip_address, user_agent";

fn args_add<T>(args: &mut PgArguments, v: T) -> Result<(), StoreError>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v).map_err(sqlx::Error::Encode)?;
    Ok(())
}

/// JSONB bind for an optional state column.
fn json_opt(value: &Option<serde_json::Value>) -> Option<&serde_json::Value> {
    value.as_ref()
}

/// `metadata` is `Null` when absent; store SQL NULL instead of JSON null.
fn metadata_opt(value: &serde_json::Value) -> Option<&serde_json::Value> {
    if value.is_null() { None } else { Some(value) }
}

fn row_to_entry(row: &PgRow) -> Result<LogEntry, StoreError> {
    let action: String = row.try_get("action")?;
    let action: LogAction = action
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("action column: {e}")))?;
    let severity: String = row.try_get("severity")?;
    let severity: LogSeverity = severity
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("severity column: {e}")))?;
    let metadata: Option<serde_json::Value> = row.try_get("metadata")?;

    Ok(LogEntry {
        log_id: row.try_get("log_id")?,
        tenant_id: row.try_get("tenant_id")?,
        user_id: row.try_get("user_id")?,
        session_id: row.try_get("session_id")?,
        action,
        resource_type: row.try_get("resource_type")?,
        resource_id: row.try_get("resource_id")?,
        timestamp: row.try_get("occurred_at")?,
        severity,
        message: row.try_get("message")?,
        before_state: row.try_get("before_state")?,
        after_state: row.try_get("after_state")?,
        metadata: metadata.unwrap_or(serde_json::Value::Null),
        request_id: row.try_get("request_id")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
    })
}

/// Postgres-backed [`LogStore`].
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and create a store.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the `audit_logs` table and its tenant-first index if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS audit_logs (
                tenant_id TEXT NOT NULL,
                log_id UUID NOT NULL,
                user_id TEXT NOT NULL,
                session_id TEXT,
                action TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                resource_id TEXT NOT NULL,
                occurred_at TIMESTAMPTZ NOT NULL,
                severity TEXT NOT NULL,
                message TEXT NOT NULL,
                before_state JSONB,
                after_state JSONB,
                metadata JSONB,
                request_id TEXT,
                ip_address TEXT,
                user_agent TEXT,
                stored_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (tenant_id, log_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS audit_logs_tenant_time_idx
             ON audit_logs (tenant_id, occurred_at DESC)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch(&self, tenant_id: &str, log_id: Uuid) -> Result<Option<LogEntry>, StoreError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM audit_logs WHERE tenant_id = $1 AND log_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(log_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_entry).transpose()
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn upsert(&self, entry: &LogEntry) -> Result<UpsertOutcome, StoreError> {
        let sql = format!(
            "INSERT INTO audit_logs ({ENTRY_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             ON CONFLICT (tenant_id, log_id) DO NOTHING"
        );
        let result = sqlx::query(&sql)
            .bind(&entry.tenant_id)
            .bind(entry.log_id)
            .bind(&entry.user_id)
            .bind(&entry.session_id)
            .bind(entry.action.to_string())
            .bind(&entry.resource_type)
            .bind(&entry.resource_id)
            .bind(entry.timestamp)
            .bind(entry.severity.to_string())
            .bind(&entry.message)
            .bind(json_opt(&entry.before_state))
            .bind(json_opt(&entry.after_state))
            .bind(metadata_opt(&entry.metadata))
            .bind(&entry.request_id)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(UpsertOutcome::Inserted);
        }

        let Some(stored) = self.fetch(&entry.tenant_id, entry.log_id).await? else {
            // The conflicting row vanished between insert and read. Let the
            // caller retry against a settled state.
            return Err(StoreError::Unavailable(format!(
                "entry {} disappeared mid-upsert",
                entry.dedup_key()
            )));
        };

        if content_matches(&stored, entry) {
            Ok(UpsertOutcome::AlreadyPresent)
        } else {
            tracing::warn!(
                tenant_id = %entry.tenant_id,
                log_id = %entry.log_id,
                "integrity conflict: same identity, different content"
            );
            Err(StoreError::Conflict {
                tenant_id: entry.tenant_id.clone(),
                log_id: entry.log_id,
            })
        }
    }

    async fn get(&self, tenant_id: &str, log_id: Uuid) -> Result<Option<LogEntry>, StoreError> {
        self.fetch(tenant_id, log_id).await
    }

    async fn list(&self, tenant_id: &str, filter: LogFilter) -> Result<Vec<LogEntry>, StoreError> {
        let mut where_parts: Vec<String> = vec!["tenant_id = $1".to_string()];
        let mut args = PgArguments::default();
        args_add(&mut args, tenant_id.to_string())?;
        let mut idx: usize = 2;

        if let Some(user) = filter.user_id {
            where_parts.push(format!("user_id = ${idx}"));
            args_add(&mut args, user)?;
            idx += 1;
        }
        if let Some(action) = filter.action {
            where_parts.push(format!("action = ${idx}"));
            args_add(&mut args, action.to_string())?;
            idx += 1;
        }
        if let Some(rt) = filter.resource_type {
            where_parts.push(format!("resource_type = ${idx}"));
            args_add(&mut args, rt)?;
            idx += 1;
        }
        if let Some(rid) = filter.resource_id {
            where_parts.push(format!("resource_id = ${idx}"));
            args_add(&mut args, rid)?;
            idx += 1;
        }
        if let Some(severity) = filter.severity {
            where_parts.push(format!("severity = ${idx}"));
            args_add(&mut args, severity.to_string())?;
            idx += 1;
        }
        if let Some(start) = filter.start_time {
            where_parts.push(format!("occurred_at >= ${idx}"));
            args_add(&mut args, start)?;
            idx += 1;
        }
        if let Some(end) = filter.end_time {
            where_parts.push(format!("occurred_at <= ${idx}"));
            args_add(&mut args, end)?;
            idx += 1;
        }

        let mut tail = String::new();
        if let Some(limit) = filter.limit {
            tail.push_str(&format!(" LIMIT ${idx}"));
            args_add(&mut args, limit as i64)?;
            idx += 1;
        }
        if let Some(offset) = filter.offset {
            tail.push_str(&format!(" OFFSET ${idx}"));
            args_add(&mut args, offset as i64)?;
        }

        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM audit_logs
             WHERE {}
             ORDER BY occurred_at DESC, log_id DESC{tail}",
            where_parts.join(" AND ")
        );

        let rows = sqlx::query_with(&sql, args).fetch_all(&self.pool).await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(row_to_entry(row)?);
        }
        Ok(entries)
    }

    async fn count(&self, tenant_id: &str) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM audit_logs WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        let cnt: i64 = row.try_get("cnt")?;
        Ok(cnt.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_null_binds_as_sql_null() {
        assert!(metadata_opt(&serde_json::Value::Null).is_none());
        assert!(metadata_opt(&serde_json::json!({"k": "v"})).is_some());
    }
}
