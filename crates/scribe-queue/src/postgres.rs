//! Postgres queue backend.
//!
//! One pair of tables per queue: `<name>_messages` and
//! `<name>_dead_letters`. Leasing claims the oldest visible row under
//! `FOR UPDATE SKIP LOCKED`, so concurrent workers on separate connections
//! never double-lease. Expiry is implicit: a row whose `leased_until` has
//! passed is visible to the next scan, which also records the lapsed lease
//! in the row's failure history.

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::marker::PhantomData;
use uuid::Uuid;

use async_trait::async_trait;
use scribe_core::envelope::FailureRecord;
use scribe_core::{CodecError, DeadLetterRecord, codec};

use crate::error::QueueError;
use crate::queue::{DurableQueue, Leased, QueueDepth, QueueOptions, exhaustion_reason};

/// Postgres-backed durable queue.
pub struct PgQueue<M> {
    pool: PgPool,
    options: QueueOptions,
    messages_table: String,
    dead_letters_table: String,
    _marker: PhantomData<fn() -> M>,
}

fn quoted_table(name: &str, suffix: &str) -> Result<String, QueueError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueueError::InvalidName(name.to_string()));
    }
    Ok(format!("\"{name}_{suffix}\""))
}

impl<M> PgQueue<M> {
    /// Create a queue over an existing pool.
    pub fn new(pool: PgPool, options: QueueOptions) -> Result<Self, QueueError> {
        let messages_table = quoted_table(&options.name, "messages")?;
        let dead_letters_table = quoted_table(&options.name, "dead_letters")?;
        Ok(Self {
            pool,
            options,
            messages_table,
            dead_letters_table,
            _marker: PhantomData,
        })
    }

    /// Connect to the database and create a queue.
    pub async fn connect(database_url: &str, options: QueueOptions) -> Result<Self, QueueError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Self::new(pool, options)
    }

    /// Create the queue tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), QueueError> {
        let messages = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                frame JSONB NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                lease_token UUID,
                leased_until TIMESTAMPTZ,
                failures JSONB NOT NULL DEFAULT '[]'::jsonb,
                enqueued_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            self.messages_table
        );
        sqlx::query(&messages).execute(&self.pool).await?;

        let dead_letters = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                frame JSONB NOT NULL,
                reason TEXT NOT NULL,
                delivery_attempts INTEGER NOT NULL,
                failures JSONB NOT NULL DEFAULT '[]'::jsonb,
                dead_lettered_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            self.dead_letters_table
        );
        sqlx::query(&dead_letters).execute(&self.pool).await?;
        Ok(())
    }
}

fn failures_from_row(value: serde_json::Value) -> Result<Vec<FailureRecord>, QueueError> {
    Ok(serde_json::from_value(value).map_err(CodecError::Malformed)?)
}

fn failures_to_json(failures: &[FailureRecord]) -> Result<serde_json::Value, QueueError> {
    Ok(serde_json::to_value(failures).map_err(CodecError::Malformed)?)
}

#[async_trait]
impl<M> DurableQueue<M> for PgQueue<M>
where
    M: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn publish(&self, message: &M) -> Result<(), QueueError> {
        let frame = codec::encode_value(message)?;
        let sql = format!("INSERT INTO {} (frame) VALUES ($1)", self.messages_table);
        sqlx::query(&sql).bind(&frame).execute(&self.pool).await?;
        Ok(())
    }

    async fn lease(&self) -> Result<Option<Leased<M>>, QueueError> {
        loop {
            let mut tx = self.pool.begin().await?;

            let select = format!(
                "SELECT id, frame, attempts, lease_token, failures FROM {}
                 WHERE lease_token IS NULL OR leased_until <= now()
                 ORDER BY id LIMIT 1
                 FOR UPDATE SKIP LOCKED",
                self.messages_table
            );
            let Some(row) = sqlx::query(&select).fetch_optional(&mut *tx).await? else {
                return Ok(None);
            };

            let id: i64 = row.try_get("id")?;
            let frame: serde_json::Value = row.try_get("frame")?;
            let attempts: i32 = row.try_get("attempts")?;
            let prior_token: Option<Uuid> = row.try_get("lease_token")?;
            let mut failures = failures_from_row(row.try_get("failures")?)?;

            let now = Utc::now();
            if prior_token.is_some() {
                // Previous lease lapsed without a settle.
                failures.push(FailureRecord {
                    attempt: attempts.max(0) as u32,
                    reason: "lease expired".to_string(),
                    occurred_at: now,
                });
            }

            if attempts.max(0) as u32 >= self.options.max_attempts {
                let reason = exhaustion_reason(&failures);
                let insert = format!(
                    "INSERT INTO {} (frame, reason, delivery_attempts, failures)
                     VALUES ($1, $2, $3, $4)",
                    self.dead_letters_table
                );
                sqlx::query(&insert)
                    .bind(&frame)
                    .bind(&reason)
                    .bind(attempts)
                    .bind(failures_to_json(&failures)?)
                    .execute(&mut *tx)
                    .await?;
                let delete = format!("DELETE FROM {} WHERE id = $1", self.messages_table);
                sqlx::query(&delete).bind(id).execute(&mut *tx).await?;
                tx.commit().await?;

                tracing::warn!(
                    queue = %self.options.name,
                    attempts,
                    reason = %reason,
                    "delivery budget exhausted, dead-lettering message"
                );
                continue;
            }

            let token = Uuid::new_v4();
            let next_attempt = attempts + 1;
            let leased_until = now + self.options.visibility_timeout;
            let update = format!(
                "UPDATE {} SET attempts = $1, lease_token = $2, leased_until = $3, failures = $4
                 WHERE id = $5",
                self.messages_table
            );
            sqlx::query(&update)
                .bind(next_attempt)
                .bind(token)
                .bind(leased_until)
                .bind(failures_to_json(&failures)?)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            let message: M = codec::decode_value(frame)?;
            return Ok(Some(Leased {
                message,
                token,
                delivery_attempt: next_attempt.max(0) as u32,
                leased_until,
            }));
        }
    }

    async fn acknowledge(&self, token: Uuid) -> Result<bool, QueueError> {
        let sql = format!("DELETE FROM {} WHERE lease_token = $1", self.messages_table);
        let result = sqlx::query(&sql).bind(token).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn release(&self, token: Uuid, reason: Option<String>) -> Result<bool, QueueError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT id, frame, attempts, failures FROM {} WHERE lease_token = $1 FOR UPDATE",
            self.messages_table
        );
        let Some(row) = sqlx::query(&select)
            .bind(token)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(false);
        };

        let id: i64 = row.try_get("id")?;
        let frame: serde_json::Value = row.try_get("frame")?;
        let attempts: i32 = row.try_get("attempts")?;
        let mut failures = failures_from_row(row.try_get("failures")?)?;

        if let Some(reason) = &reason {
            failures.push(FailureRecord {
                attempt: attempts.max(0) as u32,
                reason: reason.clone(),
                occurred_at: Utc::now(),
            });
        }

        if attempts.max(0) as u32 >= self.options.max_attempts {
            let reason = exhaustion_reason(&failures);
            let insert = format!(
                "INSERT INTO {} (frame, reason, delivery_attempts, failures)
                 VALUES ($1, $2, $3, $4)",
                self.dead_letters_table
            );
            sqlx::query(&insert)
                .bind(&frame)
                .bind(&reason)
                .bind(attempts)
                .bind(failures_to_json(&failures)?)
                .execute(&mut *tx)
                .await?;
            let delete = format!("DELETE FROM {} WHERE id = $1", self.messages_table);
            sqlx::query(&delete).bind(id).execute(&mut *tx).await?;
            tx.commit().await?;

            tracing::warn!(
                queue = %self.options.name,
                attempts,
                reason = %reason,
                "delivery budget exhausted on release, dead-lettering message"
            );
            return Ok(true);
        }

        let update = format!(
            "UPDATE {} SET lease_token = NULL, leased_until = NULL, failures = $1 WHERE id = $2",
            self.messages_table
        );
        sqlx::query(&update)
            .bind(failures_to_json(&failures)?)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn dead_letter(&self, token: Uuid, reason: String) -> Result<bool, QueueError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT id, frame, attempts, failures FROM {} WHERE lease_token = $1 FOR UPDATE",
            self.messages_table
        );
        let Some(row) = sqlx::query(&select)
            .bind(token)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(false);
        };

        let id: i64 = row.try_get("id")?;
        let frame: serde_json::Value = row.try_get("frame")?;
        let attempts: i32 = row.try_get("attempts")?;
        let mut failures = failures_from_row(row.try_get("failures")?)?;
        failures.push(FailureRecord {
            attempt: attempts.max(0) as u32,
            reason: reason.clone(),
            occurred_at: Utc::now(),
        });

        let insert = format!(
            "INSERT INTO {} (frame, reason, delivery_attempts, failures)
             VALUES ($1, $2, $3, $4)",
            self.dead_letters_table
        );
        sqlx::query(&insert)
            .bind(&frame)
            .bind(&reason)
            .bind(attempts)
            .bind(failures_to_json(&failures)?)
            .execute(&mut *tx)
            .await?;
        let delete = format!("DELETE FROM {} WHERE id = $1", self.messages_table);
        sqlx::query(&delete).bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        let counts = format!(
            "SELECT
                COUNT(*) FILTER (WHERE lease_token IS NULL OR leased_until <= now()) AS ready,
                COUNT(*) FILTER (WHERE lease_token IS NOT NULL AND leased_until > now()) AS leased
             FROM {}",
            self.messages_table
        );
        let row = sqlx::query(&counts).fetch_one(&self.pool).await?;
        let ready: i64 = row.try_get("ready")?;
        let leased: i64 = row.try_get("leased")?;

        let dead = format!("SELECT COUNT(*) AS dead FROM {}", self.dead_letters_table);
        let row = sqlx::query(&dead).fetch_one(&self.pool).await?;
        let dead_lettered: i64 = row.try_get("dead")?;

        Ok(QueueDepth {
            ready: ready.max(0) as u64,
            leased: leased.max(0) as u64,
            dead_lettered: dead_lettered.max(0) as u64,
        })
    }

    async fn dead_letters(&self) -> Result<Vec<DeadLetterRecord<M>>, QueueError> {
        let sql = format!(
            "SELECT frame, reason, delivery_attempts, failures, dead_lettered_at
             FROM {} ORDER BY id",
            self.dead_letters_table
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let frame: serde_json::Value = row.try_get("frame")?;
            let delivery_attempts: i32 = row.try_get("delivery_attempts")?;
            records.push(DeadLetterRecord {
                message: codec::decode_value(frame)?,
                reason: row.try_get("reason")?,
                delivery_attempts: delivery_attempts.max(0) as u32,
                failures: failures_from_row(row.try_get("failures")?)?,
                dead_lettered_at: row.try_get("dead_lettered_at")?,
            });
        }
        Ok(records)
    }
}
