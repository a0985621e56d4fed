//! In-process queue backend.
//!
//! Single-process counterpart of the Postgres backend with identical
//! semantics: messages round-trip through the versioned wire codec, leases
//! expire by wall clock, and attempt accounting matches exactly. Used by
//! tests and by development mode, where the server runs its workers
//! in-process.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use async_trait::async_trait;
use scribe_core::envelope::FailureRecord;
use scribe_core::{DeadLetterRecord, codec};

use crate::error::QueueError;
use crate::queue::{DurableQueue, Leased, QueueDepth, QueueOptions, exhaustion_reason};

struct StoredMessage {
    frame: Vec<u8>,
    attempts: u32,
    lease_token: Option<Uuid>,
    leased_until: Option<DateTime<Utc>>,
    failures: Vec<FailureRecord>,
}

impl StoredMessage {
    fn leasable_at(&self, now: DateTime<Utc>) -> bool {
        match (self.lease_token, self.leased_until) {
            (None, _) => true,
            (Some(_), Some(until)) => until <= now,
            (Some(_), None) => true,
        }
    }
}

struct DeadLetter {
    frame: Vec<u8>,
    reason: String,
    delivery_attempts: u32,
    failures: Vec<FailureRecord>,
    dead_lettered_at: DateTime<Utc>,
}

struct Inner {
    messages: VecDeque<StoredMessage>,
    dead: Vec<DeadLetter>,
}

/// In-memory durable queue.
pub struct MemoryQueue<M> {
    options: QueueOptions,
    inner: Mutex<Inner>,
    _marker: PhantomData<fn() -> M>,
}

impl<M> MemoryQueue<M> {
    /// Create an empty queue.
    pub fn new(options: QueueOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(Inner {
                messages: VecDeque::new(),
                dead: Vec::new(),
            }),
            _marker: PhantomData,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, QueueError> {
        self.inner
            .lock()
            .map_err(|e| QueueError::Unavailable(format!("queue lock poisoned: {e}")))
    }
}

#[async_trait]
impl<M> DurableQueue<M> for MemoryQueue<M>
where
    M: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn publish(&self, message: &M) -> Result<(), QueueError> {
        let frame = codec::encode(message)?;
        let mut inner = self.lock()?;
        inner.messages.push_back(StoredMessage {
            frame,
            attempts: 0,
            lease_token: None,
            leased_until: None,
            failures: Vec::new(),
        });
        Ok(())
    }

    async fn lease(&self) -> Result<Option<Leased<M>>, QueueError> {
        let now = Utc::now();
        let mut inner = self.lock()?;

        loop {
            let Some(idx) = inner.messages.iter().position(|m| m.leasable_at(now)) else {
                return Ok(None);
            };

            let exhausted = {
                let msg = &mut inner.messages[idx];
                if msg.lease_token.is_some() {
                    // Previous lease lapsed without a settle.
                    msg.failures.push(FailureRecord {
                        attempt: msg.attempts,
                        reason: "lease expired".to_string(),
                        occurred_at: now,
                    });
                    msg.lease_token = None;
                    msg.leased_until = None;
                }
                msg.attempts >= self.options.max_attempts
            };

            if exhausted {
                if let Some(msg) = inner.messages.remove(idx) {
                    let reason = exhaustion_reason(&msg.failures);
                    tracing::warn!(
                        queue = %self.options.name,
                        attempts = msg.attempts,
                        reason = %reason,
                        "delivery budget exhausted, dead-lettering message"
                    );
                    inner.dead.push(DeadLetter {
                        frame: msg.frame,
                        reason,
                        delivery_attempts: msg.attempts,
                        failures: msg.failures,
                        dead_lettered_at: now,
                    });
                }
                continue;
            }

            let msg = &mut inner.messages[idx];
            msg.attempts += 1;
            let token = Uuid::new_v4();
            let leased_until = now + self.options.visibility_timeout;
            msg.lease_token = Some(token);
            msg.leased_until = Some(leased_until);

            let message: M = codec::decode(&msg.frame)?;
            return Ok(Some(Leased {
                message,
                token,
                delivery_attempt: msg.attempts,
                leased_until,
            }));
        }
    }

    async fn acknowledge(&self, token: Uuid) -> Result<bool, QueueError> {
        let mut inner = self.lock()?;
        let Some(idx) = inner
            .messages
            .iter()
            .position(|m| m.lease_token == Some(token))
        else {
            return Ok(false);
        };
        inner.messages.remove(idx);
        Ok(true)
    }

    async fn release(&self, token: Uuid, reason: Option<String>) -> Result<bool, QueueError> {
        let now = Utc::now();
        let mut inner = self.lock()?;
        let Some(idx) = inner
            .messages
            .iter()
            .position(|m| m.lease_token == Some(token))
        else {
            return Ok(false);
        };

        let exhausted = {
            let msg = &mut inner.messages[idx];
            if let Some(reason) = &reason {
                msg.failures.push(FailureRecord {
                    attempt: msg.attempts,
                    reason: reason.clone(),
                    occurred_at: now,
                });
            }
            msg.lease_token = None;
            msg.leased_until = None;
            msg.attempts >= self.options.max_attempts
        };

        if exhausted && let Some(msg) = inner.messages.remove(idx) {
            let reason = exhaustion_reason(&msg.failures);
            tracing::warn!(
                queue = %self.options.name,
                attempts = msg.attempts,
                reason = %reason,
                "delivery budget exhausted on release, dead-lettering message"
            );
            inner.dead.push(DeadLetter {
                frame: msg.frame,
                reason,
                delivery_attempts: msg.attempts,
                failures: msg.failures,
                dead_lettered_at: now,
            });
        }
        Ok(true)
    }

    async fn dead_letter(&self, token: Uuid, reason: String) -> Result<bool, QueueError> {
        let now = Utc::now();
        let mut inner = self.lock()?;
        let Some(idx) = inner
            .messages
            .iter()
            .position(|m| m.lease_token == Some(token))
        else {
            return Ok(false);
        };

        if let Some(mut msg) = inner.messages.remove(idx) {
            msg.failures.push(FailureRecord {
                attempt: msg.attempts,
                reason: reason.clone(),
                occurred_at: now,
            });
            inner.dead.push(DeadLetter {
                frame: msg.frame,
                reason,
                delivery_attempts: msg.attempts,
                failures: msg.failures,
                dead_lettered_at: now,
            });
        }
        Ok(true)
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        let now = Utc::now();
        let inner = self.lock()?;
        let ready = inner.messages.iter().filter(|m| m.leasable_at(now)).count() as u64;
        let leased = inner.messages.len() as u64 - ready;
        Ok(QueueDepth {
            ready,
            leased,
            dead_lettered: inner.dead.len() as u64,
        })
    }

    async fn dead_letters(&self) -> Result<Vec<DeadLetterRecord<M>>, QueueError> {
        let inner = self.lock()?;
        inner
            .dead
            .iter()
            .map(|d| {
                Ok(DeadLetterRecord {
                    message: codec::decode(&d.frame)?,
                    reason: d.reason.clone(),
                    delivery_attempts: d.delivery_attempts,
                    failures: d.failures.clone(),
                    dead_lettered_at: d.dead_lettered_at,
                })
            })
            .collect()
    }
}
