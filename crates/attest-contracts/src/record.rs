//! The audit record: one logical security-relevant event.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AttestError, AttestResult};

/// Caller-supplied event details, ordered by key.
pub type Payload = BTreeMap<String, Value>;

/// One audit event as recorded by the ledger.
///
/// Fields are private and there are no setters: a record is frozen the
/// moment the ledger writer builds it. The `timestamp` is always stamped by
/// the writer so callers cannot backdate events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    timestamp: i64,
    event_type: String,
    actor_id: String,
    payload: Payload,
}

impl AuditRecord {
    /// Build a record, rejecting an empty `event_type` or `actor_id`.
    pub fn new(
        timestamp: i64,
        event_type: impl Into<String>,
        actor_id: impl Into<String>,
        payload: Payload,
    ) -> AttestResult<Self> {
        let event_type = event_type.into();
        let actor_id = actor_id.into();

        if event_type.trim().is_empty() {
            return Err(AttestError::InvalidRecord {
                reason: "event_type must not be empty".to_string(),
            });
        }
        if actor_id.trim().is_empty() {
            return Err(AttestError::InvalidRecord {
                reason: "actor_id must not be empty".to_string(),
            });
        }

        Ok(Self {
            timestamp,
            event_type,
            actor_id,
            payload,
        })
    }

    /// Seconds since the Unix epoch, assigned at append time.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}
