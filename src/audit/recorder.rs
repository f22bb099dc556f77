// Audit recording: diff snapshots, build the log entry, hand it to a store

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::audit::diff::{diff, to_document};
use crate::core::errors::GateError;
use crate::core::models::{AuditAction, AuditItem, AuditLogEntry, SessionClaims};

/// Persistence sink for audit entries
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert(&self, entry: AuditLogEntry) -> Result<AuditLogEntry, GateError>;
}

/// Audit store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn insert(&self, entry: AuditLogEntry) -> Result<AuditLogEntry, GateError> {
        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }
}

/// Records mutations performed by authenticated subjects
///
/// Recording is best-effort: store failures are logged and never reach the
/// caller, so a failed audit write cannot undo the mutation it describes.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Diff `before` against `after` and persist the delta
    ///
    /// Returns the stored entry, or `None` when there is no actor or the
    /// store rejected the insert.
    pub async fn record(
        &self,
        actor: Option<&SessionClaims>,
        item: &AuditItem,
        action: AuditAction,
        before: Value,
        after: Value,
    ) -> Option<AuditLogEntry> {
        let actor = match actor {
            Some(a) => a,
            None => {
                debug!(item_type = %item.item_type, item_id = %item.item_id, "No actor, skipping audit entry");
                return None;
            }
        };

        let delta = diff(&to_document(before), &to_document(after));
        let entry = AuditLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            created_on: Utc::now(),
            user_id: actor.subject_id.clone(),
            user_type: actor.subject_type,
            action,
            item_type: item.item_type.clone(),
            item_id: item.item_id.clone(),
            item_name: item.item_name.clone(),
            before_change: Value::Object(delta.before).to_string(),
            after_change: Value::Object(delta.after).to_string(),
        };

        match self.store.insert(entry).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(
                    error = %e,
                    action = action.as_str(),
                    item_type = %item.item_type,
                    item_id = %item.item_id,
                    "Failed to write audit log entry"
                );
                None
            }
        }
    }
}
