//! Models for the append-only inventory change log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One immutable quantity transition for an item. Rows are never updated or
/// deleted directly; they disappear only when their item cascades away.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryChangeLog {
    pub id: String,
    pub item_id: String,
    /// Acting user, or `None` for system-initiated changes.
    pub performed_by: Option<String>,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub delta: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl InventoryChangeLog {
    /// Builds a log entry for a transition. The delta is always derived from
    /// the before/after pair, never taken from the caller.
    pub fn record(
        item_id: String,
        performed_by: Option<String>,
        quantity_before: i64,
        quantity_after: i64,
        reason: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            item_id,
            performed_by,
            quantity_before,
            quantity_after,
            delta: quantity_after - quantity_before,
            reason,
            created_at: Utc::now(),
        }
    }
}

/// History entry returned by the API, with the acting user's username
/// resolved (`null` for system-initiated entries).
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ChangeLogEntry {
    pub id: String,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub delta: i64,
    pub reason: String,
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
