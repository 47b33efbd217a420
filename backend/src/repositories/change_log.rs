//! Data access for the append-only inventory change log.

use sqlx::{PgPool, Postgres};

use crate::models::change_log::{ChangeLogEntry, InventoryChangeLog};

/// Appends one change-log row inside the caller's transaction, so the item
/// write and its log entry commit or abort together.
pub async fn insert_change_log(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    log: &InventoryChangeLog,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO inventory_change_logs \
         (id, item_id, performed_by, quantity_before, quantity_after, delta, reason, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&log.id)
    .bind(&log.item_id)
    .bind(log.performed_by.as_deref())
    .bind(log.quantity_before)
    .bind(log.quantity_after)
    .bind(log.delta)
    .bind(&log.reason)
    .bind(log.created_at)
    .execute(&mut **tx)
    .await
    .map(|_| ())
}

/// All log entries for an item, newest first, with the acting user's
/// username resolved. `performed_by` is null for system-initiated entries
/// and for users that were deleted after acting.
pub async fn list_item_history(
    pool: &PgPool,
    item_id: &str,
) -> Result<Vec<ChangeLogEntry>, sqlx::Error> {
    sqlx::query_as::<_, ChangeLogEntry>(
        "SELECT c.id, c.quantity_before, c.quantity_after, c.delta, c.reason, \
         u.username AS performed_by, c.created_at \
         FROM inventory_change_logs c \
         LEFT JOIN users u ON u.id = c.performed_by \
         WHERE c.item_id = $1 \
         ORDER BY c.created_at DESC, c.id DESC",
    )
    .bind(item_id)
    .fetch_all(pool)
    .await
}
