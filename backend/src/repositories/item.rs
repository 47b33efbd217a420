//! Data access for inventory items: filtered listing, CRUD, and the
//! transactional quantity paths that feed the change log.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::change_log::InventoryChangeLog;
use crate::models::item::{adjusted_quantity, InventoryItem, StockLevel};
use crate::repositories::change_log;

const ITEM_COLUMNS: &str =
    "id, user_id, name, description, quantity, price, category, date_added, last_updated";

/// Optional list filters, combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct ItemFilters {
    /// Exact-match category.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub price_min: Option<Decimal>,
    /// Inclusive upper price bound.
    pub price_max: Option<Decimal>,
    /// Keep items with quantity strictly below this threshold.
    pub low_stock: Option<i64>,
    /// Case-insensitive substring match against name OR category.
    pub search: Option<String>,
}

/// Sortable item columns exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Name,
    Quantity,
    Price,
    DateAdded,
    LastUpdated,
}

impl OrderField {
    fn column(self) -> &'static str {
        match self {
            OrderField::Name => "name",
            OrderField::Quantity => "quantity",
            OrderField::Price => "price",
            OrderField::DateAdded => "date_added",
            OrderField::LastUpdated => "last_updated",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "name" => Some(OrderField::Name),
            "quantity" => Some(OrderField::Quantity),
            "price" => Some(OrderField::Price),
            "date_added" => Some(OrderField::DateAdded),
            "last_updated" => Some(OrderField::LastUpdated),
            _ => None,
        }
    }
}

/// Client-selected ordering. A leading `-` marks descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemOrdering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for ItemOrdering {
    fn default() -> Self {
        Self {
            field: OrderField::LastUpdated,
            descending: true,
        }
    }
}

impl ItemOrdering {
    /// Parses an `ordering` query value. Unknown fields yield `None` so the
    /// caller can fall back to the default.
    pub fn parse(raw: &str) -> Option<Self> {
        let (descending, field) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        OrderField::parse(field).map(|field| Self { field, descending })
    }

    fn order_clause(self) -> String {
        format!(
            "{} {}",
            self.field.column(),
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

/// Visibility scope for item queries. Non-staff callers are restricted to
/// their own rows; staff see everything.
#[derive(Debug, Clone)]
pub enum Scope {
    Owner(String),
    All,
}

impl Scope {
    pub fn for_caller(user_id: &str, is_staff: bool) -> Self {
        if is_staff {
            Scope::All
        } else {
            Scope::Owner(user_id.to_string())
        }
    }
}

/// Patch applied by the update path. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
}

pub async fn list_items(
    pool: &PgPool,
    scope: &Scope,
    filters: &ItemFilters,
    ordering: ItemOrdering,
    limit: i64,
    offset: i64,
) -> Result<(Vec<InventoryItem>, i64), sqlx::Error> {
    let mut builder = select_items_query(scope, filters, ordering, Some((limit, offset)));
    let items = builder
        .build_query_as::<InventoryItem>()
        .fetch_all(pool)
        .await?;

    let mut count_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM inventory_items");
    let mut count_has_clause = false;
    apply_item_filters(&mut count_builder, &mut count_has_clause, scope, filters);
    let total = count_builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

/// Unpaginated `{id, name, category, price, quantity}` projection over the
/// same visible, filtered set as the list query.
pub async fn list_levels(
    pool: &PgPool,
    scope: &Scope,
    filters: &ItemFilters,
    ordering: ItemOrdering,
) -> Result<Vec<StockLevel>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT id, name, category, price, quantity FROM inventory_items");
    let mut has_clause = false;
    apply_item_filters(&mut builder, &mut has_clause, scope, filters);
    builder.push(" ORDER BY ");
    builder.push(ordering.order_clause());
    builder.push(", id DESC");

    builder.build_query_as::<StockLevel>().fetch_all(pool).await
}

pub async fn fetch_visible_item(
    pool: &PgPool,
    item_id: &str,
    scope: &Scope,
) -> Result<Option<InventoryItem>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM inventory_items", ITEM_COLUMNS));
    builder.push(" WHERE id = ").push_bind(item_id.to_string());
    if let Scope::Owner(owner) = scope {
        builder.push(" AND user_id = ").push_bind(owner.to_string());
    }

    builder
        .build_query_as::<InventoryItem>()
        .fetch_optional(pool)
        .await
}

pub async fn insert_item(pool: &PgPool, item: &InventoryItem) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO inventory_items \
         (id, user_id, name, description, quantity, price, category, date_added, last_updated) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(&item.id)
    .bind(&item.user_id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.price)
    .bind(&item.category)
    .bind(item.date_added)
    .bind(item.last_updated)
    .execute(pool)
    .await
    .map(|_| ())
}

/// Applies a patch to a visible item. The row is locked for the duration of
/// the transaction; when the quantity changes, a change-log row is written in
/// the same transaction so the pair commits or aborts as one unit.
///
/// Returns `None` when the item does not exist or is not visible.
pub async fn update_item(
    pool: &PgPool,
    item_id: &str,
    scope: &Scope,
    actor_id: &str,
    patch: &ItemPatch,
    reason: &str,
) -> Result<Option<InventoryItem>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = lock_visible_item(&mut tx, item_id, scope).await? else {
        return Ok(None);
    };

    let mut updated = current;
    let before = updated.quantity;
    if let Some(name) = patch.name.clone() {
        updated.name = name;
    }
    if let Some(description) = patch.description.clone() {
        updated.description = description;
    }
    if let Some(quantity) = patch.quantity {
        updated.quantity = quantity;
    }
    if let Some(price) = patch.price {
        updated.price = price;
    }
    if let Some(category) = patch.category.clone() {
        updated.category = category;
    }
    updated.last_updated = chrono::Utc::now();

    persist_item_fields(&mut tx, &updated).await?;

    // The generic update path logs only when the quantity actually changed.
    if updated.quantity != before {
        let log = InventoryChangeLog::record(
            updated.id.clone(),
            Some(actor_id.to_string()),
            before,
            updated.quantity,
            reason.to_string(),
        );
        change_log::insert_change_log(&mut tx, &log).await?;
    }

    tx.commit().await?;
    Ok(Some(updated))
}

/// Applies a signed delta to a visible item's quantity, floored at zero,
/// under a row lock. Unlike the update path, a change-log row is written
/// unconditionally, including no-op deltas.
pub async fn adjust_quantity(
    pool: &PgPool,
    item_id: &str,
    scope: &Scope,
    actor_id: &str,
    delta: i64,
    reason: &str,
) -> Result<Option<InventoryItem>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(current) = lock_visible_item(&mut tx, item_id, scope).await? else {
        return Ok(None);
    };

    let mut updated = current;
    let before = updated.quantity;
    let after = adjusted_quantity(before, delta);
    updated.quantity = after;
    updated.last_updated = chrono::Utc::now();

    sqlx::query("UPDATE inventory_items SET quantity = $1, last_updated = $2 WHERE id = $3")
        .bind(updated.quantity)
        .bind(updated.last_updated)
        .bind(&updated.id)
        .execute(&mut *tx)
        .await?;

    let log = InventoryChangeLog::record(
        updated.id.clone(),
        Some(actor_id.to_string()),
        before,
        after,
        reason.to_string(),
    );
    change_log::insert_change_log(&mut tx, &log).await?;

    tx.commit().await?;
    Ok(Some(updated))
}

/// Deletes a visible item. Change logs cascade at the database level.
/// Returns `false` when the item does not exist or is not visible.
pub async fn delete_item(
    pool: &PgPool,
    item_id: &str,
    scope: &Scope,
) -> Result<bool, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("DELETE FROM inventory_items");
    builder.push(" WHERE id = ").push_bind(item_id.to_string());
    if let Scope::Owner(owner) = scope {
        builder.push(" AND user_id = ").push_bind(owner.to_string());
    }

    let result = builder.build().execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

async fn lock_visible_item(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    item_id: &str,
    scope: &Scope,
) -> Result<Option<InventoryItem>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM inventory_items", ITEM_COLUMNS));
    builder.push(" WHERE id = ").push_bind(item_id.to_string());
    if let Scope::Owner(owner) = scope {
        builder.push(" AND user_id = ").push_bind(owner.to_string());
    }
    builder.push(" FOR UPDATE");

    builder
        .build_query_as::<InventoryItem>()
        .fetch_optional(&mut **tx)
        .await
}

async fn persist_item_fields(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    item: &InventoryItem,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE inventory_items \
         SET name = $1, description = $2, quantity = $3, price = $4, category = $5, \
         last_updated = $6 WHERE id = $7",
    )
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.quantity)
    .bind(item.price)
    .bind(&item.category)
    .bind(item.last_updated)
    .bind(&item.id)
    .execute(&mut **tx)
    .await
    .map(|_| ())
}

fn select_items_query<'a>(
    scope: &Scope,
    filters: &'a ItemFilters,
    ordering: ItemOrdering,
    pagination: Option<(i64, i64)>,
) -> QueryBuilder<'a, Postgres> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM inventory_items", ITEM_COLUMNS));
    let mut has_clause = false;
    apply_item_filters(&mut builder, &mut has_clause, scope, filters);
    builder.push(" ORDER BY ");
    builder.push(ordering.order_clause());
    // Stable tiebreaker for rows with equal sort keys.
    builder.push(", id DESC");

    if let Some((limit, offset)) = pagination {
        builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
    }

    builder
}

fn apply_item_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    scope: &Scope,
    filters: &ItemFilters,
) {
    if let Scope::Owner(owner) = scope {
        push_clause(builder, has_clause);
        builder.push("user_id = ").push_bind(owner.to_string());
    }
    if let Some(category) = filters.category.as_ref() {
        push_clause(builder, has_clause);
        builder.push("category = ").push_bind(category.to_string());
    }
    if let Some(price_min) = filters.price_min {
        push_clause(builder, has_clause);
        builder.push("price >= ").push_bind(price_min);
    }
    if let Some(price_max) = filters.price_max {
        push_clause(builder, has_clause);
        builder.push("price <= ").push_bind(price_max);
    }
    if let Some(threshold) = filters.low_stock {
        push_clause(builder, has_clause);
        builder.push("quantity < ").push_bind(threshold);
    }
    if let Some(search) = filters.search.as_ref() {
        let pattern = format!("%{}%", escape_like(search));
        push_clause(builder, has_clause);
        builder
            .push("(name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR category ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    if *has_clause {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_clause = true;
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_parses_ascending_and_descending() {
        let ordering = ItemOrdering::parse("price").unwrap();
        assert_eq!(ordering.field, OrderField::Price);
        assert!(!ordering.descending);

        let ordering = ItemOrdering::parse("-price").unwrap();
        assert_eq!(ordering.field, OrderField::Price);
        assert!(ordering.descending);
    }

    #[test]
    fn ordering_rejects_unknown_fields() {
        assert!(ItemOrdering::parse("user_id").is_none());
        assert!(ItemOrdering::parse("-password_hash").is_none());
        assert!(ItemOrdering::parse("").is_none());
    }

    #[test]
    fn default_ordering_is_last_updated_descending() {
        let ordering = ItemOrdering::default();
        assert_eq!(ordering.field, OrderField::LastUpdated);
        assert!(ordering.descending);
        assert_eq!(ordering.order_clause(), "last_updated DESC");
    }

    #[test]
    fn scope_for_caller_restricts_non_staff() {
        assert!(matches!(
            Scope::for_caller("u1", false),
            Scope::Owner(ref owner) if owner == "u1"
        ));
        assert!(matches!(Scope::for_caller("u1", true), Scope::All));
    }

    #[test]
    fn list_query_scopes_to_owner() {
        let filters = ItemFilters::default();
        let mut builder = select_items_query(
            &Scope::Owner("u1".into()),
            &filters,
            ItemOrdering::default(),
            Some((10, 0)),
        );
        let sql = builder.sql();
        assert!(sql.contains("WHERE user_id = "));
        assert!(sql.contains("ORDER BY last_updated DESC"));
        assert!(sql.contains("LIMIT "));
    }

    #[test]
    fn list_query_for_staff_has_no_owner_clause() {
        let filters = ItemFilters::default();
        let mut builder =
            select_items_query(&Scope::All, &filters, ItemOrdering::default(), None);
        let sql = builder.sql();
        assert!(!sql.contains("user_id"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn list_query_combines_filters_with_and() {
        let filters = ItemFilters {
            category: Some("tools".into()),
            price_min: Some(Decimal::new(100, 2)),
            price_max: Some(Decimal::new(10000, 2)),
            low_stock: Some(5),
            search: Some("wid".into()),
        };
        let mut builder = select_items_query(
            &Scope::Owner("u1".into()),
            &filters,
            ItemOrdering::default(),
            None,
        );
        let sql = builder.sql();
        assert!(sql.contains("category = "));
        assert!(sql.contains("price >= "));
        assert!(sql.contains("price <= "));
        assert!(sql.contains("quantity < "));
        assert!(sql.contains("name ILIKE "));
        assert!(sql.contains(" OR category ILIKE "));
        assert_eq!(sql.matches(" AND ").count(), 5);
    }

    #[test]
    fn search_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }
}
