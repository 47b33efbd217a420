//! Handlers for the inventory item collection: CRUD, stock-level projection,
//! change history, and the quantity adjustment action.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        change_log::ChangeLogEntry,
        item::{CreateItemRequest, InventoryItem, ItemResponse, StockLevel, UpdateItemRequest},
        user::User,
        Page, PageQuery, PAGE_SIZE,
    },
    repositories::{
        change_log,
        item::{self as item_repo, ItemFilters, ItemOrdering, ItemPatch, Scope},
    },
};

/// Query parameters accepted by the list and levels endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub category: Option<String>,
    #[serde(rename = "price__gte")]
    pub price_gte: Option<Decimal>,
    #[serde(rename = "price__lte")]
    pub price_lte: Option<Decimal>,
    /// Threshold for the low-stock filter. Malformed values are ignored.
    pub low_stock: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
}

impl ItemListQuery {
    fn filters(&self) -> ItemFilters {
        ItemFilters {
            category: self.category.clone(),
            price_min: self.price_gte,
            price_max: self.price_lte,
            low_stock: self.parsed_low_stock(),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// A malformed or negative threshold disables the filter rather than
    /// failing the request.
    fn parsed_low_stock(&self) -> Option<i64> {
        self.low_stock
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|threshold| *threshold >= 0)
    }

    fn ordering(&self) -> ItemOrdering {
        self.ordering
            .as_deref()
            .and_then(ItemOrdering::parse)
            .unwrap_or_default()
    }

    fn offset(&self) -> i64 {
        PageQuery { page: self.page }.offset()
    }
}

pub async fn list_items(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<Page<ItemResponse>>, AppError> {
    let scope = Scope::for_caller(&user.id, user.is_staff);
    let (items, count) = item_repo::list_items(
        &pool,
        &scope,
        &query.filters(),
        query.ordering(),
        PAGE_SIZE,
        query.offset(),
    )
    .await?;

    let results = items.into_iter().map(ItemResponse::from).collect();
    Ok(Json(Page::new(count, results)))
}

pub async fn create_item(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    payload.validate()?;

    // Ownership is always the authenticated caller; the payload carries no
    // owner field and any unknown fields are dropped by serde.
    let item = InventoryItem::new(
        user.id.clone(),
        payload.name,
        payload.description,
        payload.quantity,
        payload.price,
        payload.category,
    );
    item_repo::insert_item(&pool, &item).await?;

    tracing::debug!(item_id = %item.id, owner = %user.id, "inventory item created");
    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn get_item(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Path(item_id): Path<String>,
) -> Result<Json<ItemResponse>, AppError> {
    let scope = Scope::for_caller(&user.id, user.is_staff);
    let item = item_repo::fetch_visible_item(&pool, &item_id, &scope)
        .await?
        .ok_or_else(item_not_found)?;
    Ok(Json(item.into()))
}

pub async fn update_item(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    payload.validate()?;

    let scope = Scope::for_caller(&user.id, user.is_staff);
    let patch = ItemPatch {
        name: payload.name,
        description: payload.description,
        quantity: payload.quantity,
        price: payload.price,
        category: payload.category,
    };
    let reason = payload.reason.unwrap_or_default();

    let item = item_repo::update_item(&pool, &item_id, &scope, &user.id, &patch, &reason)
        .await?
        .ok_or_else(item_not_found)?;
    Ok(Json(item.into()))
}

pub async fn delete_item(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Path(item_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let scope = Scope::for_caller(&user.id, user.is_staff);
    let deleted = item_repo::delete_item(&pool, &item_id, &scope).await?;
    if !deleted {
        return Err(item_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn levels(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<Vec<StockLevel>>, AppError> {
    let scope = Scope::for_caller(&user.id, user.is_staff);
    let levels =
        item_repo::list_levels(&pool, &scope, &query.filters(), query.ordering()).await?;
    Ok(Json(levels))
}

pub async fn history(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Path(item_id): Path<String>,
) -> Result<Json<Vec<ChangeLogEntry>>, AppError> {
    let scope = Scope::for_caller(&user.id, user.is_staff);
    // Visibility check first, so foreign items 404 instead of leaking an
    // empty history.
    item_repo::fetch_visible_item(&pool, &item_id, &scope)
        .await?
        .ok_or_else(item_not_found)?;

    let entries = change_log::list_item_history(&pool, &item_id).await?;
    Ok(Json(entries))
}

pub async fn adjust_quantity(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Path(item_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let delta = parse_delta(&payload)?;
    let reason = payload
        .get("reason")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let scope = Scope::for_caller(&user.id, user.is_staff);
    let item = item_repo::adjust_quantity(&pool, &item_id, &scope, &user.id, delta, reason)
        .await?
        .ok_or_else(item_not_found)?;

    Ok(Json(json!({ "id": item.id, "quantity": item.quantity })))
}

/// Extracts the signed delta from the request body. Accepts an integer or a
/// string holding one; anything else is a validation failure.
fn parse_delta(payload: &Value) -> Result<i64, AppError> {
    let raw = payload
        .get("delta")
        .ok_or_else(|| AppError::Validation(vec!["delta: must be an integer".to_string()]))?;

    let delta = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    delta.ok_or_else(|| AppError::Validation(vec!["delta: must be an integer".to_string()]))
}

fn item_not_found() -> AppError {
    AppError::NotFound("Item not found".to_string())
}
