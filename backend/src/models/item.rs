//! Models for inventory items and their request/response payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::rules;

/// Database representation of an inventory item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: String,
    /// Owner of the item. Always the creating user; clients cannot set it.
    pub user_id: String,
    pub name: String,
    pub description: String,
    /// Stock on hand. Never negative.
    pub quantity: i64,
    /// Unit price, NUMERIC(10,2). Always positive.
    pub price: Decimal,
    pub category: String,
    pub date_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(
        user_id: String,
        name: String,
        description: String,
        quantity: i64,
        price: Decimal,
        category: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            name,
            description,
            quantity,
            price,
            category,
            date_added: now,
            last_updated: now,
        }
    }
}

/// Applies a signed delta to a quantity, floored at zero. A decrement past
/// zero clamps to zero rather than wrapping negative.
pub fn adjusted_quantity(before: i64, delta: i64) -> i64 {
    before.saturating_add(delta).max(0)
}

/// Payload for creating an item. Any client-supplied owner field is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i64,
    #[validate(custom(function = "rules::validate_price"))]
    pub price: Decimal,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub category: String,
}

/// Payload for a partial or full update. Absent fields are left unchanged.
/// `reason` is carried into the change log when the quantity changes.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i64>,
    #[validate(custom(function = "rules::validate_price"))]
    pub price: Option<Decimal>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub reason: Option<String>,
}

/// API representation of an item.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: String,
    /// Owner's user id (read-only).
    pub user: String,
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub price: Decimal,
    pub category: String,
    pub date_added: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<InventoryItem> for ItemResponse {
    fn from(item: InventoryItem) -> Self {
        ItemResponse {
            id: item.id,
            user: item.user_id,
            name: item.name,
            description: item.description,
            quantity: item.quantity,
            price: item.price,
            category: item.category,
            date_added: item.date_added,
            last_updated: item.last_updated,
        }
    }
}

/// Lightweight stock-level projection row.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct StockLevel {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn adjusted_quantity_applies_positive_delta() {
        assert_eq!(adjusted_quantity(10, 5), 15);
        assert_eq!(adjusted_quantity(0, 3), 3);
    }

    #[test]
    fn adjusted_quantity_applies_negative_delta() {
        assert_eq!(adjusted_quantity(10, -4), 6);
    }

    #[test]
    fn adjusted_quantity_floors_at_zero() {
        assert_eq!(adjusted_quantity(3, -10), 0);
        assert_eq!(adjusted_quantity(0, -1), 0);
        assert_eq!(adjusted_quantity(0, i64::MIN), 0);
    }

    #[test]
    fn adjusted_quantity_zero_delta_is_noop() {
        assert_eq!(adjusted_quantity(7, 0), 7);
    }

    #[test]
    fn create_request_rejects_negative_quantity() {
        let request = CreateItemRequest {
            name: "Widget".into(),
            description: String::new(),
            quantity: -1,
            price: Decimal::new(999, 2),
            category: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_request_rejects_non_positive_price() {
        let request = CreateItemRequest {
            name: "Widget".into(),
            description: String::new(),
            quantity: 1,
            price: Decimal::ZERO,
            category: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_request_accepts_valid_payload() {
        let request = CreateItemRequest {
            name: "Widget".into(),
            description: "A widget".into(),
            quantity: 4,
            price: Decimal::new(1250, 2),
            category: "tools".into(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn update_request_validates_only_present_fields() {
        let request = UpdateItemRequest {
            description: Some("changed".into()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        let request = UpdateItemRequest {
            quantity: Some(-5),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateItemRequest {
            price: Some(Decimal::new(-100, 2)),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn item_response_exposes_owner_as_user() {
        let item = InventoryItem::new(
            "owner-1".into(),
            "Widget".into(),
            String::new(),
            2,
            Decimal::new(500, 2),
            "tools".into(),
        );
        let response: ItemResponse = item.into();
        assert_eq!(response.user, "owner-1");
    }
}
