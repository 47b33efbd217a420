//! Data models shared across database access and API handlers.

use serde::{Deserialize, Serialize};

pub mod change_log;
pub mod item;
pub mod user;

/// Fixed page size for list endpoints.
pub const PAGE_SIZE: i64 = 10;

/// Query parameter for paginated endpoints (1-based page number).
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
}

impl PageQuery {
    /// Returns the requested page, floored at 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Returns the row offset for the requested page. Saturates instead of
    /// overflowing on absurdly large page numbers.
    pub fn offset(&self) -> i64 {
        self.page().saturating_sub(1).saturating_mul(PAGE_SIZE)
    }
}

/// Envelope for paginated API responses.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    /// Total number of records matching the query.
    pub count: i64,
    /// The records for the current page.
    pub results: Vec<T>,
}

impl<T: Serialize> Page<T> {
    pub fn new(count: i64, results: Vec<T>) -> Self {
        Self { count, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults_to_first_page() {
        let query = PageQuery { page: None };
        assert_eq!(query.page(), 1);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn page_query_floors_at_one() {
        let query = PageQuery { page: Some(-3) };
        assert_eq!(query.page(), 1);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn page_query_offset_uses_fixed_page_size() {
        let query = PageQuery { page: Some(2) };
        assert_eq!(query.offset(), 10);
    }

    #[test]
    fn page_query_offset_saturates_on_huge_pages() {
        let query = PageQuery { page: Some(i64::MAX) };
        assert_eq!(query.offset(), i64::MAX);
    }

    #[test]
    fn page_envelope_serializes_count_and_results() {
        let page = Page::new(12, vec!["a", "b"]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["count"], 12);
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
    }
}
