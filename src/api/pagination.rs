//! Pagination normalization for list endpoints.
//!
//! Raw query input degrades gracefully to the nearest valid bound; nothing
//! here ever fails.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw page/pageSize query parameters as sent by clients
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Bounded pagination parameters plus the offset/limit pair for the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub skip: i64,
    pub take: i64,
}

impl Pagination {
    /// Normalize raw query input: page defaults to 1 and is clamped to a
    /// minimum of 1; pageSize defaults to 20 and is clamped to [1, 100].
    pub fn from_query(query: &PageQuery) -> Self {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, page_size, skip: (page - 1) * page_size, take: page_size }
    }
}

/// Result-set metadata returned beside every paginated list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl PageMeta {
    /// `total_pages` is ceil(total / page_size), floored at 1 so an empty
    /// result set reports one empty page rather than zero pages.
    pub fn build(total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = ((total + page_size - 1) / page_size).max(1);
        Self { total, page, page_size, total_pages }
    }
}

/// Standard `{ items, meta }` envelope for list endpoints
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self { items, meta: PageMeta::build(total, pagination.page, pagination.page_size) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_query_is_empty() {
        let p = Pagination::from_query(&PageQuery::default());
        assert_eq!(p, Pagination { page: 1, page_size: 20, skip: 0, take: 20 });
    }

    #[test]
    fn clamps_out_of_range_values() {
        let p = Pagination::from_query(&PageQuery { page: Some(0), page_size: Some(500) });
        assert_eq!(p, Pagination { page: 1, page_size: 100, skip: 0, take: 100 });

        let p = Pagination::from_query(&PageQuery { page: Some(-3), page_size: Some(0) });
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 1);
    }

    #[test]
    fn computes_skip_from_page() {
        let p = Pagination::from_query(&PageQuery { page: Some(3), page_size: Some(10) });
        assert_eq!(p, Pagination { page: 3, page_size: 10, skip: 20, take: 10 });
    }

    #[test]
    fn empty_result_set_still_has_one_page() {
        let meta = PageMeta::build(0, 1, 20);
        assert_eq!(meta, PageMeta { total: 0, page: 1, page_size: 20, total_pages: 1 });
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PageMeta::build(101, 1, 20).total_pages, 6);
        assert_eq!(PageMeta::build(100, 1, 20).total_pages, 5);
        assert_eq!(PageMeta::build(1, 1, 20).total_pages, 1);
    }
}
