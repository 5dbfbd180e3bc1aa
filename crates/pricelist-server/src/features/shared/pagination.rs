//! Shared pagination types
//!
//! ```rust,ignore
//! use pricelist_server::features::shared::pagination::{Paginated, PaginationMetadata};
//!
//! let page = Paginated::new(items, PaginationMetadata::new(2, 10, total));
//! ```

use serde::{Deserialize, Serialize};

/// Pagination metadata for response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    /// Current page number (1-indexed)
    pub page: i64,
    pub per_page: i64,
    /// Total number of matching items
    pub total: i64,
    /// Total number of pages
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMetadata {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total == 0 || per_page <= 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }
}

/// One page of items plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMetadata,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, pagination: PaginationMetadata) -> Self {
        Self { items, pagination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_metadata() {
        let meta = PaginationMetadata::new(2, 10, 25);
        assert_eq!(meta.pages, 3);
        assert!(meta.has_prev);
        assert!(meta.has_next);
    }

    #[test]
    fn test_pagination_metadata_empty() {
        let meta = PaginationMetadata::new(1, 10, 0);
        assert_eq!(meta.pages, 0);
        assert!(!meta.has_prev);
        assert!(!meta.has_next);
    }

    #[test]
    fn test_pagination_metadata_last_page() {
        let meta = PaginationMetadata::new(3, 10, 30);
        assert_eq!(meta.pages, 3);
        assert!(meta.has_prev);
        assert!(!meta.has_next);
    }

    #[test]
    fn test_page_past_the_end() {
        let meta = PaginationMetadata::new(9, 10, 25);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }
}
