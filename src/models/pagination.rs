//! Pagination primitives for list endpoints.

use serde::{Deserialize, Serialize};

/// Pagination query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Maximum items per page.
    const MAX_LIMIT: i64 = 100;

    /// Default items per page.
    const DEFAULT_LIMIT: i64 = 10;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        let skipped = (self.current_page() - 1).saturating_mul(self.limit());
        u64::try_from(skipped).unwrap_or(0)
    }

    pub fn current_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Paged result envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl<T: Serialize> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        let limit = pagination.limit();
        let pages = (total + limit - 1) / limit;
        Self {
            items,
            total,
            page: pagination.current_page(),
            limit,
            pages,
        }
    }

    /// Convert the items while keeping the paging metadata.
    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn pagination_clamps_limit() {
        let p = Pagination {
            page: Some(1),
            limit: Some(500),
        };
        assert_eq!(p.limit(), 100);

        let p = Pagination {
            page: Some(1),
            limit: Some(0),
        };
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn pagination_clamps_page() {
        let p = Pagination {
            page: Some(-4),
            limit: Some(10),
        };
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn pagination_offset_calculation() {
        let p = Pagination {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn paged_result_pages() {
        let p = Pagination {
            page: Some(1),
            limit: Some(10),
        };
        let result = PagedResult::new(vec![1, 2, 3], 25, &p);
        assert_eq!(result.pages, 3);
        assert_eq!(result.total, 25);
        assert_eq!(result.page, 1);
        assert_eq!(result.limit, 10);
    }

    #[test]
    fn paged_result_empty_collection() {
        let result = PagedResult::<i32>::new(vec![], 0, &Pagination::default());
        assert_eq!(result.pages, 0);
    }

    #[test]
    fn page_beyond_last_keeps_total() {
        let p = Pagination {
            page: Some(9),
            limit: Some(10),
        };
        let result = PagedResult::<i32>::new(vec![], 25, &p);
        assert!(result.items.is_empty());
        assert_eq!(result.total, 25);
        assert_eq!(result.page, 9);
        assert_eq!(result.pages, 3);
    }

    #[test]
    fn map_preserves_metadata() {
        let result = PagedResult::new(vec![1, 2], 12, &Pagination::default()).map(|n| n * 10);
        assert_eq!(result.items, vec![10, 20]);
        assert_eq!(result.total, 12);
        assert_eq!(result.pages, 2);
    }
}
