//! Page/limit parsing and pagination metadata for list endpoints.

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Raw `page` / `limit` query parameters.
///
/// Kept as strings so that garbage values fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl PageParams {
    /// 1-based page number. Non-positive or unparsable values give 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE)
    }

    /// Page size, capped at 100. Non-positive or unparsable values give 10.
    #[must_use]
    pub fn limit(&self) -> u32 {
        parse_positive(self.limit.as_deref()).map_or(DEFAULT_LIMIT, |l| l.min(MAX_LIMIT))
    }

    /// Row offset for the requested page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page()) - 1) * i64::from(self.limit())
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

/// Pagination metadata returned next to a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    /// Build metadata for `total` rows split into pages of `page_size`.
    #[must_use]
    pub fn new(total: i64, page: u32, page_size: u32) -> Self {
        let size = i64::from(page_size.max(1));
        let total_pages = (total.max(0) + size - 1) / size;

        Self {
            total,
            page,
            page_size,
            total_pages,
            has_previous: page > 1,
            has_next: i64::from(page) < total_pages,
        }
    }

    /// Metadata for the page described by `params`.
    #[must_use]
    pub fn for_params(total: i64, params: &PageParams) -> Self {
        Self::new(total, params.page(), params.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: &str, limit: &str) -> PageParams {
        PageParams {
            page: Some(page.to_owned()),
            limit: Some(limit.to_owned()),
        }
    }

    #[test]
    fn test_defaults() {
        let p = PageParams::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_garbage_falls_back() {
        let p = params("-2", "abc");
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);

        let p = params("0", "0");
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_limit_capped() {
        assert_eq!(params("1", "1000").limit(), 100);
    }

    #[test]
    fn test_offset() {
        assert_eq!(params("3", "20").offset(), 40);
    }

    #[test]
    fn test_pagination_metadata() {
        let meta = Pagination::new(25, 2, 10);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_previous);
        assert!(meta.has_next);

        let last = Pagination::new(25, 3, 10);
        assert!(!last.has_next);

        let empty = Pagination::new(0, 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_previous);
        assert!(!empty.has_next);
    }
}
