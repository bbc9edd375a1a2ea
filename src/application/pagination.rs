//! Offset pagination helpers for 1-indexed page requests.

use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// A normalized page request. `page` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Normalize raw query values: absent or non-positive values fall back to
    /// the defaults and `per_page` is capped at [`MAX_PER_PAGE`].
    pub fn from_query(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = match page {
            Some(value) if value >= 1 => u32::try_from(value).unwrap_or(u32::MAX),
            _ => DEFAULT_PAGE,
        };
        let per_page = match per_page {
            Some(value) if value >= 1 => value.min(i64::from(MAX_PER_PAGE)) as u32,
            _ => DEFAULT_PER_PAGE,
        };
        Self { page, per_page }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

/// One page of results plus the totals needed to render pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u32,
}

impl<T> OffsetPage<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            pages: total_pages(total, request.per_page),
            current_page: request.page,
        }
    }
}

/// `ceil(total / per_page)`; zero when there are no rows.
pub fn total_pages(total: u64, per_page: u32) -> u64 {
    let per_page = u64::from(per_page.max(1));
    total.div_ceil(per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_values() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest::default());
    }

    #[test]
    fn non_positive_values_fall_back_to_defaults() {
        let request = PageRequest::from_query(Some(0), Some(-5));
        assert_eq!(request.page, DEFAULT_PAGE);
        assert_eq!(request.per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn per_page_is_capped() {
        let request = PageRequest::from_query(Some(2), Some(10_000));
        assert_eq!(request.per_page, MAX_PER_PAGE);
        assert_eq!(request.offset(), u64::from(MAX_PER_PAGE));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(3, 1), 3);
    }

    #[test]
    fn page_past_the_end_keeps_totals() {
        let request = PageRequest::from_query(Some(9), Some(10));
        let page: OffsetPage<u8> = OffsetPage::new(Vec::new(), 25, request);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert_eq!(page.current_page, 9);
    }
}
