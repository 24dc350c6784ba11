//! Shared page/pageSize handling for every list route.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 200;
const MAX_PAGE: i64 = 1_000_000;

/// Raw pagination query parameters. Kept as strings so malformed values fall
/// back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// A resolved, clamped page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
}

/// Standard list envelope: `{ "data": [...], "meta": {...} }`.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = page.clamp(1, MAX_PAGE);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        Self {
            page,
            page_size,
            offset: (page - 1) * page_size,
        }
    }

    pub fn from_query(query: &PageQuery) -> Self {
        Self::new(
            lenient_int(query.page.as_deref()).unwrap_or(1),
            lenient_int(query.page_size.as_deref()).unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    /// Meta for a page of `returned` rows out of `total`.
    pub fn meta(&self, total: i64, returned: usize) -> PageMeta {
        let total = total.max(0);
        PageMeta {
            page: self.page,
            page_size: self.page_size,
            total,
            total_pages: ((total + self.page_size - 1) / self.page_size).max(1),
            has_next: self.offset + (returned as i64) < total,
        }
    }

    /// Wraps rows fetched with `LIMIT page_size OFFSET offset`.
    pub fn wrap<T>(&self, data: Vec<T>, total: i64) -> Paged<T> {
        let meta = self.meta(total, data.len());
        Paged { data, meta }
    }

    /// Slices an in-memory list (already fully materialized) to this page.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Paged<T> {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(items.len());
        let end = start
            .saturating_add(self.page_size as usize)
            .min(items.len());
        self.wrap(items[start..end].to_vec(), items.len() as i64)
    }
}

/// Parses a query value as a number, flooring fractions. `None` for missing,
/// blank, non-numeric or non-finite input.
pub fn lenient_int(raw: Option<&str>) -> Option<i64> {
    let value: f64 = raw?.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.floor().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let p = Pagination::from_query(&PageQuery::default());
        assert_eq!(p, Pagination { page: 1, page_size: 20, offset: 0 });
    }

    #[test]
    fn test_offset_arithmetic() {
        let p = Pagination::from_query(&query(Some("3"), Some("25")));
        assert_eq!(p.offset, 50);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let p = Pagination::from_query(&query(Some("0"), Some("1000")));
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, MAX_PAGE_SIZE);

        let p = Pagination::from_query(&query(Some("-4"), Some("0")));
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 1);
    }

    #[test]
    fn test_garbage_falls_back_to_defaults() {
        let p = Pagination::from_query(&query(Some("abc"), Some("NaN")));
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_fractions_are_floored() {
        assert_eq!(lenient_int(Some("2.9")), Some(2));
        assert_eq!(lenient_int(Some(" 7 ")), Some(7));
        assert_eq!(lenient_int(Some("")), None);
        assert_eq!(lenient_int(Some("inf")), None);
        assert_eq!(lenient_int(None), None);
    }

    #[test]
    fn test_meta() {
        let p = Pagination::new(2, 10);
        let meta = p.meta(25, 10);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);

        let last = Pagination::new(3, 10).meta(25, 5);
        assert!(!last.has_next);

        let empty = Pagination::new(1, 10).meta(0, 0);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_slice_in_memory() {
        let items: Vec<i32> = (1..=45).collect();
        let page = Pagination::new(3, 20).slice(&items);
        assert_eq!(page.data, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.meta.total, 45);
        assert!(!page.meta.has_next);

        let beyond = Pagination::new(10, 20).slice(&items);
        assert!(beyond.data.is_empty());
        assert_eq!(beyond.meta.total, 45);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let value = serde_json::to_value(Pagination::new(1, 20).meta(3, 3)).unwrap();
        assert_eq!(value["pageSize"], 20);
        assert_eq!(value["totalPages"], 1);
        assert_eq!(value["hasNext"], false);
    }
}
