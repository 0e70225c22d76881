//! Offset pagination.

use serde::Serialize;

/// Resolved position of one page inside a listing of `total` items.
///
/// `total_pages` is never 0: an empty listing still has one (empty) page,
/// and the requested page is clamped into `[1, total_pages]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Current page, 1-based.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Total number of items.
    pub total: u64,
    /// Number of pages.
    pub total_pages: u64,
}

impl PageWindow {
    /// Clamp a requested page against the listing size.
    #[must_use]
    pub fn new(requested_page: u64, limit: u64, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit).max(1);
        let page = requested_page.clamp(1, total_pages);

        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    /// Wrap the items of this page.
    pub fn wrap<T>(self, data: Vec<T>) -> Paginated<T> {
        Paginated {
            data,
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// A page of items with its position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Total number of items.
    pub total: u64,
    /// Current page, 1-based.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Number of pages.
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Transform each item, keeping the position.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}
