//! Pagination controller and pagination metadata.

use serde::{Deserialize, Serialize};

use super::query::ListQuery;
use crate::models::lenient;

/// Page-size choices offered by every list page.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 25, 50, 100];

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "first_page", deserialize_with = "lenient::u32")]
    pub current_page: u32,
    #[serde(deserialize_with = "lenient::u32")]
    pub total_pages: u32,
    #[serde(deserialize_with = "lenient::u32")]
    pub total_records: u32,
    #[serde(default, deserialize_with = "lenient::u32")]
    pub items_per_page: u32,
}

fn first_page() -> u32 {
    1
}

/// `ceil(total_records / items_per_page)`; zero records means zero pages.
pub fn total_pages_for(total_records: u32, items_per_page: u32) -> u32 {
    if items_per_page == 0 {
        return 0;
    }
    total_records.div_ceil(items_per_page)
}

impl Pagination {
    pub fn empty(items_per_page: u32) -> Self {
        Self { current_page: 1, total_pages: 0, total_records: 0, items_per_page }
    }

    /// Whether the backend's numbers agree with each other.
    pub fn is_consistent(&self) -> bool {
        self.items_per_page == 0
            || self.total_pages == total_pages_for(self.total_records, self.items_per_page)
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// 1-based index range of the rows shown, for "Showing 26-50 of 53".
    pub fn shown_range(&self, rows_on_page: usize) -> Option<(u32, u32)> {
        if rows_on_page == 0 {
            return None;
        }
        let start = self.current_page.saturating_sub(1) * self.items_per_page + 1;
        Some((start, start + rows_on_page as u32 - 1))
    }
}

/// Slices an unpaginated list the way the backend would have.
pub fn paginate_local<T: Clone>(rows: &[T], page: u32, items_per_page: u32) -> (Vec<T>, Pagination) {
    let items_per_page = items_per_page.max(1);
    let total_records = rows.len() as u32;
    let total_pages = total_pages_for(total_records, items_per_page);
    let current_page = page.clamp(1, total_pages.max(1));
    let start = ((current_page - 1) * items_per_page) as usize;
    let end = (start + items_per_page as usize).min(rows.len());
    let slice = rows.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
    (
        slice,
        Pagination { current_page, total_pages, total_records, items_per_page },
    )
}

/// Applies page navigation to a query.
#[derive(Debug, Default, Clone, Copy)]
pub struct PaginationController;

impl PaginationController {
    /// Moves to `page`, clamped into `[1, total_pages]`. Returns whether the
    /// page actually changed.
    pub fn go_to(query: &mut ListQuery, page: u32, total_pages: u32) -> bool {
        let target = page.clamp(1, total_pages.max(1));
        if target == query.page {
            return false;
        }
        query.page = target;
        true
    }

    pub fn next(query: &mut ListQuery, total_pages: u32) -> bool {
        Self::go_to(query, query.page.saturating_add(1), total_pages)
    }

    pub fn previous(query: &mut ListQuery, total_pages: u32) -> bool {
        Self::go_to(query, query.page.saturating_sub(1), total_pages)
    }

    /// A new page size always starts browsing again from page 1.
    pub fn change_page_size(query: &mut ListQuery, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        if page_size == query.page_size && query.page == 1 {
            return false;
        }
        query.page_size = page_size;
        query.page = 1;
        true
    }
}
