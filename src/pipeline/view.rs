//! A list page: control state, one in-flight fetch at a time as far as the
//! cache is concerned, and a client-side refinement over the loaded rows.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::fetcher::{FetchState, ResultCache};
use super::pagination::{total_pages_for, Pagination, PaginationController};
use super::query::{DateRange, ListQuery};
use super::refine::{refine, Refinable, Refinement};
use super::source::ListSource;

/// A user action on a list page.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Search(String),
    Filter { name: String, value: String },
    SortBy(String),
    SetSortKey(String),
    ToggleSortOrder,
    Page(u32),
    NextPage,
    PreviousPage,
    PageSize(u32),
    DateRange(DateRange),
    Refresh,
    Clear,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub query: ListQuery,
    pub state: FetchState,
    /// Loaded rows after the client-side refinement.
    pub rows: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Snapshot<T> {
    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }
}

struct Inner<T> {
    query: ListQuery,
    cache: ResultCache<T>,
    refinement: Refinement,
}

pub struct ListView<T> {
    name: &'static str,
    source: Arc<dyn ListSource<T>>,
    initial: ListQuery,
    inner: Mutex<Inner<T>>,
}

impl<T> ListView<T>
where
    T: Refinable + Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, source: Arc<dyn ListSource<T>>, initial: ListQuery) -> Self {
        let inner = Inner {
            query: initial.clone(),
            cache: ResultCache::new(initial.page_size()),
            refinement: Refinement::default(),
        };
        Self { name, source, initial, inner: Mutex::new(inner) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies a control change and reloads if it changed the query.
    pub async fn apply(&self, control: Control) -> Snapshot<T> {
        let changed = {
            let mut inner = self.inner.lock().await;
            let total_pages = inner.cache.pagination().total_pages;
            let query = &mut inner.query;
            match control {
                Control::Search(term) => query.set_search(term),
                Control::Filter { name, value } => query.set_filter(name, value),
                Control::SortBy(key) => {
                    query.sort_by(key);
                    true
                }
                Control::SetSortKey(key) => query.set_sort_key(key),
                Control::ToggleSortOrder => {
                    query.toggle_sort_order();
                    true
                }
                Control::Page(page) => PaginationController::go_to(query, page, total_pages),
                Control::NextPage => PaginationController::next(query, total_pages),
                Control::PreviousPage => PaginationController::previous(query, total_pages),
                Control::PageSize(size) => PaginationController::change_page_size(query, size),
                Control::DateRange(range) => query.set_date_range(range),
                Control::Refresh => true,
                Control::Clear => {
                    query.clear(&self.initial);
                    true
                }
            }
        };
        if changed {
            self.load().await
        } else {
            self.snapshot().await
        }
    }

    /// Fetches the current query. A response that arrives after a newer
    /// request was issued is dropped.
    pub async fn load(&self) -> Snapshot<T> {
        let (ticket, query) = {
            let mut inner = self.inner.lock().await;
            (inner.cache.begin(), inner.query.clone())
        };
        debug!(view = self.name, generation = ticket.generation(), "loading");

        let outcome = self.source.fetch(&query).await;

        let mut inner = self.inner.lock().await;
        if inner.cache.complete(ticket, outcome) {
            match inner.cache.state() {
                FetchState::Failed { message, .. } => {
                    info!(view = self.name, error = %message, "load failed")
                }
                _ => debug!(
                    view = self.name,
                    rows = inner.cache.rows().len(),
                    total = inner.cache.pagination().total_records,
                    "loaded"
                ),
            }
        }
        Self::render(&inner)
    }

    pub async fn snapshot(&self) -> Snapshot<T> {
        Self::render(&*self.inner.lock().await)
    }

    pub async fn query(&self) -> ListQuery {
        self.inner.lock().await.query.clone()
    }

    /// Narrows or reorders the loaded page without a request.
    pub async fn refine(&self, refinement: Refinement) -> Snapshot<T> {
        let mut inner = self.inner.lock().await;
        inner.refinement = refinement;
        Self::render(&inner)
    }

    /// Shows a row created elsewhere at the top of the page.
    pub async fn mirror_insert(&self, row: T) {
        let mut inner = self.inner.lock().await;
        inner.cache.rows_mut().insert(0, row);
        Self::adjust_total(&mut inner, 1);
    }

    /// Replaces the first row matching `pred`. Returns whether one matched.
    pub async fn mirror_update<F>(&self, pred: F, row: T) -> bool
    where
        F: Fn(&T) -> bool + Send,
    {
        let mut inner = self.inner.lock().await;
        match inner.cache.rows_mut().iter_mut().find(|r| pred(r)) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }

    /// Drops every row matching `pred`. Returns how many were removed.
    pub async fn mirror_remove<F>(&self, pred: F) -> usize
    where
        F: Fn(&T) -> bool + Send,
    {
        let mut inner = self.inner.lock().await;
        let rows = inner.cache.rows_mut();
        let before = rows.len();
        rows.retain(|r| !pred(r));
        let removed = before - rows.len();
        Self::adjust_total(&mut inner, -(removed as i64));
        removed
    }

    fn adjust_total(inner: &mut Inner<T>, delta: i64) {
        let pagination = inner.cache.pagination_mut();
        let total = (i64::from(pagination.total_records) + delta).max(0) as u32;
        pagination.total_records = total;
        if pagination.items_per_page > 0 {
            pagination.total_pages = total_pages_for(total, pagination.items_per_page);
        }
    }

    fn render(inner: &Inner<T>) -> Snapshot<T> {
        let rows = if inner.refinement.is_identity() {
            inner.cache.rows().to_vec()
        } else {
            refine(inner.cache.rows(), &inner.refinement)
        };
        Snapshot {
            query: inner.query.clone(),
            state: inner.cache.state().clone(),
            rows,
            pagination: *inner.cache.pagination(),
        }
    }
}
