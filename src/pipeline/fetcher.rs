//! Remote fetch state and the page-local result cache.

use tracing::debug;

use super::pagination::Pagination;
use crate::error::{PrmsError, Result};

/// Lifecycle of a list page's data.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Loaded,
    Failed {
        message: String,
        /// True for connectivity problems, false for backend-reported failures.
        transport: bool,
    },
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Identifies one issued request. Only the most recently issued ticket may
/// change the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Last successful page plus the state of the request in flight.
#[derive(Debug, Clone)]
pub struct ResultCache<T> {
    state: FetchState,
    rows: Vec<T>,
    pagination: Pagination,
    issued: u64,
}

impl<T> ResultCache<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: FetchState::Idle,
            rows: Vec::new(),
            pagination: Pagination::empty(page_size),
            issued: 0,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Starts a request. Rows stay visible while loading.
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        self.state = FetchState::Loading;
        Ticket(self.issued)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Applies the outcome of `ticket`. Returns false, leaving everything
    /// untouched, if a newer request has been issued since.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<(Vec<T>, Pagination)>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                generation = ticket.0,
                latest = self.issued,
                "discarding stale response"
            );
            return false;
        }
        match outcome {
            Ok((rows, pagination)) => {
                self.rows = rows;
                self.pagination = pagination;
                self.state = FetchState::Loaded;
            }
            Err(err) => self.fail(&err),
        }
        true
    }

    fn fail(&mut self, err: &PrmsError) {
        self.rows.clear();
        self.pagination = Pagination::empty(self.pagination.items_per_page);
        self.state = FetchState::Failed { message: err.user_message(), transport: err.is_transport() };
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<T> {
        &mut self.rows
    }

    pub(crate) fn pagination_mut(&mut self) -> &mut Pagination {
        &mut self.pagination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SERVER_ERROR_MESSAGE;

    fn page(rows: Vec<u32>) -> Result<(Vec<u32>, Pagination)> {
        let total = rows.len() as u32;
        Ok((
            rows,
            Pagination { current_page: 1, total_pages: 1, total_records: total, items_per_page: 25 },
        ))
    }

    #[test]
    fn latest_request_wins() {
        let mut cache = ResultCache::new(25);
        let first = cache.begin();
        let second = cache.begin();
        assert!(cache.complete(second, page(vec![2])));
        assert!(!cache.complete(first, page(vec![1])));
        assert_eq!(cache.rows(), &[2]);
        assert_eq!(cache.state(), &FetchState::Loaded);
    }

    #[test]
    fn stale_completion_does_not_clear_loading() {
        let mut cache = ResultCache::<u32>::new(25);
        let first = cache.begin();
        let _second = cache.begin();
        cache.complete(first, page(vec![1]));
        assert!(cache.state().is_loading());
    }

    #[test]
    fn backend_failure_clears_rows() {
        let mut cache = ResultCache::new(25);
        let t = cache.begin();
        cache.complete(t, page(vec![1, 2, 3]));
        let t = cache.begin();
        cache.complete(t, Err(PrmsError::Backend("DB unreachable".into())));
        assert!(cache.rows().is_empty());
        assert_eq!(cache.pagination().total_records, 0);
        assert_eq!(
            cache.state(),
            &FetchState::Failed { message: "DB unreachable".into(), transport: false }
        );
    }

    #[test]
    fn transport_failure_uses_generic_message() {
        let mut cache = ResultCache::<u32>::new(25);
        let t = cache.begin();
        cache.complete(t, Err(PrmsError::Transport("connection refused".into())));
        assert_eq!(cache.state().error(), Some(SERVER_ERROR_MESSAGE));
    }
}
