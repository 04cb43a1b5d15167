//! Where a list view gets its rows from.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::pagination::{paginate_local, Pagination};
use super::query::ListQuery;
use super::refine::{refine, FieldMatch, Refinable, Refinement};
use crate::api::envelope::{Payload, DATA};
use crate::api::{routes, ApiClient};
use crate::error::Result;
use crate::models::{ActivityLog, AuditLog, Disease, Patient, RhuExportRecord};

#[async_trait]
pub trait ListSource<T>: Send + Sync {
    /// One page of rows for `query`, with pagination metadata.
    async fn fetch(&self, query: &ListQuery) -> Result<(Vec<T>, Pagination)>;
}

/// How much of the query an endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Endpoint pages, sorts and searches itself.
    Server,
    /// Endpoint returns the whole filtered set; `limit` would cap it.
    Local,
}

/// Search and sort of `query` as a client-side refinement, plus its filters
/// as field matches when the rows have not been filtered already.
pub fn local_refinement(query: &ListQuery, with_filters: bool) -> Refinement {
    let matches = if with_filters {
        query.filters().map(|(name, value)| FieldMatch::new(name, value)).collect()
    } else {
        Vec::new()
    };
    Refinement { search: Some(query.search().to_string()), matches, sort: query.sort().cloned() }
}

/// Refines and slices a complete result set the way a paging backend would.
pub fn page_locally<T: Refinable + Clone>(
    rows: &[T],
    query: &ListQuery,
    with_filters: bool,
) -> (Vec<T>, Pagination) {
    let refined = refine(rows, &local_refinement(query, with_filters));
    paginate_local(&refined, query.page(), query.page_size())
}

/// A list endpoint of the PRMS backend.
///
/// If the response carries no pagination block the rows are taken as the
/// whole result set and paged locally.
pub struct RemoteList<T> {
    client: ApiClient,
    route: &'static str,
    payload: Payload,
    paging: Paging,
    _rows: PhantomData<fn() -> T>,
}

impl<T> RemoteList<T> {
    pub fn new(client: ApiClient, route: &'static str, payload: Payload, paging: Paging) -> Self {
        Self { client, route, payload, paging, _rows: PhantomData }
    }

    pub fn route(&self) -> &'static str {
        self.route
    }
}

#[async_trait]
impl<T> ListSource<T> for RemoteList<T>
where
    T: DeserializeOwned + Refinable + Clone + Send + Sync + 'static,
{
    async fn fetch(&self, query: &ListQuery) -> Result<(Vec<T>, Pagination)> {
        debug!(route = self.route, page = query.page(), "fetching list page");
        let params = match self.paging {
            Paging::Server => query.to_params(),
            Paging::Local => query.filter_params(),
        };
        let (rows, pagination) = self
            .client
            .get::<Vec<T>>(self.route, &params, self.payload)
            .await?
            .into_result()?;
        match pagination {
            Some(pagination) => Ok((rows, pagination)),
            None => {
                debug!(route = self.route, rows = rows.len(), "unpaginated response, paging locally");
                // Local endpoints filtered server-side; a paging endpoint that
                // answered unpaginated ignored the filters too.
                Ok(page_locally(&rows, query, self.paging == Paging::Server))
            }
        }
    }
}

/// Rows already in memory, refined and paged like a remote list.
pub struct StaticList<T> {
    rows: Vec<T>,
}

impl<T> StaticList<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl<T> ListSource<T> for StaticList<T>
where
    T: Refinable + Clone + Send + Sync + 'static,
{
    async fn fetch(&self, query: &ListQuery) -> Result<(Vec<T>, Pagination)> {
        Ok(page_locally(&self.rows, query, true))
    }
}

pub fn patients(client: ApiClient) -> RemoteList<Patient> {
    RemoteList::new(client, routes::GET_PATIENTS, DATA, Paging::Server)
}

pub fn diseases(client: ApiClient) -> RemoteList<Disease> {
    RemoteList::new(client, routes::GET_DISEASES, DATA, Paging::Local)
}

pub fn audit_logs(client: ApiClient) -> RemoteList<AuditLog> {
    RemoteList::new(client, routes::GET_AUDIT_LOGS, DATA, Paging::Local)
}

pub fn activity_logs(client: ApiClient) -> RemoteList<ActivityLog> {
    RemoteList::new(client, routes::GET_ACTIVITY_LOGS, DATA, Paging::Local)
}

/// RHU-IS report rows; filters are `disease`, `days` and `barangay`.
pub fn rhu_reports(client: ApiClient) -> RemoteList<RhuExportRecord> {
    RemoteList::new(client, routes::GET_RHU_EXPORT_DATA, DATA, Paging::Local)
}
