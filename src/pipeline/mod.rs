//! The generic list-view pipeline shared by every list-bearing page:
//! control state, query parameters, remote fetch, result cache, client-side
//! refinement.

pub mod fetcher;
pub mod pagination;
pub mod query;
pub mod refine;
pub mod source;
pub mod view;

pub use fetcher::{FetchState, ResultCache, Ticket};
pub use pagination::{paginate_local, Pagination, PaginationController, PAGE_SIZE_OPTIONS};
pub use query::{DateRange, ListQuery, SortOrder, SortSpec, DEFAULT_PAGE_SIZE};
pub use refine::{refine, FieldMatch, Refinable, Refinement, SortValue};
pub use source::{ListSource, Paging, RemoteList, StaticList};
pub use view::{Control, ListView, Snapshot};
