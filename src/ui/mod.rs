//! Terminal presentation: list pages, tables and notices.

pub mod notice;
pub mod page;
pub mod table;

pub use notice::{Level, Notice};
pub use page::{ListPage, Message};
pub use table::{render_pagination, render_table, TableRow};
