//! dbcheck-sql: dialect-aware query construction.
//!
//! [`build`] partitions an assertion's conditions into row-count, aggregate,
//! per-row and list groups and renders two statements with one
//! [`Dialect`]: a detail query over the raw rows and an aggregate query with
//! `count(*)` plus one expression per aggregate.

pub mod builder;
pub mod dialect;
pub mod filter;
pub mod groups;
pub mod registry;

pub use builder::{build, QueryPlan, QueryRequest};
pub use dialect::{Dialect, MySql, Postgres, Sqlite};
pub use filter::{Filter, Order, Paging, Sort, TableRef};
pub use groups::ColumnGroups;
pub use registry::DialectRegistry;
