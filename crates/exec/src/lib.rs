//! dbcheck-exec: runs assertions against a live database connection.
//!
//! An [`Assertion`] names a table, its filters and sort order, and the
//! conditions the selected rows must meet. The [`Executor`] renders the SQL
//! once for the connection's product, then polls: it re-runs the queries
//! until every condition holds or the retry budget is spent.
//!
//! Backends plug in through the [`Connection`] trait; [`conformance`] checks
//! a backend against a fixed fixture.

mod assertion;
mod clock;
mod connection;
mod detail;
mod error;
mod executor;
mod options;

pub mod conformance;

pub use assertion::Assertion;
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::{Connection, ResultSet};
pub use detail::{Detail, RecordingSink, ReportSink, Verdict};
pub use error::{AssertError, ConnectionError};
pub use executor::{Executor, Outcome};
pub use options::{AssertOptions, MAX_DELAY_MS, MAX_PAGE_SIZE, MAX_RETRY_INTERVAL_MS};
