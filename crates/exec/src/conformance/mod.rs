//! Conformance suite for `Connection` implementations and their dialects.
//!
//! Runs the same assertions against any backend, so a new connection type
//! (or a new dialect for an existing product) can be checked with one call.
//! The suite covers:
//!
//! - **Scenario**: per-row conditions pass, and a mismatch names the column,
//!   the expected and the actual value
//! - **Rows**: row-count conditions
//! - **Aggregate**: count, distinct count, sum, avg, min, max
//! - **List**: whole-column list conditions with sorting
//! - **Filter**: structured and raw filters rendered by the dialect
//! - **Not found**: empty results with and without `fail_if_not_found`
//! - **Error**: execution and data-format errors are never retried
//!
//! # Usage
//!
//! The factory returns a fresh connection whose database holds
//! [`PERSON_FIXTURE`]:
//!
//! ```ignore
//! use dbcheck_exec::conformance::{run_conformance_suite, PERSON_FIXTURE};
//!
//! #[test]
//! fn sqlite_conformance() {
//!     let report = run_conformance_suite(|| {
//!         let conn = SqliteConnection::open_in_memory().unwrap();
//!         conn.execute_batch(PERSON_FIXTURE).unwrap();
//!         conn
//!     });
//!     assert_eq!(report.failed, 0, "{report}");
//! }
//! ```

mod aggregate;
mod errors;
mod filter;
mod list;
mod not_found;
mod rows;
mod scenario;

use std::fmt;
use std::sync::Arc;

use crate::clock::ManualClock;
use crate::executor::Executor;
use crate::Connection;

/// Schema and rows every conformance case runs against.
pub const PERSON_FIXTURE: &str = "\
create table person (id integer primary key, name varchar(32), age integer, nickname varchar(32));
insert into person (id, name, age, nickname) values (1, 'alice', 10, null);
insert into person (id, name, age, nickname) values (2, 'bob', 20, 'bobby');
";

/// One named case and what came of it.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub category: &'static str,
    pub name: &'static str,
    /// `Err` carries what the backend did instead of the expected behaviour.
    pub outcome: Result<(), String>,
}

impl CaseResult {
    fn new(category: &'static str, name: &'static str, outcome: Result<(), String>) -> Self {
        CaseResult {
            category,
            name,
            outcome,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Every case of one suite run, in execution order.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub cases: Vec<CaseResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl ConformanceReport {
    fn from_cases(cases: Vec<CaseResult>) -> Self {
        let total = cases.len();
        let failed = cases.iter().filter(|c| !c.is_pass()).count();
        ConformanceReport {
            cases,
            passed: total - failed,
            failed,
            total,
        }
    }

    /// Failed cases with their failure text.
    pub fn failures(&self) -> impl Iterator<Item = (&CaseResult, &str)> {
        self.cases
            .iter()
            .filter_map(|c| c.outcome.as_ref().err().map(|why| (c, why.as_str())))
    }
}

/// One summary line, then the failures under their category.
impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dbcheck conformance: {} of {} cases passed", self.passed, self.total)?;
        let mut category = "";
        for (case, why) in self.failures() {
            if case.category != category {
                category = case.category;
                write!(f, "\n{}:", category)?;
            }
            write!(f, "\n  {}: {}", case.name, why)?;
        }
        Ok(())
    }
}

/// Run every conformance case. `factory` is called once per case.
pub fn run_conformance_suite<C, F>(factory: F) -> ConformanceReport
where
    C: Connection,
    F: Fn() -> C,
{
    let suites: [fn(&F) -> Vec<CaseResult>; 7] = [
        scenario::run_scenario_tests::<C, F>,
        rows::run_rows_tests::<C, F>,
        aggregate::run_aggregate_tests::<C, F>,
        list::run_list_tests::<C, F>,
        filter::run_filter_tests::<C, F>,
        not_found::run_not_found_tests::<C, F>,
        errors::run_error_tests::<C, F>,
    ];
    ConformanceReport::from_cases(suites.iter().flat_map(|run| run(&factory)).collect())
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Executor on a manual clock, so retry waits cost nothing.
fn executor() -> (Executor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (Executor::new().with_clock(clock.clone()), clock)
}

fn expect_pass<C: Connection>(
    conn: &mut C,
    assertion: &crate::Assertion,
) -> Result<crate::Outcome, String> {
    let (exec, _) = executor();
    exec.run(assertion, conn, &mut ())
        .map_err(|e| format!("expected pass, got error: {}", e))
}

fn expect_err<C: Connection>(
    conn: &mut C,
    assertion: &crate::Assertion,
) -> Result<crate::AssertError, String> {
    let (exec, _) = executor();
    match exec.run(assertion, conn, &mut ()) {
        Ok(outcome) => Err(format!("expected an error, got {:?}", outcome.verdict)),
        Err(e) => Ok(e),
    }
}
