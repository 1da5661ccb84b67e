//! Execution and data-format errors end the run on the first attempt.

use dbcheck_core::{Comparator, Condition, Value};
use dbcheck_sql::Filter;

use super::{executor, CaseResult};
use crate::{AssertError, AssertOptions, Assertion, Connection};

pub(super) fn run_error_tests<C: Connection, F: Fn() -> C>(factory: &F) -> Vec<CaseResult> {
    vec![
        CaseResult::new(
            "error",
            "missing_column_is_not_retried",
            missing_column_is_not_retried(factory),
        ),
        CaseResult::new(
            "error",
            "missing_table_is_not_retried",
            missing_table_is_not_retried(factory),
        ),
        CaseResult::new(
            "error",
            "unparseable_number_is_not_retried",
            unparseable_number_is_not_retried(factory),
        ),
        CaseResult::new(
            "error",
            "mismatch_retries_until_final_attempt",
            mismatch_retries_until_final_attempt(factory),
        ),
    ]
}

fn retrying() -> AssertOptions {
    AssertOptions::default().retry_times(3).retry_interval_ms(50)
}

/// Run `assertion` with retries enabled and return the error plus the number
/// of waits the executor made.
fn run_retrying<C: Connection, F: Fn() -> C>(
    factory: &F,
    assertion: Assertion,
) -> Result<(AssertError, usize), String> {
    let (exec, clock) = executor();
    match exec.run(&assertion.options(retrying()), &mut factory(), &mut ()) {
        Ok(outcome) => Err(format!("expected an error, got {:?}", outcome.verdict)),
        Err(e) => Ok((e, clock.sleeps().len())),
    }
}

fn cond(column: &str, comparator: Comparator, expected: impl Into<Value>) -> Result<Condition, String> {
    Condition::new(column, comparator, expected.into()).map_err(|e| e.to_string())
}

fn missing_column_is_not_retried<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = Assertion::new("person").verify(cond("salary", Comparator::Equal, 1)?);
    match run_retrying(factory, assertion)? {
        (AssertError::Execution(_), 0) => Ok(()),
        (e, sleeps) => Err(format!("expected an execution error without waits, got {:?} after {} waits", e, sleeps)),
    }
}

fn missing_table_is_not_retried<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = Assertion::new("no_such_table").verify(cond("name", Comparator::Equal, "x")?);
    match run_retrying(factory, assertion)? {
        (AssertError::Execution(_), 0) => Ok(()),
        (e, sleeps) => Err(format!("expected an execution error without waits, got {:?} after {} waits", e, sleeps)),
    }
}

fn unparseable_number_is_not_retried<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 1))
        .verify(cond("age", Comparator::GreaterThan, "abc")?);
    match run_retrying(factory, assertion)? {
        (AssertError::DataFormat { .. }, 0) => Ok(()),
        (e, sleeps) => Err(format!("expected a data-format error without waits, got {:?} after {} waits", e, sleeps)),
    }
}

fn mismatch_retries_until_final_attempt<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 1))
        .verify(cond("name", Comparator::Equal, "bob")?);
    match run_retrying(factory, assertion)? {
        (AssertError::Mismatch { .. }, 3) => Ok(()),
        (e, sleeps) => Err(format!("expected a mismatch after 3 waits, got {:?} after {} waits", e, sleeps)),
    }
}
