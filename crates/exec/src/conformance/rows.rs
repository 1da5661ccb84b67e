//! Row-count conditions.

use dbcheck_core::{Comparator, Condition, Value};
use dbcheck_sql::Filter;

use super::{expect_err, expect_pass, CaseResult};
use crate::{AssertError, AssertOptions, Assertion, Connection};

pub(super) fn run_rows_tests<C: Connection, F: Fn() -> C>(factory: &F) -> Vec<CaseResult> {
    vec![
        CaseResult::new("rows", "rows_equal_passes", rows_equal_passes(factory)),
        CaseResult::new(
            "rows",
            "rows_equal_mismatch_raises",
            rows_equal_mismatch_raises(factory),
        ),
        CaseResult::new(
            "rows",
            "row_count_respects_filters",
            row_count_respects_filters(factory),
        ),
    ]
}

fn rows(comparator: Comparator, expected: i64) -> Result<Condition, String> {
    Condition::row_count(comparator, Value::from(expected)).map_err(|e| e.to_string())
}

fn rows_equal_passes<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .verify(rows(Comparator::Equal, 2)?)
        .options(AssertOptions::no_retry());
    let outcome = expect_pass(&mut factory(), &assertion)?;
    if outcome.detail_sql.is_some() {
        return Err("row-count assertions should not run a detail query".to_string());
    }
    Ok(())
}

fn rows_equal_mismatch_raises<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .verify(rows(Comparator::Equal, 3)?)
        .options(AssertOptions::no_retry());
    match expect_err(&mut factory(), &assertion)? {
        AssertError::Mismatch { message } if message.contains("total rows returned") => Ok(()),
        other => Err(format!("expected a row-count mismatch, got {:?}", other)),
    }
}

fn row_count_respects_filters<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .filter(Filter::new("age", Comparator::GreaterThan, Value::from(15)))
        .verify(rows(Comparator::Equal, 1)?)
        .verify(rows(Comparator::LessThan, 2)?)
        .options(AssertOptions::no_retry());
    expect_pass(&mut factory(), &assertion).map(|_| ())
}
