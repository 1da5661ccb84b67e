//! Aggregate conditions, answered by the single aggregate query.

use dbcheck_core::{Aggregate, Comparator, Condition, Value};

use super::{expect_err, expect_pass, CaseResult};
use crate::{AssertError, AssertOptions, Assertion, Connection};

pub(super) fn run_aggregate_tests<C: Connection, F: Fn() -> C>(factory: &F) -> Vec<CaseResult> {
    vec![
        CaseResult::new(
            "aggregate",
            "numeric_aggregates_match",
            numeric_aggregates_match(factory),
        ),
        CaseResult::new(
            "aggregate",
            "counts_skip_nulls_and_duplicates",
            counts_skip_nulls_and_duplicates(factory),
        ),
        CaseResult::new(
            "aggregate",
            "min_max_keep_column_type",
            min_max_keep_column_type(factory),
        ),
        CaseResult::new(
            "aggregate",
            "mismatch_uses_function_of_alias",
            mismatch_uses_function_of_alias(factory),
        ),
    ]
}

fn agg(
    aggregate: Aggregate,
    column: &str,
    comparator: Comparator,
    expected: impl Into<Value>,
) -> Result<Condition, String> {
    Condition::aggregate(aggregate, column, comparator, expected.into()).map_err(|e| e.to_string())
}

fn numeric_aggregates_match<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .verify(agg(Aggregate::Sum, "age", Comparator::Equal, 30)?)
        .verify(agg(Aggregate::Avg, "age", Comparator::Equal, 15)?)
        .verify(agg(Aggregate::Max, "age", Comparator::GreaterThan, 19)?)
        .verify(agg(Aggregate::Min, "age", Comparator::LessThanOrEqual, 10)?)
        .options(AssertOptions::no_retry());
    let outcome = expect_pass(&mut factory(), &assertion)?;
    if outcome.details.len() != 4 {
        return Err(format!("expected 4 detail records, got {}", outcome.details.len()));
    }
    Ok(())
}

fn counts_skip_nulls_and_duplicates<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .verify(agg(Aggregate::Count, "nickname", Comparator::Equal, 1)?)
        .verify(agg(Aggregate::DistinctCount, "name", Comparator::Equal, 2)?)
        .options(AssertOptions::no_retry());
    expect_pass(&mut factory(), &assertion).map(|_| ())
}

fn min_max_keep_column_type<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .verify(agg(Aggregate::Max, "name", Comparator::Equal, "bob")?)
        .verify(agg(Aggregate::Min, "name", Comparator::Equal, "alice")?)
        .options(AssertOptions::no_retry());
    expect_pass(&mut factory(), &assertion).map(|_| ())
}

fn mismatch_uses_function_of_alias<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .verify(agg(Aggregate::Sum, "age", Comparator::Equal, 31)?)
        .options(AssertOptions::no_retry());
    match expect_err(&mut factory(), &assertion)? {
        AssertError::Mismatch { message } => {
            if message.starts_with("sum of age expected equal 31") && message.ends_with("30") {
                Ok(())
            } else {
                Err(format!("unexpected message '{}'", message))
            }
        }
        other => Err(format!("expected a mismatch, got {:?}", other)),
    }
}
