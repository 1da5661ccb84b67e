//! Structured and raw filters, rendered by the connection's dialect.

use dbcheck_core::{Boundary, Comparator, Condition, Value};
use dbcheck_sql::Filter;

use super::{expect_pass, CaseResult};
use crate::{AssertOptions, Assertion, Connection};

pub(super) fn run_filter_tests<C: Connection, F: Fn() -> C>(factory: &F) -> Vec<CaseResult> {
    let cases: Vec<(&'static str, Filter, i64)> = vec![
        ("in_list", Filter::new("id", Comparator::In, Value::from(vec![1, 2])), 2),
        ("not_in_list", Filter::new("id", Comparator::NotIn, Value::from(vec![1])), 1),
        ("contains", Filter::new("name", Comparator::Contains, Value::from("li")), 1),
        ("not_equal", Filter::ne("name", "alice"), 1),
        ("null_equality", Filter::eq("nickname", Value::Null), 1),
        ("not_null", Filter::new("nickname", Comparator::NotNull, dbcheck_core::Expected::None), 1),
        ("raw_clause", Filter::raw("age > 15"), 1),
    ];
    let mut results = cases
        .into_iter()
        .map(|(name, filter, rows)| {
            CaseResult::new("filter", name, filtered_row_count(factory, filter, rows))
        })
        .collect::<Vec<_>>();
    results.push(CaseResult::new(
        "filter",
        "between_inclusive_and_exclusive",
        between_inclusive_and_exclusive(factory),
    ));
    results
}

fn filtered_row_count<C: Connection, F: Fn() -> C>(
    factory: &F,
    filter: Filter,
    rows: i64,
) -> Result<(), String> {
    let condition =
        Condition::row_count(Comparator::Equal, Value::from(rows)).map_err(|e| e.to_string())?;
    let assertion = Assertion::new("person")
        .filter(filter)
        .verify(condition)
        .options(AssertOptions::no_retry());
    expect_pass(&mut factory(), &assertion).map(|_| ())
}

fn between_inclusive_and_exclusive<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let inclusive = Boundary::new(10, 20).map_err(|e| e.to_string())?;
    filtered_row_count(factory, Filter::between("age", inclusive), 2)?;
    let half_open = Boundary::with_exclusions(10, true, 20, false).map_err(|e| e.to_string())?;
    filtered_row_count(factory, Filter::between("age", half_open), 1)
}
