//! Whole-column list conditions over sorted, paged detail rows.

use dbcheck_core::{Comparator, Condition, Value};
use dbcheck_sql::Sort;

use super::{expect_err, expect_pass, CaseResult};
use crate::{AssertError, AssertOptions, Assertion, Connection};

pub(super) fn run_list_tests<C: Connection, F: Fn() -> C>(factory: &F) -> Vec<CaseResult> {
    vec![
        CaseResult::new(
            "list",
            "sorted_column_matches_list_conditions",
            sorted_column_matches_list_conditions(factory),
        ),
        CaseResult::new(
            "list",
            "descending_sort_is_ordered_desc",
            descending_sort_is_ordered_desc(factory),
        ),
        CaseResult::new("list", "paging_limits_the_list", paging_limits_the_list(factory)),
        CaseResult::new(
            "list",
            "list_mismatch_reports_whole_column",
            list_mismatch_reports_whole_column(factory),
        ),
    ]
}

fn list(column: &str, comparator: Comparator, expected: impl Into<Value>) -> Result<Condition, String> {
    Condition::list(column, comparator, expected.into()).map_err(|e| e.to_string())
}

fn unary(column: &str, comparator: Comparator) -> Result<Condition, String> {
    Condition::unary(column, comparator).map_err(|e| e.to_string())
}

fn sorted_column_matches_list_conditions<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .sort(Sort::asc("age"))
        .verify(list("name", Comparator::ListEquals, vec!["alice", "bob"])?)
        .verify(list("name", Comparator::ListEqualsAtAnyOrder, vec!["bob", "alice"])?)
        .verify(list("name", Comparator::ListHasSize, 2)?)
        .verify(list("name", Comparator::ListContains, "bob")?)
        .verify(list("name", Comparator::ListNotContain, "carol")?)
        .verify(unary("name", Comparator::ListNotEmpty)?)
        .verify(unary("age", Comparator::ListIsOrderedAsc)?)
        .options(AssertOptions::no_retry());
    let outcome = expect_pass(&mut factory(), &assertion)?;
    if outcome.details.len() != 7 {
        return Err(format!("expected 7 detail records, got {}", outcome.details.len()));
    }
    Ok(())
}

fn descending_sort_is_ordered_desc<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .sort(Sort::desc("age"))
        .verify(unary("age", Comparator::ListIsOrderedDesc)?)
        .verify(list("name", Comparator::ListEquals, vec!["bob", "alice"])?)
        .options(AssertOptions::no_retry());
    expect_pass(&mut factory(), &assertion).map(|_| ())
}

fn paging_limits_the_list<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .sort(Sort::asc("id"))
        .verify(list("name", Comparator::ListEquals, vec!["bob"])?)
        .options(AssertOptions::no_retry().page(2, 1));
    expect_pass(&mut factory(), &assertion).map(|_| ())
}

fn list_mismatch_reports_whole_column<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = Assertion::new("person")
        .sort(Sort::asc("id"))
        .verify(list("name", Comparator::ListHasSize, 3)?)
        .options(AssertOptions::no_retry());
    match expect_err(&mut factory(), &assertion)? {
        AssertError::Mismatch { message } if message.contains("alice") && message.contains("bob") => {
            Ok(())
        }
        other => Err(format!("expected a list mismatch, got {:?}", other)),
    }
}
