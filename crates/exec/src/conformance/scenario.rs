//! Per-row conditions against a single filtered row.

use dbcheck_core::{Boundary, Comparator, Condition, Value};
use dbcheck_sql::Filter;

use super::{executor, expect_err, expect_pass, CaseResult};
use crate::{AssertError, AssertOptions, Assertion, Connection, RecordingSink, Verdict};

pub(super) fn run_scenario_tests<C: Connection, F: Fn() -> C>(factory: &F) -> Vec<CaseResult> {
    vec![
        CaseResult::new(
            "scenario",
            "matching_row_passes_on_first_attempt",
            matching_row_passes_on_first_attempt(factory),
        ),
        CaseResult::new(
            "scenario",
            "mismatch_names_column_expected_and_actual",
            mismatch_names_column_expected_and_actual(factory),
        ),
        CaseResult::new(
            "scenario",
            "first_mismatch_stops_the_attempt",
            first_mismatch_stops_the_attempt(factory),
        ),
        CaseResult::new(
            "scenario",
            "null_column_satisfies_null",
            null_column_satisfies_null(factory),
        ),
    ]
}

fn alice() -> Assertion {
    Assertion::new("person").filter(Filter::eq("id", 1))
}

fn cond(column: &str, comparator: Comparator, expected: impl Into<Value>) -> Result<Condition, String> {
    Condition::new(column, comparator, expected.into()).map_err(|e| e.to_string())
}

fn matching_row_passes_on_first_attempt<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let between = Boundary::new(5, 15).map_err(|e| e.to_string())?;
    let assertion = alice()
        .verify(cond("name", Comparator::Equal, "alice")?)
        .verify(Condition::new("age", Comparator::Between, between).map_err(|e| e.to_string())?);
    let outcome = expect_pass(&mut factory(), &assertion)?;
    if outcome.verdict != Verdict::Passed {
        return Err(format!("expected Passed, got {:?}", outcome.verdict));
    }
    if outcome.attempts != 1 {
        return Err(format!("expected 1 attempt, got {}", outcome.attempts));
    }
    if outcome.details.len() != 2 {
        return Err(format!("expected 2 detail records, got {}", outcome.details.len()));
    }
    Ok(())
}

fn mismatch_names_column_expected_and_actual<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = alice()
        .verify(cond("name", Comparator::Equal, "bob")?)
        .options(AssertOptions::no_retry());
    match expect_err(&mut factory(), &assertion)? {
        AssertError::Mismatch { message } => {
            for needle in ["name", "bob", "alice"] {
                if !message.contains(needle) {
                    return Err(format!("message '{}' does not mention '{}'", message, needle));
                }
            }
            Ok(())
        }
        other => Err(format!("expected a mismatch, got {:?}", other)),
    }
}

fn first_mismatch_stops_the_attempt<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = alice()
        .verify(cond("name", Comparator::Equal, "bob")?)
        .verify(Condition::unary("name", Comparator::NotNull).map_err(|e| e.to_string())?)
        .options(AssertOptions::no_retry());
    let (exec, _) = executor();
    let mut sink = RecordingSink::new();
    if exec.run(&assertion, &mut factory(), &mut sink).is_ok() {
        return Err("expected the run to fail".to_string());
    }
    let details = sink.last_details();
    if details.len() != 1 || details[0].pass {
        return Err(format!("expected one failing detail record, got {:?}", details));
    }
    if sink.verdict != Some(Verdict::Failed) {
        return Err(format!("expected a Failed verdict, got {:?}", sink.verdict));
    }
    Ok(())
}

fn null_column_satisfies_null<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = alice()
        .verify(Condition::unary("nickname", Comparator::Null).map_err(|e| e.to_string())?)
        .options(AssertOptions::no_retry());
    expect_pass(&mut factory(), &assertion).map(|_| ())
}
