//! Filters that match nothing.

use dbcheck_core::{Comparator, Condition, Value};
use dbcheck_sql::Filter;

use super::{executor, expect_pass, CaseResult};
use crate::{AssertError, AssertOptions, Assertion, Connection, Verdict};

pub(super) fn run_not_found_tests<C: Connection, F: Fn() -> C>(factory: &F) -> Vec<CaseResult> {
    vec![
        CaseResult::new(
            "not_found",
            "empty_result_raises_not_found",
            empty_result_raises_not_found(factory),
        ),
        CaseResult::new(
            "not_found",
            "empty_result_allowed_without_fail_flag",
            empty_result_allowed_without_fail_flag(factory),
        ),
        CaseResult::new(
            "not_found",
            "empty_result_is_retried",
            empty_result_is_retried(factory),
        ),
    ]
}

fn nobody() -> Result<Assertion, String> {
    let condition =
        Condition::new("name", Comparator::Equal, Value::from("alice")).map_err(|e| e.to_string())?;
    Ok(Assertion::new("person")
        .filter(Filter::eq("id", 999))
        .verify(condition))
}

fn empty_result_raises_not_found<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = nobody()?.options(AssertOptions::no_retry());
    match super::expect_err(&mut factory(), &assertion)? {
        AssertError::NotFound => Ok(()),
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

fn empty_result_allowed_without_fail_flag<C: Connection, F: Fn() -> C>(
    factory: &F,
) -> Result<(), String> {
    let assertion = nobody()?.options(AssertOptions::no_retry().fail_if_not_found(false));
    let outcome = expect_pass(&mut factory(), &assertion)?;
    if outcome.verdict != Verdict::NotFound {
        return Err(format!("expected NotFound verdict, got {:?}", outcome.verdict));
    }
    if !outcome.details.is_empty() {
        return Err("no condition should be evaluated on an empty result".to_string());
    }
    Ok(())
}

fn empty_result_is_retried<C: Connection, F: Fn() -> C>(factory: &F) -> Result<(), String> {
    let assertion = nobody()?.options(
        AssertOptions::default()
            .retry_times(2)
            .retry_interval_ms(100),
    );
    let (exec, clock) = executor();
    match exec.run(&assertion, &mut factory(), &mut ()) {
        Err(AssertError::NotFound) => {}
        other => return Err(format!("expected NotFound, got {:?}", other)),
    }
    let sleeps = clock.sleeps().len();
    if sleeps != 2 {
        return Err(format!("expected 2 waits between 3 attempts, got {}", sleeps));
    }
    Ok(())
}
