//! The comparator engine: decides whether one actual value satisfies one
//! comparator against its expected argument.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::coerce::{self, values_equal};
use crate::comparator::Comparator;
use crate::condition::{Boundary, Condition, Expected, Predicate};
use crate::error::EvalError;
use crate::value::Value;

/// Evaluate `condition` against `actual`.
pub fn test_condition(condition: &Condition, actual: &Value) -> Result<bool, EvalError> {
    test(condition.comparator(), actual, condition.expected())
}

/// Pure, total over [`Comparator::ALL`].
///
/// `Ok(false)` is a mismatch. `Err` is a caller error (an expected value that
/// cannot be coerced, a comparator applied to a value shape it does not
/// support) and is never worth retrying.
pub fn test(comparator: Comparator, actual: &Value, expected: &Expected) -> Result<bool, EvalError> {
    match comparator {
        Comparator::Null => Ok(actual.is_null()),
        Comparator::NotNull => Ok(!actual.is_null()),
        Comparator::IsTrue => Ok(coerce::truthiness(actual) == Some(true)),
        Comparator::IsFalse => Ok(coerce::truthiness(actual) == Some(false)),
        Comparator::Equal => equal(actual, value(comparator, expected)?),
        Comparator::NotEqual => equal(actual, value(comparator, expected)?).map(|eq| !eq),
        Comparator::LessThan => ordered(actual, comparator, expected, |o| o == Ordering::Less),
        Comparator::LessThanOrEqual => {
            ordered(actual, comparator, expected, |o| o != Ordering::Greater)
        }
        Comparator::GreaterThan => {
            ordered(actual, comparator, expected, |o| o == Ordering::Greater)
        }
        Comparator::GreaterThanOrEqual => {
            ordered(actual, comparator, expected, |o| o != Ordering::Less)
        }
        Comparator::Between => boundary(comparator, expected)?.contains(actual),
        Comparator::In => {
            let pool = list(comparator, expected)?;
            Ok(actual
                .as_elements()
                .iter()
                .all(|item| pool.iter().any(|e| values_equal(item, e))))
        }
        Comparator::NotIn => {
            let pool = list(comparator, expected)?;
            Ok(!actual
                .as_elements()
                .iter()
                .any(|item| pool.iter().any(|e| values_equal(item, e))))
        }
        Comparator::Contains => contains(comparator, actual, expected),
        Comparator::NotContain => match actual {
            Value::Null => Ok(false),
            Value::List(items) => Ok(!value(comparator, expected)?
                .as_elements()
                .iter()
                .any(|w| member(items, w))),
            _ => contains(comparator, actual, expected).map(|c| !c),
        },
        Comparator::Matches => {
            let p = predicate(comparator, expected)?;
            Ok(actual.as_elements().iter().all(|v| p.test(v)))
        }
        Comparator::NotMatch => {
            let p = predicate(comparator, expected)?;
            Ok(!actual.as_elements().iter().any(|v| p.test(v)))
        }
        Comparator::AnyMatch => {
            let p = predicate(comparator, expected)?;
            Ok(actual.as_elements().iter().any(|v| p.test(v)))
        }
        Comparator::ListIsEmpty => Ok(sequence(actual).is_empty()),
        Comparator::ListNotEmpty => Ok(!sequence(actual).is_empty()),
        Comparator::ListHasSize => {
            let size = coerce::to_count(value(comparator, expected)?)?;
            Ok(sequence(actual).len() as u64 == size)
        }
        Comparator::ListEquals => Ok(list_equals(sequence(actual), list(comparator, expected)?)),
        Comparator::ListNotEqual => {
            Ok(!list_equals(sequence(actual), list(comparator, expected)?))
        }
        Comparator::ListEqualsAtAnyOrder => Ok(multiset_equals(
            sequence(actual),
            list(comparator, expected)?,
        )),
        Comparator::ListContains => {
            let seq = sequence(actual);
            Ok(match value(comparator, expected)? {
                Value::List(wanted) => wanted.iter().all(|w| member(seq, w)),
                scalar => member(seq, scalar),
            })
        }
        Comparator::ListContainsAny => {
            let seq = sequence(actual);
            Ok(list(comparator, expected)?.iter().any(|w| member(seq, w)))
        }
        Comparator::ListNotContain => {
            let seq = sequence(actual);
            Ok(match value(comparator, expected)? {
                Value::List(unwanted) => !unwanted.iter().any(|w| member(seq, w)),
                scalar => !member(seq, scalar),
            })
        }
        Comparator::ListIsOrderedAsc => is_sorted(sequence(actual), Ordering::Greater),
        Comparator::ListIsOrderedDesc => is_sorted(sequence(actual), Ordering::Less),
        Comparator::ListMatches => {
            let p = predicate(comparator, expected)?;
            Ok(p.test(&as_list_value(actual)))
        }
        Comparator::ListNotMatch => {
            let p = predicate(comparator, expected)?;
            Ok(!p.test(&as_list_value(actual)))
        }
    }
}

// ──────────────────────────────────────────────
// Argument extraction
// ──────────────────────────────────────────────

fn missing(comparator: Comparator, what: &str) -> EvalError {
    EvalError::configuration(format!("comparator {} requires {}", comparator, what))
}

fn value(comparator: Comparator, expected: &Expected) -> Result<&Value, EvalError> {
    expected
        .as_value()
        .ok_or_else(|| missing(comparator, "an expected value"))
}

fn list(comparator: Comparator, expected: &Expected) -> Result<&[Value], EvalError> {
    value(comparator, expected)?
        .as_list()
        .ok_or_else(|| missing(comparator, "a list of expected values"))
}

fn boundary(comparator: Comparator, expected: &Expected) -> Result<&Boundary, EvalError> {
    match expected {
        Expected::Boundary(b) => Ok(b),
        _ => Err(missing(comparator, "a boundary")),
    }
}

fn predicate(comparator: Comparator, expected: &Expected) -> Result<&Predicate, EvalError> {
    match expected {
        Expected::Predicate(p) => Ok(p),
        _ => Err(missing(comparator, "a predicate")),
    }
}

// ──────────────────────────────────────────────
// Scalar helpers
// ──────────────────────────────────────────────

fn equal(actual: &Value, expected: &Value) -> Result<bool, EvalError> {
    match (actual.is_null(), expected.is_null()) {
        (true, true) => Ok(true),
        (true, false) | (false, true) => Ok(false),
        (false, false) => Ok(coerce::compare(actual, expected)? == Ordering::Equal),
    }
}

fn ordered(
    actual: &Value,
    comparator: Comparator,
    expected: &Expected,
    accept: impl Fn(Ordering) -> bool,
) -> Result<bool, EvalError> {
    let expected = value(comparator, expected)?;
    if actual.is_null() {
        return Ok(false);
    }
    Ok(accept(coerce::compare(actual, expected)?))
}

fn contains(comparator: Comparator, actual: &Value, expected: &Expected) -> Result<bool, EvalError> {
    let wanted = value(comparator, expected)?;
    match actual {
        Value::Null => Ok(false),
        Value::Text(s) => match wanted {
            Value::Text(w) => Ok(s.contains(w.as_str())),
            other => Ok(s.contains(other.to_string().as_str())),
        },
        Value::List(items) => Ok(wanted.as_elements().iter().all(|w| member(items, w))),
        other => Err(EvalError::configuration(format!(
            "{} not support type: {}",
            comparator,
            other.type_name()
        ))),
    }
}

// ──────────────────────────────────────────────
// Sequence helpers
// ──────────────────────────────────────────────

fn sequence(actual: &Value) -> &[Value] {
    match actual {
        Value::Null => &[],
        other => other.as_elements(),
    }
}

fn as_list_value(actual: &Value) -> Cow<'_, Value> {
    match actual {
        Value::List(_) => Cow::Borrowed(actual),
        other => Cow::Owned(Value::List(sequence(other).to_vec())),
    }
}

fn member(seq: &[Value], wanted: &Value) -> bool {
    seq.iter().any(|v| values_equal(v, wanted))
}

fn list_equals(actual: &[Value], expected: &[Value]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| values_equal(a, e))
}

fn multiset_equals(actual: &[Value], expected: &[Value]) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    let mut used = vec![false; expected.len()];
    actual.iter().all(|a| {
        match expected
            .iter()
            .enumerate()
            .position(|(i, e)| !used[i] && values_equal(a, e))
        {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Non-strict monotonicity: no adjacent pair may compare as `violation`.
fn is_sorted(seq: &[Value], violation: Ordering) -> Result<bool, EvalError> {
    for pair in seq.windows(2) {
        if coerce::order(&pair[0], &pair[1])? == violation {
            return Ok(false);
        }
    }
    Ok(true)
}
