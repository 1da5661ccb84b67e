//! Type coercion between actual and expected values.
//!
//! Comparisons dispatch on the *actual* value's runtime type and coerce the
//! expected value into that type. Integer and decimal actuals compare in the
//! `rust_decimal::Decimal` domain so no digits are dropped; float actuals
//! compare as `f64` using total ordering. A value that cannot be coerced is
//! an `EvalError::DataFormat`, never a silent `false`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::EvalError;
use crate::value::Value;

/// An expected value after numeric coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Exactly representable as a `Decimal`.
    Exact(Decimal),
    /// Finite, but only representable as `f64` (e.g. `1e40`).
    Approx(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Exact(d) => d.to_f64().unwrap_or(f64::NAN),
            Number::Approx(x) => x,
        }
    }
}

/// Parse numeric text: plain or scientific
/// notation, optionally with a trailing `d`/`f` type suffix (`"40.0d"`).
pub fn parse_number(text: &str) -> Result<Number, EvalError> {
    let body = strip_type_suffix(text.trim());
    if body.is_empty() {
        return Err(EvalError::data_format(format!(
            "'{}' is not a number",
            text
        )));
    }
    if let Ok(d) = Decimal::from_str(body) {
        return Ok(Number::Exact(d));
    }
    if let Ok(d) = Decimal::from_scientific(body) {
        return Ok(Number::Exact(d));
    }
    match body.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(Number::Approx(x)),
        Ok(_) => Err(EvalError::data_format(format!(
            "'{}' is out of numeric range",
            text
        ))),
        Err(_) => Err(EvalError::data_format(format!(
            "'{}' is not a number",
            text
        ))),
    }
}

fn strip_type_suffix(s: &str) -> &str {
    let mut chars = s.chars();
    match (chars.next_back(), chars.next_back()) {
        (Some('d' | 'D' | 'f' | 'F'), Some(prev)) if prev.is_ascii_digit() || prev == '.' => {
            &s[..s.len() - 1]
        }
        _ => s,
    }
}

/// Coerce an expected value into a number.
pub fn expected_number(expected: &Value) -> Result<Number, EvalError> {
    match expected {
        Value::Int(i) => Ok(Number::Exact(Decimal::from(*i))),
        Value::Decimal(d) => Ok(Number::Exact(*d)),
        Value::Float(x) if x.is_finite() => Ok(Number::Approx(*x)),
        Value::Float(x) => Err(EvalError::data_format(format!(
            "{} is out of numeric range",
            x
        ))),
        Value::Text(s) => parse_number(s),
        other => Err(EvalError::data_format(format!(
            "{} value '{}' can not be converted to a number",
            other.type_name(),
            other
        ))),
    }
}

/// Coerce an expected value into `f64` for float actuals. Text goes straight
/// through the float parser so its nearest `f64` is used.
fn expected_f64(expected: &Value) -> Result<f64, EvalError> {
    if let Value::Text(s) = expected {
        if let Ok(x) = strip_type_suffix(s.trim()).parse::<f64>() {
            if x.is_finite() {
                return Ok(x);
            }
        }
    }
    Ok(expected_number(expected)?.to_f64())
}

fn compare_exact(actual: Decimal, expected: Number) -> Ordering {
    match expected {
        Number::Exact(d) => actual.cmp(&d),
        Number::Approx(x) => match Decimal::try_from(x) {
            Ok(d) => actual.cmp(&d),
            Err(_) => actual.to_f64().unwrap_or(f64::NAN).total_cmp(&x),
        },
    }
}

/// Strict boolean coercion for expected values compared against a boolean
/// column: `true`/`false`, integer `1`/`0`, text `"true"`/`"1"`/`"false"`/`"0"`.
pub fn to_bool(value: &Value) -> Result<bool, EvalError> {
    truthiness(value).ok_or_else(|| {
        EvalError::data_format(format!("data can not be converted to boolean: {}", value))
    })
}

/// Lenient truthiness for `IS_TRUE`/`IS_FALSE` actuals. `None` means the value
/// is neither true nor false.
pub fn truthiness(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int(1) => Some(true),
        Value::Int(0) => Some(false),
        Value::Text(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") || s == "1" {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") || s == "0" {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Coerce an expected value into a non-negative count (list sizes, row counts).
pub fn to_count(value: &Value) -> Result<u64, EvalError> {
    let n = expected_number(value)?;
    let exact = match n {
        Number::Exact(d) if d.fract().is_zero() => d.to_u64(),
        Number::Approx(x) if x.fract() == 0.0 && x >= 0.0 => x.to_u64(),
        _ => None,
    };
    exact.ok_or_else(|| EvalError::data_format(format!("{} is not a valid count", value)))
}

/// Compare a non-null actual value with an expected value, coercing the
/// expected value into the actual value's type.
pub fn compare(actual: &Value, expected: &Value) -> Result<Ordering, EvalError> {
    if expected.is_null() {
        return Err(EvalError::data_format(format!(
            "can not compare {} '{}' with null",
            actual.type_name(),
            actual
        )));
    }
    match actual {
        Value::Text(a) => match expected {
            Value::Text(e) => Ok(a.as_str().cmp(e.as_str())),
            Value::List(_) => Err(unsupported(actual, expected)),
            other => Ok(a.as_str().cmp(other.to_string().as_str())),
        },
        Value::Int(a) => Ok(compare_exact(Decimal::from(*a), expected_number(expected)?)),
        Value::Decimal(a) => Ok(compare_exact(*a, expected_number(expected)?)),
        Value::Float(a) => Ok(a.total_cmp(&expected_f64(expected)?)),
        Value::Bool(a) => Ok(a.cmp(&to_bool(expected)?)),
        Value::Null | Value::List(_) => Err(unsupported(actual, expected)),
    }
}

fn unsupported(actual: &Value, expected: &Value) -> EvalError {
    EvalError::data_format(format!(
        "unsupported comparison between {} and {}",
        actual.type_name(),
        expected.type_name()
    ))
}

/// Ordering used for sequence checks: nulls sort first, everything else goes
/// through [`compare`].
pub fn order(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ok(Ordering::Equal),
        (true, false) => Ok(Ordering::Less),
        (false, true) => Ok(Ordering::Greater),
        (false, false) => compare(a, b),
    }
}

/// Value equality used for membership tests. Numbers are equal when they
/// denote the same quantity regardless of tag; everything else compares
/// structurally. Never fails.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (l, r) if l.is_numeric() && r.is_numeric() => {
            matches!(compare(l, r), Ok(Ordering::Equal))
        }
        (l, r) => l == r,
    }
}
