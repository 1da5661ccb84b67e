//! Declarative conditions: one expectation about a column, an aggregate over
//! a column, the whole list of a column's values, or the number of rows.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::aggregate::Aggregate;
use crate::coerce;
use crate::comparator::{Comparator, Family};
use crate::error::EvalError;
use crate::value::Value;

/// Pseudo-column used by row-count conditions.
pub const ROW_COUNT_COLUMN: &str = "*";
/// Result label of `count(*)` in the aggregate query.
pub const ROW_COUNT_LABEL: &str = "count";
/// Display alias of row-count conditions.
pub const ROW_COUNT_ALIAS: &str = "total rows returned";

// ──────────────────────────────────────────────
// Expected values
// ──────────────────────────────────────────────

/// Caller-supplied check used by the MATCHES family.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Predicate(Arc::new(f))
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Predicate>")
    }
}

/// A min/max range for BETWEEN with independent exclusivity flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub min: Value,
    pub max: Value,
    pub exclude_min: bool,
    pub exclude_max: bool,
}

impl Boundary {
    /// Inclusive on both ends.
    pub fn new(min: impl Into<Value>, max: impl Into<Value>) -> Result<Self, EvalError> {
        Boundary::with_exclusions(min, false, max, false)
    }

    /// Exclusive on both ends.
    pub fn exclusive(min: impl Into<Value>, max: impl Into<Value>) -> Result<Self, EvalError> {
        Boundary::with_exclusions(min, true, max, true)
    }

    pub fn with_exclusions(
        min: impl Into<Value>,
        exclude_min: bool,
        max: impl Into<Value>,
        exclude_max: bool,
    ) -> Result<Self, EvalError> {
        let min = min.into();
        let max = max.into();
        if min.is_null() || max.is_null() {
            return Err(EvalError::configuration(
                "boundary min and max must not be null",
            ));
        }
        if matches!(min, Value::List(_)) || matches!(max, Value::List(_)) {
            return Err(EvalError::configuration(
                "boundary min and max must be scalar values",
            ));
        }
        // Both bounds must be comparable with each other, in either direction.
        coerce::compare(&min, &max).map_err(|e| {
            EvalError::configuration(format!(
                "boundary min {} and max {} are not comparable: {}",
                min, max, e
            ))
        })?;
        coerce::compare(&max, &min).map_err(|e| {
            EvalError::configuration(format!(
                "boundary min {} and max {} are not comparable: {}",
                min, max, e
            ))
        })?;
        Ok(Boundary {
            min,
            max,
            exclude_min,
            exclude_max,
        })
    }

    /// True when `actual` lies in the range. A null actual never does.
    pub fn contains(&self, actual: &Value) -> Result<bool, EvalError> {
        if actual.is_null() {
            return Ok(false);
        }
        let lower = coerce::compare(actual, &self.min)?;
        let upper = coerce::compare(actual, &self.max)?;
        let above = if self.exclude_min {
            lower == Ordering::Greater
        } else {
            lower != Ordering::Less
        };
        let below = if self.exclude_max {
            upper == Ordering::Less
        } else {
            upper != Ordering::Greater
        };
        Ok(above && below)
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{},{}{}",
            if self.exclude_min { "(" } else { "[" },
            self.min,
            self.max,
            if self.exclude_max { ")" } else { "]" }
        )
    }
}

/// The argument a condition compares against.
#[derive(Debug, Clone)]
pub enum Expected {
    None,
    Value(Value),
    Boundary(Boundary),
    Predicate(Predicate),
}

impl Expected {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Expected::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::None => Ok(()),
            Expected::Value(v) => write!(f, "{}", v),
            Expected::Boundary(b) => write!(f, "{}", b),
            Expected::Predicate(_) => write!(f, "<Predicate>"),
        }
    }
}

impl From<Value> for Expected {
    fn from(v: Value) -> Self {
        Expected::Value(v)
    }
}

impl From<Boundary> for Expected {
    fn from(b: Boundary) -> Self {
        Expected::Boundary(b)
    }
}

impl From<Predicate> for Expected {
    fn from(p: Predicate) -> Self {
        Expected::Predicate(p)
    }
}

// ──────────────────────────────────────────────
// Conditions
// ──────────────────────────────────────────────

/// What a condition is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// Each returned row's cell, one by one.
    Plain,
    /// The ordered sequence of the column's values across all rows.
    List,
    /// One aggregate over the column from the aggregate query.
    Aggregate(Aggregate),
    /// The number of rows matching the filters.
    RowCount,
}

/// An immutable, validated expectation.
#[derive(Debug, Clone)]
pub struct Condition {
    column: String,
    alias: Option<String>,
    comparator: Comparator,
    expected: Expected,
    kind: ConditionKind,
}

impl Condition {
    /// A per-row condition on `column`.
    pub fn new(
        column: impl Into<String>,
        comparator: Comparator,
        expected: impl Into<Expected>,
    ) -> Result<Self, EvalError> {
        Condition::build(column.into(), comparator, expected.into(), ConditionKind::Plain)
    }

    /// A condition over the whole list of `column`'s values.
    pub fn list(
        column: impl Into<String>,
        comparator: Comparator,
        expected: impl Into<Expected>,
    ) -> Result<Self, EvalError> {
        Condition::build(column.into(), comparator, expected.into(), ConditionKind::List)
    }

    /// A condition on `aggregate(column)`.
    pub fn aggregate(
        aggregate: Aggregate,
        column: impl Into<String>,
        comparator: Comparator,
        expected: impl Into<Expected>,
    ) -> Result<Self, EvalError> {
        Condition::build(
            column.into(),
            comparator,
            expected.into(),
            ConditionKind::Aggregate(aggregate),
        )
    }

    /// A condition on the number of rows the filters select.
    pub fn row_count(
        comparator: Comparator,
        expected: impl Into<Expected>,
    ) -> Result<Self, EvalError> {
        let mut condition = Condition::build(
            ROW_COUNT_COLUMN.to_string(),
            comparator,
            expected.into(),
            ConditionKind::RowCount,
        )?;
        condition.alias = Some(ROW_COUNT_ALIAS.to_string());
        Ok(condition)
    }

    /// Condition with no expected argument (NULL, LIST_IS_EMPTY, ...).
    pub fn unary(column: impl Into<String>, comparator: Comparator) -> Result<Self, EvalError> {
        let kind = if comparator.family() == Family::List {
            ConditionKind::List
        } else {
            ConditionKind::Plain
        };
        Condition::build(column.into(), comparator, Expected::None, kind)
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    fn build(
        column: String,
        comparator: Comparator,
        expected: Expected,
        kind: ConditionKind,
    ) -> Result<Self, EvalError> {
        if column.trim().is_empty() {
            return Err(EvalError::configuration("column name must not be empty"));
        }
        if kind != ConditionKind::RowCount && column == ROW_COUNT_COLUMN {
            return Err(EvalError::configuration(format!(
                "'{}' is reserved for row-count conditions",
                ROW_COUNT_COLUMN
            )));
        }
        check_family(comparator, kind)?;
        check_expected(comparator, &expected)?;
        check_numeric_target(comparator, &expected, kind)?;
        Ok(Condition {
            column,
            alias: None,
            comparator,
            expected,
            kind,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn alias_or_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column)
    }

    /// Alias used in messages: `sum of age` for aggregates, the alias or
    /// column name otherwise.
    pub fn display_name(&self) -> String {
        match self.kind {
            ConditionKind::Aggregate(agg) => {
                format!("{} of {}", agg.function(), self.alias_or_name())
            }
            _ => self.alias_or_name().to_string(),
        }
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub fn aggregate_fn(&self) -> Option<Aggregate> {
        match self.kind {
            ConditionKind::Aggregate(agg) => Some(agg),
            _ => None,
        }
    }

    /// Label of the value this condition reads from the aggregate query, if any.
    pub fn result_label(&self) -> Option<String> {
        match self.kind {
            ConditionKind::Aggregate(agg) => Some(agg.label(&self.column)),
            ConditionKind::RowCount => Some(ROW_COUNT_LABEL.to_string()),
            _ => None,
        }
    }
}

fn check_family(comparator: Comparator, kind: ConditionKind) -> Result<(), EvalError> {
    let ok = match kind {
        ConditionKind::List => comparator.applies_to_sequence(),
        _ => comparator.family() == Family::Scalar,
    };
    if ok {
        Ok(())
    } else {
        let target = match kind {
            ConditionKind::Plain => "a column value",
            ConditionKind::List => "a column list",
            ConditionKind::Aggregate(_) => "an aggregate",
            ConditionKind::RowCount => "a row count",
        };
        Err(EvalError::configuration(format!(
            "comparator {} can not be applied to {}",
            comparator, target
        )))
    }
}

fn check_expected(comparator: Comparator, expected: &Expected) -> Result<(), EvalError> {
    let fail = |what: &str| {
        Err(EvalError::configuration(format!(
            "comparator {} {}",
            comparator, what
        )))
    };
    if comparator.takes_no_argument() {
        return match expected {
            Expected::None => Ok(()),
            _ => fail("takes no expected value"),
        };
    }
    if comparator.takes_predicate() {
        return match expected {
            Expected::Predicate(_) => Ok(()),
            _ => fail("requires a predicate"),
        };
    }
    match (comparator, expected) {
        (Comparator::Between, Expected::Boundary(_)) => Ok(()),
        (Comparator::Between, _) => fail("requires a boundary"),
        (_, Expected::Value(v)) => check_value_shape(comparator, v),
        (_, Expected::None) => fail("requires an expected value"),
        _ => fail("does not accept a boundary or predicate"),
    }
}

fn check_value_shape(comparator: Comparator, v: &Value) -> Result<(), EvalError> {
    let needs_list = matches!(
        comparator,
        Comparator::In
            | Comparator::NotIn
            | Comparator::ListEquals
            | Comparator::ListEqualsAtAnyOrder
            | Comparator::ListNotEqual
            | Comparator::ListContainsAny
    );
    if needs_list && v.as_list().is_none() {
        return Err(EvalError::configuration(format!(
            "comparator {} requires a list of expected values, got {}",
            comparator,
            v.type_name()
        )));
    }
    if comparator.is_ordering() && v.is_null() {
        return Err(EvalError::configuration(format!(
            "comparator {} requires a non-null expected value",
            comparator
        )));
    }
    match comparator {
        Comparator::Contains | Comparator::NotContain if v.as_text().is_none() => {
            Err(EvalError::configuration(format!(
                "comparator {} requires a text expected value, got {}",
                comparator,
                v.type_name()
            )))
        }
        Comparator::ListHasSize => coerce::to_count(v)
            .map(|_| ())
            .map_err(|e| EvalError::configuration(e.to_string())),
        _ => Ok(()),
    }
}

fn check_numeric_target(
    comparator: Comparator,
    expected: &Expected,
    kind: ConditionKind,
) -> Result<(), EvalError> {
    let numeric = match kind {
        ConditionKind::RowCount => true,
        ConditionKind::Aggregate(agg) => agg.yields_number(),
        _ => false,
    };
    if !numeric {
        return Ok(());
    }
    if matches!(
        comparator,
        Comparator::IsTrue | Comparator::IsFalse | Comparator::Contains | Comparator::NotContain
    ) {
        return Err(EvalError::configuration(format!(
            "comparator {} can not be applied to a numeric result",
            comparator
        )));
    }
    let values: Vec<&Value> = match expected {
        Expected::Value(v) => v.as_elements().iter().collect(),
        Expected::Boundary(b) => vec![&b.min, &b.max],
        _ => Vec::new(),
    };
    for v in values.into_iter().filter(|v| !v.is_null()) {
        coerce::expected_number(v).map_err(|e| {
            EvalError::configuration(format!(
                "expected value {} is not compatible with a numeric result: {}",
                v, e
            ))
        })?;
    }
    Ok(())
}
