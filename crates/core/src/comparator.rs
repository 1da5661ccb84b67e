//! The closed set of comparators a condition can use.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::EvalError;

/// Comparator families. Scalar comparators apply to one cell (or to a row
/// count / aggregate result); list comparators apply to the whole ordered
/// sequence of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Scalar,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparator {
    Equal,
    NotEqual,
    Null,
    NotNull,
    IsTrue,
    IsFalse,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Between,
    In,
    NotIn,
    Contains,
    NotContain,
    Matches,
    NotMatch,
    AnyMatch,
    ListIsEmpty,
    ListNotEmpty,
    ListHasSize,
    ListEquals,
    ListEqualsAtAnyOrder,
    ListNotEqual,
    ListContains,
    ListContainsAny,
    ListNotContain,
    ListIsOrderedAsc,
    ListIsOrderedDesc,
    ListMatches,
    ListNotMatch,
}

impl Comparator {
    pub const ALL: [Comparator; 31] = [
        Comparator::Equal,
        Comparator::NotEqual,
        Comparator::Null,
        Comparator::NotNull,
        Comparator::IsTrue,
        Comparator::IsFalse,
        Comparator::LessThan,
        Comparator::LessThanOrEqual,
        Comparator::GreaterThan,
        Comparator::GreaterThanOrEqual,
        Comparator::Between,
        Comparator::In,
        Comparator::NotIn,
        Comparator::Contains,
        Comparator::NotContain,
        Comparator::Matches,
        Comparator::NotMatch,
        Comparator::AnyMatch,
        Comparator::ListIsEmpty,
        Comparator::ListNotEmpty,
        Comparator::ListHasSize,
        Comparator::ListEquals,
        Comparator::ListEqualsAtAnyOrder,
        Comparator::ListNotEqual,
        Comparator::ListContains,
        Comparator::ListContainsAny,
        Comparator::ListNotContain,
        Comparator::ListIsOrderedAsc,
        Comparator::ListIsOrderedDesc,
        Comparator::ListMatches,
        Comparator::ListNotMatch,
    ];

    /// Upper snake-case tag, as used in diagnostics and configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Comparator::Equal => "EQUAL",
            Comparator::NotEqual => "NOT_EQUAL",
            Comparator::Null => "NULL",
            Comparator::NotNull => "NOT_NULL",
            Comparator::IsTrue => "IS_TRUE",
            Comparator::IsFalse => "IS_FALSE",
            Comparator::LessThan => "LESS_THAN",
            Comparator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            Comparator::GreaterThan => "GREATER_THAN",
            Comparator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            Comparator::Between => "BETWEEN",
            Comparator::In => "IN",
            Comparator::NotIn => "NOT_IN",
            Comparator::Contains => "CONTAINS",
            Comparator::NotContain => "NOT_CONTAIN",
            Comparator::Matches => "MATCHES",
            Comparator::NotMatch => "NOT_MATCH",
            Comparator::AnyMatch => "ANY_MATCH",
            Comparator::ListIsEmpty => "LIST_IS_EMPTY",
            Comparator::ListNotEmpty => "LIST_NOT_EMPTY",
            Comparator::ListHasSize => "LIST_HAS_SIZE",
            Comparator::ListEquals => "LIST_EQUALS",
            Comparator::ListEqualsAtAnyOrder => "LIST_EQUALS_AT_ANY_ORDER",
            Comparator::ListNotEqual => "LIST_NOT_EQUAL",
            Comparator::ListContains => "LIST_CONTAINS",
            Comparator::ListContainsAny => "LIST_CONTAINS_ANY",
            Comparator::ListNotContain => "LIST_NOT_CONTAIN",
            Comparator::ListIsOrderedAsc => "LIST_IS_ORDERED_ASC",
            Comparator::ListIsOrderedDesc => "LIST_IS_ORDERED_DESC",
            Comparator::ListMatches => "LIST_MATCHES",
            Comparator::ListNotMatch => "LIST_NOT_MATCH",
        }
    }

    /// Short phrase for reports ("greater than", "list is empty").
    pub fn description(self) -> &'static str {
        match self {
            Comparator::Equal => "equal",
            Comparator::NotEqual => "not equal",
            Comparator::Null => "is null",
            Comparator::NotNull => "is not null",
            Comparator::IsTrue => "is true",
            Comparator::IsFalse => "is false",
            Comparator::LessThan => "less than",
            Comparator::LessThanOrEqual => "less than or equal",
            Comparator::GreaterThan => "greater than",
            Comparator::GreaterThanOrEqual => "greater than or equal",
            Comparator::Between => "between",
            Comparator::In => "in",
            Comparator::NotIn => "not in",
            Comparator::Contains => "contains",
            Comparator::NotContain => "not contain",
            Comparator::Matches => "matches",
            Comparator::NotMatch => "not match",
            Comparator::AnyMatch => "any element matches",
            Comparator::ListIsEmpty => "list is empty",
            Comparator::ListNotEmpty => "list is not empty",
            Comparator::ListHasSize => "list has size",
            Comparator::ListEquals => "list equals",
            Comparator::ListEqualsAtAnyOrder => "list equals at any order",
            Comparator::ListNotEqual => "list not equal",
            Comparator::ListContains => "list contains",
            Comparator::ListContainsAny => "list contains any",
            Comparator::ListNotContain => "list not contain",
            Comparator::ListIsOrderedAsc => "list is ordered ascending",
            Comparator::ListIsOrderedDesc => "list is ordered descending",
            Comparator::ListMatches => "list matches",
            Comparator::ListNotMatch => "list not match",
        }
    }

    pub fn family(self) -> Family {
        match self {
            Comparator::ListIsEmpty
            | Comparator::ListNotEmpty
            | Comparator::ListHasSize
            | Comparator::ListEquals
            | Comparator::ListEqualsAtAnyOrder
            | Comparator::ListNotEqual
            | Comparator::ListContains
            | Comparator::ListContainsAny
            | Comparator::ListNotContain
            | Comparator::ListIsOrderedAsc
            | Comparator::ListIsOrderedDesc
            | Comparator::ListMatches
            | Comparator::ListNotMatch => Family::List,
            _ => Family::Scalar,
        }
    }

    /// Comparators that never carry an expected value.
    pub fn takes_no_argument(self) -> bool {
        matches!(
            self,
            Comparator::Null
                | Comparator::NotNull
                | Comparator::IsTrue
                | Comparator::IsFalse
                | Comparator::ListIsEmpty
                | Comparator::ListNotEmpty
                | Comparator::ListIsOrderedAsc
                | Comparator::ListIsOrderedDesc
        )
    }

    /// Comparators whose expected argument is a caller-supplied predicate.
    pub fn takes_predicate(self) -> bool {
        matches!(
            self,
            Comparator::Matches
                | Comparator::NotMatch
                | Comparator::AnyMatch
                | Comparator::ListMatches
                | Comparator::ListNotMatch
        )
    }

    /// Ordering comparators, which need a mutually comparable expected value.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Comparator::LessThan
                | Comparator::LessThanOrEqual
                | Comparator::GreaterThan
                | Comparator::GreaterThanOrEqual
        )
    }

    /// Scalar comparators that also make sense over a whole column sequence
    /// (membership and predicate checks).
    pub fn applies_to_sequence(self) -> bool {
        self.family() == Family::List
            || matches!(
                self,
                Comparator::In
                    | Comparator::NotIn
                    | Comparator::Matches
                    | Comparator::NotMatch
                    | Comparator::AnyMatch
            )
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Comparator {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Comparator::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EvalError::UnsupportedComparator {
                name: s.to_string(),
            })
    }
}
