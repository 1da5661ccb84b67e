use serde::Serialize;
use std::fmt;

/// Aggregate functions an aggregate condition can apply to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregate {
    Count,
    DistinctCount,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    /// Display name used in reports and failure messages.
    pub fn function(self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::DistinctCount => "distinct count",
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }

    /// Result-label prefix. Distinct per function, so two aggregates over the
    /// same column never share a label.
    pub fn prefix(self) -> &'static str {
        match self {
            Aggregate::Count => "cnt_",
            Aggregate::DistinctCount => "dc_",
            Aggregate::Sum => "sum_",
            Aggregate::Avg => "avg_",
            Aggregate::Min => "min_",
            Aggregate::Max => "max_",
        }
    }

    /// Result label for this aggregate over `column`, e.g. `dc_name`.
    pub fn label(self, column: &str) -> String {
        format!("{}{}", self.prefix(), column)
    }

    /// MIN/MAX keep the column's own type; the rest always yield numbers.
    pub fn yields_number(self) -> bool {
        !matches!(self, Aggregate::Min | Aggregate::Max)
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function())
    }
}
