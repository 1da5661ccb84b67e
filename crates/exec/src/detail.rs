//! Per-condition evaluation records and the reporting sink that receives them.

use serde::Serialize;

use dbcheck_core::{Aggregate, Comparator, Condition, ConditionKind, Expected, Value};

/// One evaluated condition in one attempt. Diagnostic only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detail {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    pub comparator: Comparator,
    pub actual: Value,
    /// Rendered expected value; `None` for predicates and no-argument
    /// comparators.
    pub expected: Option<String>,
    pub pass: bool,
}

impl Detail {
    pub fn record(condition: &Condition, actual: &Value, pass: bool) -> Self {
        let aggregate = match condition.kind() {
            ConditionKind::Aggregate(agg) => Some(agg),
            ConditionKind::RowCount => Some(Aggregate::Count),
            _ => None,
        };
        let expected = match condition.expected() {
            Expected::None | Expected::Predicate(_) => None,
            other => Some(other.to_string()),
        };
        Detail {
            column: condition.column().to_string(),
            aggregate,
            comparator: condition.comparator(),
            actual: actual.clone(),
            expected,
            pass,
        }
    }

    pub fn table_header() -> [&'static str; 6] {
        ["column", "aggregate", "actual", "comparator", "expected", "result"]
    }

    pub fn table_row(&self) -> [String; 6] {
        [
            self.column.clone(),
            self.aggregate
                .map(|a| a.function().to_string())
                .unwrap_or_default(),
            self.actual.to_string(),
            self.comparator.name().to_string(),
            self.expected.clone().unwrap_or_default(),
            if self.pass { "pass" } else { "fail" }.to_string(),
        ]
    }
}

/// The terminal result of a run, as reported to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    /// No rows matched and the run was configured not to fail on that.
    NotFound,
    Failed,
}

/// Receives diagnostics from a run. Every method defaults to doing nothing.
pub trait ReportSink {
    /// The rendered SQL, once, before the first attempt.
    fn start(&mut self, _detail_sql: Option<&str>, _aggregate_sql: &str) {}

    /// One finished attempt with its detail records.
    fn attempt(&mut self, _attempt: u32, _details: &[Detail], _passed: bool) {}

    /// The end of the run; `error` carries the message of a raised error.
    fn finish(&mut self, _verdict: Verdict, _error: Option<&str>) {}
}

/// Discards everything.
impl ReportSink for () {}

/// Keeps everything it is given, for tests and post-run inspection.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RecordingSink {
    pub sql: Vec<String>,
    pub attempts: Vec<(u32, Vec<Detail>, bool)>,
    pub verdict: Option<Verdict>,
    pub error: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    /// Detail records of the last attempt.
    pub fn last_details(&self) -> &[Detail] {
        self.attempts
            .last()
            .map(|(_, details, _)| details.as_slice())
            .unwrap_or(&[])
    }

    /// JSON document of everything recorded.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl ReportSink for RecordingSink {
    fn start(&mut self, detail_sql: Option<&str>, aggregate_sql: &str) {
        if let Some(sql) = detail_sql {
            self.sql.push(sql.to_string());
        }
        self.sql.push(aggregate_sql.to_string());
    }

    fn attempt(&mut self, attempt: u32, details: &[Detail], passed: bool) {
        self.attempts.push((attempt, details.to_vec(), passed));
    }

    fn finish(&mut self, verdict: Verdict, error: Option<&str>) {
        self.verdict = Some(verdict);
        self.error = error.map(str::to_string);
    }
}
