//! The polling executor.
//!
//! One run: validate, pick the dialect, render the [`QueryPlan`] once, wait
//! out the initial delay, then attempt up to `retry_times + 1` times. Each
//! attempt evaluates row-count, aggregate, per-row and list conditions in
//! that order and stops at the first mismatch. Mismatches and empty results
//! are retried until the final attempt; every other error ends the run at
//! once.

use std::sync::Arc;
use std::time::Duration;

use dbcheck_core::{coerce, message, tester, Condition, Value, ROW_COUNT_LABEL};
use dbcheck_sql::{build, DialectRegistry, QueryPlan};

use crate::assertion::Assertion;
use crate::clock::{Clock, SystemClock};
use crate::connection::Connection;
use crate::detail::{Detail, ReportSink, Verdict};
use crate::error::{AssertError, ConnectionError};

const TARGET: &str = "dbcheck::executor";

/// A successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// `Passed`, or `NotFound` when no rows matched and the run was told not
    /// to fail on that.
    pub verdict: Verdict,
    /// Attempts made, including the final one.
    pub attempts: u32,
    /// Detail records of the last attempt.
    pub details: Vec<Detail>,
    pub detail_sql: Option<String>,
    pub aggregate_sql: String,
}

/// Result of one attempt that raised nothing.
#[derive(Debug, Clone, PartialEq)]
enum Attempt {
    Passed,
    NotFound,
    Mismatch(String),
}

/// Runs assertions against connections.
#[derive(Clone)]
pub struct Executor {
    registry: DialectRegistry,
    clock: Arc<dyn Clock>,
}

impl Default for Executor {
    fn default() -> Self {
        Executor::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Executor {
            registry: DialectRegistry::with_defaults(),
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_registry(mut self, registry: DialectRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Validate `assertion` and render its queries for `product`.
    pub fn plan(&self, assertion: &Assertion, product: &str) -> Result<QueryPlan, AssertError> {
        assertion.validate()?;
        let dialect = self.registry.resolve(product)?;
        Ok(build(dialect.as_ref(), &assertion.request())?)
    }

    /// Run `assertion` to a terminal state, reporting to `sink`.
    pub fn run<C: Connection + ?Sized>(
        &self,
        assertion: &Assertion,
        connection: &mut C,
        sink: &mut dyn ReportSink,
    ) -> Result<Outcome, AssertError> {
        let result = self.poll(assertion, connection, sink);
        match &result {
            Ok(outcome) => sink.finish(outcome.verdict, None),
            Err(e) => {
                tracing::warn!(target: TARGET, error = %e, "assertion failed");
                sink.finish(Verdict::Failed, Some(&e.to_string()));
            }
        }
        result
    }

    fn poll<C: Connection + ?Sized>(
        &self,
        assertion: &Assertion,
        connection: &mut C,
        sink: &mut dyn ReportSink,
    ) -> Result<Outcome, AssertError> {
        let plan = self.plan(assertion, connection.product_name())?;
        if let Some(sql) = &plan.detail_sql {
            tracing::debug!(target: TARGET, sql = %sql, "detail query");
        }
        tracing::debug!(target: TARGET, sql = %plan.aggregate_sql, "aggregate query");
        sink.start(plan.detail_sql.as_deref(), &plan.aggregate_sql);

        let options = &assertion.options;
        if options.delay_ms > 0 {
            tracing::info!(target: TARGET, delay_ms = options.delay_ms, "delaying first attempt");
            self.clock.sleep(Duration::from_millis(options.delay_ms));
        }

        let total = options.total_attempts();
        if options.retry {
            tracing::info!(
                target: TARGET,
                "Assert with total {} retries, interval {}ms",
                options.retry_times,
                options.retry_interval_ms
            );
        } else {
            tracing::info!(target: TARGET, "Assert without retry...");
        }

        let interval = Duration::from_millis(options.retry_interval_ms);
        let mut last_start: Option<Duration> = None;
        let mut details = Vec::new();

        for attempt in 1..=total {
            let is_final = attempt == total;
            if let Some(started) = last_start {
                tracing::info!(target: TARGET, "Retry {}/{}...", attempt - 1, options.retry_times);
                let wait = (started + interval).saturating_sub(self.clock.now());
                if !wait.is_zero() {
                    self.clock.sleep(wait);
                }
            }
            last_start = Some(self.clock.now());

            details.clear();
            let state = verify(connection, &plan, &mut details)?;
            sink.attempt(attempt, &details, state == Attempt::Passed);

            let verdict = match state {
                Attempt::Passed => {
                    tracing::info!(target: TARGET, attempt, "Assert success");
                    Verdict::Passed
                }
                Attempt::NotFound if is_final => {
                    if options.fail_if_not_found {
                        return Err(AssertError::NotFound);
                    }
                    tracing::info!(target: TARGET, attempt, "no data records found, nothing to verify");
                    Verdict::NotFound
                }
                Attempt::NotFound => {
                    tracing::info!(target: TARGET, attempt, "Data records not found");
                    continue;
                }
                Attempt::Mismatch(message) if is_final => {
                    return Err(AssertError::Mismatch { message });
                }
                Attempt::Mismatch(message) => {
                    tracing::info!(target: TARGET, attempt, "{}", message);
                    continue;
                }
            };
            return Ok(Outcome {
                verdict,
                attempts: attempt,
                details,
                detail_sql: plan.detail_sql.clone(),
                aggregate_sql: plan.aggregate_sql.clone(),
            });
        }
        Err(AssertError::configuration("assertion made no attempts"))
    }
}

impl Assertion {
    /// Run with the default executor (system clock, built-in dialects) and
    /// no report sink.
    pub fn run<C: Connection + ?Sized>(&self, connection: &mut C) -> Result<Outcome, AssertError> {
        Executor::new().run(self, connection, &mut ())
    }
}

// ──────────────────────────────────────────────
// One attempt
// ──────────────────────────────────────────────

fn verify<C: Connection + ?Sized>(
    connection: &mut C,
    plan: &QueryPlan,
    details: &mut Vec<Detail>,
) -> Result<Attempt, AssertError> {
    let aggregates = connection.query(&plan.aggregate_sql)?;
    let count = if aggregates.is_empty() {
        0
    } else {
        coerce::to_count(aggregates.get(0, ROW_COUNT_LABEL)?)?
    };
    if count == 0 {
        return Ok(Attempt::NotFound);
    }

    let rows = Value::Int(i64::try_from(count).unwrap_or(i64::MAX));
    for condition in &plan.row_conditions {
        if let Some(message) = check(condition, &rows, details)? {
            return Ok(Attempt::Mismatch(message));
        }
    }

    for condition in &plan.aggregate_conditions {
        let label = condition
            .result_label()
            .ok_or_else(|| AssertError::configuration("aggregate condition without a label"))?;
        let actual = aggregates.get(0, &label)?;
        if let Some(message) = check(condition, actual, details)? {
            return Ok(Attempt::Mismatch(message));
        }
    }

    let Some(detail_sql) = &plan.detail_sql else {
        return Ok(Attempt::Passed);
    };
    let result = connection.query(detail_sql)?;
    let positions = plan
        .selected_columns
        .iter()
        .map(|col| {
            result
                .column_index(col)
                .map(|idx| (col.as_str(), idx))
                .ok_or_else(|| ConnectionError::MissingColumn {
                    column: col.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for row in &result.rows {
        for (col, idx) in &positions {
            let Some(conditions) = plan.plain_columns.get(col) else {
                continue;
            };
            let actual = row.get(*idx).unwrap_or(&Value::Null);
            for condition in conditions {
                if let Some(message) = check(condition, actual, details)? {
                    return Ok(Attempt::Mismatch(message));
                }
            }
        }
    }

    for condition in &plan.list_conditions {
        let values = Value::List(result.column(condition.column())?);
        if let Some(message) = check(condition, &values, details)? {
            return Ok(Attempt::Mismatch(message));
        }
    }

    Ok(Attempt::Passed)
}

/// Evaluate one condition and record it. `Some(message)` on mismatch.
fn check(
    condition: &Condition,
    actual: &Value,
    details: &mut Vec<Detail>,
) -> Result<Option<String>, AssertError> {
    let pass = tester::test_condition(condition, actual)?;
    details.push(Detail::record(condition, actual, pass));
    Ok((!pass).then(|| message::render(condition, actual)))
}
