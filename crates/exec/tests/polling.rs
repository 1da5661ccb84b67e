//! Executor behaviour against a scripted connection: retry finality, wait
//! computation, short-circuiting and report-sink events.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use dbcheck_core::{Aggregate, Comparator, Condition, Value};
use dbcheck_exec::{
    AssertError, AssertOptions, Assertion, Clock, Connection, ConnectionError, Executor,
    ManualClock, RecordingSink, ResultSet, Verdict,
};
use dbcheck_sql::Filter;

// ──────────────────────────────────────────────
// Scripted connection
// ──────────────────────────────────────────────

struct ScriptedConnection {
    product: String,
    script: VecDeque<Result<ResultSet, ConnectionError>>,
    queries: Vec<String>,
    clock: Option<(Arc<ManualClock>, Duration)>,
}

impl ScriptedConnection {
    fn new() -> Self {
        ScriptedConnection {
            product: "SQLite".to_string(),
            script: VecDeque::new(),
            queries: Vec::new(),
            clock: None,
        }
    }

    /// Every query advances `clock` by `cost`.
    fn costing(mut self, clock: Arc<ManualClock>, cost: Duration) -> Self {
        self.clock = Some((clock, cost));
        self
    }

    fn then(mut self, result: ResultSet) -> Self {
        self.script.push_back(Ok(result));
        self
    }

    fn then_fail(mut self, error: ConnectionError) -> Self {
        self.script.push_back(Err(error));
        self
    }

    /// One attempt of a `name`-only assertion: the count, then the names.
    fn attempt(self, names: &[&str]) -> Self {
        self.then(count(names.len() as i64)).then(names_result(names))
    }
}

impl Connection for ScriptedConnection {
    fn query(&mut self, sql: &str) -> Result<ResultSet, ConnectionError> {
        self.queries.push(sql.to_string());
        if let Some((clock, cost)) = &self.clock {
            clock.advance(*cost);
        }
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(ConnectionError::Backend("script exhausted".to_string())))
    }

    fn product_name(&self) -> &str {
        &self.product
    }
}

fn count(n: i64) -> ResultSet {
    ResultSet::new(vec!["count".to_string()], vec![vec![Value::Int(n)]])
}

fn names_result(names: &[&str]) -> ResultSet {
    ResultSet::new(
        vec!["name".to_string()],
        names.iter().map(|n| vec![Value::from(*n)]).collect(),
    )
}

fn name_is(expected: &str) -> Condition {
    Condition::new("name", Comparator::Equal, Value::from(expected)).unwrap()
}

fn executor() -> (Executor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (Executor::new().with_clock(clock.clone()), clock)
}

fn retrying(times: u32, interval_ms: u64) -> AssertOptions {
    AssertOptions::default()
        .retry_times(times)
        .retry_interval_ms(interval_ms)
}

// ──────────────────────────────────────────────
// Retry finality
// ──────────────────────────────────────────────

#[test]
fn passes_once_the_data_arrives() {
    let (exec, clock) = executor();
    let mut conn = ScriptedConnection::new()
        .attempt(&["bob"])
        .attempt(&["bob"])
        .attempt(&["alice"]);
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 1))
        .verify(name_is("alice"))
        .options(retrying(5, 1000));

    let outcome = exec.run(&assertion, &mut conn, &mut ()).unwrap();
    assert_eq!(outcome.verdict, Verdict::Passed);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_millis(1000), Duration::from_millis(1000)]
    );
    assert_eq!(conn.queries.len(), 6);
}

#[test]
fn mismatch_raises_once_after_the_last_attempt() {
    let (exec, clock) = executor();
    let mut conn = ScriptedConnection::new()
        .attempt(&["bob"])
        .attempt(&["bob"])
        .attempt(&["bob"]);
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(retrying(2, 100));

    let err = exec.run(&assertion, &mut conn, &mut ()).unwrap_err();
    assert_eq!(
        err,
        AssertError::Mismatch {
            message: "name expected equal alice, actual is bob".to_string()
        }
    );
    assert_eq!(clock.sleeps().len(), 2);
    assert_eq!(conn.queries.len(), 6);
}

#[test]
fn without_retry_there_is_exactly_one_attempt() {
    let (exec, clock) = executor();
    let mut conn = ScriptedConnection::new().attempt(&["bob"]);
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(AssertOptions::no_retry());

    assert!(matches!(
        exec.run(&assertion, &mut conn, &mut ()),
        Err(AssertError::Mismatch { .. })
    ));
    assert!(clock.sleeps().is_empty());
    assert_eq!(conn.queries.len(), 2);
}

#[test]
fn execution_errors_are_never_retried() {
    let (exec, clock) = executor();
    let mut conn = ScriptedConnection::new().then_fail(ConnectionError::Query {
        sql: "select".to_string(),
        message: "no such table: person".to_string(),
    });
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(retrying(10, 100));

    let err = exec.run(&assertion, &mut conn, &mut ()).unwrap_err();
    assert!(matches!(err, AssertError::Execution(ConnectionError::Query { .. })));
    assert!(!err.is_retryable());
    assert!(clock.sleeps().is_empty());
    assert_eq!(conn.queries.len(), 1);
}

#[test]
fn missing_detail_column_is_an_execution_error() {
    let (exec, _) = executor();
    let mut conn = ScriptedConnection::new()
        .then(count(1))
        .then(ResultSet::new(vec!["other".to_string()], vec![vec![Value::Int(1)]]));
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(retrying(3, 100));

    let err = exec.run(&assertion, &mut conn, &mut ()).unwrap_err();
    assert_eq!(
        err,
        AssertError::Execution(ConnectionError::MissingColumn {
            column: "name".to_string()
        })
    );
}

// ──────────────────────────────────────────────
// Waits and delay
// ──────────────────────────────────────────────

#[test]
fn wait_is_measured_from_the_previous_attempt_start() {
    let (exec, clock) = executor();
    let mut conn = ScriptedConnection::new()
        .costing(clock.clone(), Duration::from_millis(400))
        .attempt(&["bob"])
        .attempt(&["alice"]);
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(retrying(3, 1000));

    exec.run(&assertion, &mut conn, &mut ()).unwrap();
    // Two queries at 400ms each leave 200ms of the interval.
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(200)]);
}

#[test]
fn slow_attempts_do_not_wait_at_all() {
    let (exec, clock) = executor();
    let mut conn = ScriptedConnection::new()
        .costing(clock.clone(), Duration::from_millis(700))
        .attempt(&["bob"])
        .attempt(&["alice"]);
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(retrying(3, 1000));

    let outcome = exec.run(&assertion, &mut conn, &mut ()).unwrap();
    assert_eq!(outcome.attempts, 2);
    assert!(clock.sleeps().is_empty());
    assert_eq!(clock.now(), Duration::from_millis(2800));
}

#[test]
fn delay_precedes_the_first_query() {
    let (exec, clock) = executor();
    let mut conn = ScriptedConnection::new().attempt(&["alice"]);
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(AssertOptions::no_retry().delay_ms(500));

    exec.run(&assertion, &mut conn, &mut ()).unwrap();
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(500)]);
}

// ──────────────────────────────────────────────
// Not found
// ──────────────────────────────────────────────

#[test]
fn empty_count_takes_the_not_found_path_even_for_row_conditions() {
    let (exec, _) = executor();
    let mut conn = ScriptedConnection::new().then(count(0));
    let assertion = Assertion::new("person")
        .verify(Condition::row_count(Comparator::Equal, Value::from(0)).unwrap())
        .options(AssertOptions::no_retry());

    assert_eq!(
        exec.run(&assertion, &mut conn, &mut ()).unwrap_err(),
        AssertError::NotFound
    );
}

#[test]
fn not_found_is_silent_when_allowed() {
    let (exec, _) = executor();
    let mut conn = ScriptedConnection::new()
        .then(count(0))
        .then(count(0));
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(retrying(1, 10).fail_if_not_found(false));

    let outcome = exec.run(&assertion, &mut conn, &mut ()).unwrap();
    assert_eq!(outcome.verdict, Verdict::NotFound);
    assert_eq!(outcome.attempts, 2);
    assert!(outcome.details.is_empty());
}

#[test]
fn empty_aggregate_result_counts_as_no_rows() {
    let (exec, _) = executor();
    let mut conn = ScriptedConnection::new().then(ResultSet::new(vec!["count".to_string()], vec![]));
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(AssertOptions::no_retry());

    assert_eq!(
        exec.run(&assertion, &mut conn, &mut ()).unwrap_err(),
        AssertError::NotFound
    );
}

// ──────────────────────────────────────────────
// Evaluation order and reporting
// ──────────────────────────────────────────────

#[test]
fn first_mismatching_row_stops_evaluation() {
    let (exec, _) = executor();
    let mut conn = ScriptedConnection::new().attempt(&["bob", "alice", "carol"]);
    let assertion = Assertion::new("person")
        .verify(Condition::unary("name", Comparator::NotNull).unwrap())
        .verify(name_is("alice"))
        .options(AssertOptions::no_retry());
    let mut sink = RecordingSink::new();

    let err = exec.run(&assertion, &mut conn, &mut sink).unwrap_err();
    assert_eq!(err.to_string(), "name expected equal alice, actual is bob");
    let details = sink.last_details();
    assert_eq!(details.len(), 2);
    assert!(details[0].pass);
    assert!(!details[1].pass);
}

#[test]
fn aggregates_are_checked_in_declaration_order() {
    let (exec, _) = executor();
    let aggregates = ResultSet::new(
        vec![
            "count".to_string(),
            "max_age".to_string(),
            "min_name".to_string(),
            "min_age".to_string(),
        ],
        vec![vec![
            Value::Int(2),
            Value::Int(20),
            Value::from("alice"),
            Value::Int(10),
        ]],
    );
    let mut conn = ScriptedConnection::new().then(aggregates);
    let assertion = Assertion::new("person")
        .verify(Condition::aggregate(Aggregate::Max, "age", Comparator::GreaterThan, Value::from(0)).unwrap())
        .verify(Condition::aggregate(Aggregate::Min, "name", Comparator::Equal, Value::from("zzz")).unwrap())
        .verify(Condition::aggregate(Aggregate::Min, "age", Comparator::Equal, Value::from(999)).unwrap())
        .options(AssertOptions::no_retry());
    let mut sink = RecordingSink::new();

    let err = exec.run(&assertion, &mut conn, &mut sink).unwrap_err();
    assert_eq!(err.to_string(), "min of name expected equal zzz, actual is alice");
    // `min of age` is never reached.
    assert_eq!(sink.last_details().len(), 2);
}

#[test]
fn list_conditions_are_checked_in_declaration_order() {
    let (exec, _) = executor();
    let rows = ResultSet::new(
        vec!["name".to_string(), "age".to_string()],
        vec![
            vec![Value::from("bob"), Value::Int(20)],
            vec![Value::from("alice"), Value::Int(10)],
        ],
    );
    let mut conn = ScriptedConnection::new().then(count(2)).then(rows);
    let assertion = Assertion::new("person")
        .verify(Condition::list("name", Comparator::ListHasSize, Value::from(2)).unwrap())
        .verify(Condition::unary("age", Comparator::ListIsOrderedAsc).unwrap())
        .verify(Condition::list("name", Comparator::ListContains, Value::from("carol")).unwrap())
        .options(AssertOptions::no_retry());
    let mut sink = RecordingSink::new();

    assert!(exec.run(&assertion, &mut conn, &mut sink).is_err());
    let checked: Vec<Comparator> = sink.last_details().iter().map(|d| d.comparator).collect();
    assert_eq!(
        checked,
        vec![Comparator::ListHasSize, Comparator::ListIsOrderedAsc]
    );
}

#[test]
fn sink_receives_sql_attempts_and_verdict() {
    let (exec, _) = executor();
    let mut conn = ScriptedConnection::new()
        .attempt(&["bob"])
        .attempt(&["alice"]);
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(retrying(1, 10));
    let mut sink = RecordingSink::new();

    exec.run(&assertion, &mut conn, &mut sink).unwrap();
    assert_eq!(
        sink.sql,
        vec![
            "select \"name\" from \"person\" limit 100".to_string(),
            "select count(*) as \"count\" from \"person\" limit 100".to_string(),
        ]
    );
    let passed: Vec<bool> = sink.attempts.iter().map(|(_, _, p)| *p).collect();
    assert_eq!(passed, vec![false, true]);
    assert_eq!(sink.verdict, Some(Verdict::Passed));
    assert!(sink.error.is_none());
    assert_eq!(sink.to_json()["verdict"], "passed");
}

#[test]
fn sink_records_the_raised_error() {
    let (exec, _) = executor();
    let mut conn = ScriptedConnection::new().then(count(0));
    let assertion = Assertion::new("person")
        .verify(name_is("alice"))
        .options(AssertOptions::no_retry());
    let mut sink = RecordingSink::new();

    exec.run(&assertion, &mut conn, &mut sink).unwrap_err();
    assert_eq!(sink.verdict, Some(Verdict::Failed));
    assert_eq!(sink.error.as_deref(), Some("Data records not found"));
}

#[test]
fn unknown_product_is_a_configuration_error() {
    let (exec, _) = executor();
    let mut conn = ScriptedConnection::new();
    conn.product = "Informix".to_string();
    let assertion = Assertion::new("person").verify(name_is("alice"));

    assert!(matches!(
        exec.run(&assertion, &mut conn, &mut ()),
        Err(AssertError::Configuration { .. })
    ));
    assert!(conn.queries.is_empty());
}

#[test]
fn data_format_errors_surface_without_retry() {
    let (exec, clock) = executor();
    let mut conn = ScriptedConnection::new().then(count(1)).then(ResultSet::new(
        vec!["age".to_string()],
        vec![vec![Value::Int(10)]],
    ));
    let assertion = Assertion::new("person")
        .verify(Condition::new("age", Comparator::GreaterThan, Value::from("ten")).unwrap())
        .options(retrying(5, 100));

    assert!(matches!(
        exec.run(&assertion, &mut conn, &mut ()),
        Err(AssertError::DataFormat { .. })
    ));
    assert!(clock.sleeps().is_empty());
}
