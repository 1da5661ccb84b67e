//! Assertions run end to end against an in-memory SQLite database.

use std::sync::Arc;
use std::time::Duration;

use dbcheck_core::{Aggregate, Boundary, Comparator, Condition, Value};
use dbcheck_exec::{
    AssertError, AssertOptions, Assertion, Connection, ConnectionError, Detail, Executor,
    ManualClock, RecordingSink, ResultSet, Verdict,
};
use dbcheck_sql::{Filter, Sort};
use dbcheck_sqlite::SqliteConnection;

fn person_db() -> SqliteConnection {
    let conn = SqliteConnection::open_in_memory().unwrap();
    conn.execute_batch(
        "create table person (id integer primary key, name varchar(32), age integer);
         insert into person (id, name, age) values (1, 'alice', 10);
         insert into person (id, name, age) values (2, 'bob', 20);",
    )
    .unwrap();
    conn
}

fn executor() -> (Executor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    (Executor::new().with_clock(clock.clone()), clock)
}

fn name_is(expected: &str) -> Condition {
    Condition::new("name", Comparator::Equal, Value::from(expected)).unwrap()
}

fn rows_equal(n: i64) -> Condition {
    Condition::row_count(Comparator::Equal, Value::from(n)).unwrap()
}

// ──────────────────────────────────────────────
// Per-row scenario
// ──────────────────────────────────────────────

#[test]
fn matching_row_passes_on_first_attempt() {
    let (exec, clock) = executor();
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 1))
        .verify(name_is("alice"))
        .verify(Condition::new("age", Comparator::Between, Boundary::new(5, 15).unwrap()).unwrap());

    let outcome = exec.run(&assertion, &mut person_db(), &mut ()).unwrap();
    assert_eq!(outcome.verdict, Verdict::Passed);
    assert_eq!(outcome.attempts, 1);
    assert!(clock.sleeps().is_empty());
    assert_eq!(
        outcome.detail_sql.as_deref(),
        Some("select \"name\",\"age\" from \"person\" where \"id\"=1 limit 100")
    );
}

#[test]
fn mismatch_message_names_column_expected_and_actual() {
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 1))
        .verify(name_is("bob"))
        .options(AssertOptions::default().retry_times(0));

    let err = assertion.run(&mut person_db()).unwrap_err();
    assert_eq!(err.to_string(), "name expected equal bob, actual is alice");
}

#[test]
fn alias_replaces_column_in_messages() {
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 2))
        .verify(
            Condition::new("age", Comparator::LessThan, Value::from(18))
                .unwrap()
                .with_alias("bob's age"),
        )
        .options(AssertOptions::no_retry());

    let err = assertion.run(&mut person_db()).unwrap_err();
    assert_eq!(err.to_string(), "bob's age expected less than 18, actual is 20");
}

#[test]
fn textual_numbers_compare_numerically() {
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 1))
        .verify(Condition::new("age", Comparator::Equal, Value::from("10.0")).unwrap())
        .verify(Condition::new("age", Comparator::LessThan, Value::from("1e2")).unwrap())
        .options(AssertOptions::no_retry());

    assert!(assertion.run(&mut person_db()).is_ok());
}

#[test]
fn predicate_conditions_see_each_value() {
    let even = dbcheck_core::Predicate::new(|v| matches!(v, Value::Int(i) if i % 2 == 0));
    let assertion = Assertion::new("person")
        .verify(Condition::new("age", Comparator::Matches, even).unwrap())
        .options(AssertOptions::no_retry());

    let outcome = assertion.run(&mut person_db()).unwrap();
    assert_eq!(outcome.details.len(), 2);
    assert!(outcome.details.iter().all(|d| d.pass && d.expected.is_none()));
}

// ──────────────────────────────────────────────
// Row count and not found
// ──────────────────────────────────────────────

#[test]
fn row_count_scenario() {
    let pass = Assertion::new("person")
        .verify(rows_equal(2))
        .options(AssertOptions::no_retry());
    assert!(pass.run(&mut person_db()).is_ok());

    let fail = Assertion::new("person")
        .verify(rows_equal(3))
        .options(AssertOptions::default().retry_times(0));
    let err = fail.run(&mut person_db()).unwrap_err();
    assert_eq!(err.to_string(), "total rows returned expected equal 3, actual is 2");
}

#[test]
fn not_found_scenario() {
    let raising = Assertion::new("person")
        .filter(Filter::eq("id", 999))
        .verify(name_is("alice"))
        .options(AssertOptions::default().retry_times(0));
    let err = raising.run(&mut person_db()).unwrap_err();
    assert_eq!(err, AssertError::NotFound);
    assert_eq!(err.to_string(), "Data records not found");

    let vacuous = raising
        .clone()
        .options(AssertOptions::default().retry_times(0).fail_if_not_found(false));
    let outcome = vacuous.run(&mut person_db()).unwrap();
    assert_eq!(outcome.verdict, Verdict::NotFound);
}

// ──────────────────────────────────────────────
// Filters
// ──────────────────────────────────────────────

#[test]
fn raw_filter_with_or_stays_inside_the_conjunction() {
    // Unbracketed, `id = 1 and name = 'zed' or age = 20` would select bob.
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 1))
        .filter(Filter::raw("name = 'zed' or age = 20"))
        .verify(name_is("bob"))
        .options(AssertOptions::no_retry());
    let mut sink = RecordingSink::new();

    let (exec, _) = executor();
    let err = exec.run(&assertion, &mut person_db(), &mut sink).unwrap_err();
    assert_eq!(err, AssertError::NotFound);
    assert!(sink.sql[0].contains("where \"id\"=1 and (name = 'zed' or age = 20)"));
}

#[test]
fn raw_filter_with_a_comment_is_rejected_before_querying() {
    let mut conn = LateWriter {
        inner: person_db(),
        queries: 0,
        insert_after: 1000,
    };
    for raw in ["age > 0 -- adults", "age > 0 /* adults */"] {
        let assertion = Assertion::new("person")
            .filter(Filter::raw(raw))
            .filter(Filter::eq("id", 1))
            .verify(name_is("alice"))
            .options(AssertOptions::no_retry());
        let err = assertion.run(&mut conn).unwrap_err();
        assert!(matches!(err, AssertError::Configuration { .. }), "{raw}: {err}");
    }
    assert_eq!(conn.queries, 0);
}

#[test]
fn contains_filter_matches_wildcards_literally() {
    let mut conn = person_db();
    conn.execute_batch("insert into person (id, name, age) values (3, 'l_c%', 30);")
        .unwrap();

    // `_` would otherwise match the `i` in alice, `%` any name at all.
    let underscore = Assertion::new("person")
        .filter(Filter::new("name", Comparator::Contains, Value::from("l_c")))
        .verify(rows_equal(1))
        .verify(name_is("l_c%"))
        .options(AssertOptions::no_retry());
    assert!(underscore.run(&mut conn).is_ok());

    let percent = Assertion::new("person")
        .filter(Filter::new("name", Comparator::Contains, Value::from("c%")))
        .verify(rows_equal(1))
        .options(AssertOptions::no_retry());
    assert!(percent.run(&mut conn).is_ok());

    let excluded = Assertion::new("person")
        .filter(Filter::new("name", Comparator::NotContain, Value::from("_")))
        .verify(rows_equal(2))
        .options(AssertOptions::no_retry());
    assert!(excluded.run(&mut conn).is_ok());
}

// ──────────────────────────────────────────────
// Eventual consistency
// ──────────────────────────────────────────────

/// Inserts a row after a fixed number of queries, standing in for a
/// downstream writer that lands between polls.
struct LateWriter {
    inner: SqliteConnection,
    queries: u32,
    insert_after: u32,
}

impl Connection for LateWriter {
    fn query(&mut self, sql: &str) -> Result<ResultSet, ConnectionError> {
        self.queries += 1;
        if self.queries == self.insert_after + 1 {
            self.inner
                .execute_batch("insert into person (id, name, age) values (3, 'carol', 30);")?;
        }
        self.inner.query(sql)
    }

    fn product_name(&self) -> &str {
        self.inner.product_name()
    }
}

#[test]
fn row_written_between_polls_is_picked_up() {
    let (exec, clock) = executor();
    let mut conn = LateWriter {
        inner: person_db(),
        queries: 0,
        insert_after: 2,
    };
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 3))
        .verify(name_is("carol"))
        .options(AssertOptions::default().retry_times(5).retry_interval_ms(250));
    let mut sink = RecordingSink::new();

    let outcome = exec.run(&assertion, &mut conn, &mut sink).unwrap();
    assert_eq!(outcome.attempts, 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(250); 2]);
    // The first two attempts see no rows and evaluate nothing.
    assert!(sink.attempts[..2].iter().all(|(_, d, passed)| d.is_empty() && !passed));
}

// ──────────────────────────────────────────────
// Aggregates, lists and paging
// ──────────────────────────────────────────────

#[test]
fn aggregates_and_lists_together() {
    let assertion = Assertion::new("person")
        .sort(Sort::desc("age"))
        .verify(Condition::aggregate(Aggregate::Sum, "age", Comparator::Equal, Value::from(30)).unwrap())
        .verify(
            Condition::aggregate(Aggregate::DistinctCount, "name", Comparator::GreaterThanOrEqual, Value::from(2))
                .unwrap(),
        )
        .verify(Condition::list("name", Comparator::ListEquals, Value::from(vec!["bob", "alice"])).unwrap())
        .verify(Condition::unary("age", Comparator::ListIsOrderedDesc).unwrap())
        .options(AssertOptions::no_retry());
    let mut sink = RecordingSink::new();

    let (exec, _) = executor();
    exec.run(&assertion, &mut person_db(), &mut sink).unwrap();
    let rows: Vec<[String; 6]> = sink.last_details().iter().map(Detail::table_row).collect();
    assert_eq!(
        rows[0],
        [
            "age".to_string(),
            "sum".to_string(),
            "30".to_string(),
            "EQUAL".to_string(),
            "30".to_string(),
            "pass".to_string()
        ]
    );
    assert_eq!(rows.len(), 4);
}

#[test]
fn first_failing_aggregate_is_the_first_declared() {
    let assertion = Assertion::new("person")
        .verify(Condition::aggregate(Aggregate::Max, "age", Comparator::GreaterThan, Value::from(0)).unwrap())
        .verify(Condition::aggregate(Aggregate::Min, "name", Comparator::Equal, Value::from("zzz")).unwrap())
        .verify(Condition::aggregate(Aggregate::Min, "age", Comparator::Equal, Value::from(999)).unwrap())
        .options(AssertOptions::no_retry());

    let err = assertion.run(&mut person_db()).unwrap_err();
    assert_eq!(err.to_string(), "min of name expected equal zzz, actual is alice");
}

#[test]
fn paging_reads_a_window_of_rows() {
    let assertion = Assertion::new("person")
        .sort(Sort::asc("id"))
        .verify(Condition::list("name", Comparator::ListEquals, Value::from(vec!["bob"])).unwrap())
        .verify(rows_equal(2))
        .options(AssertOptions::no_retry().page(2, 1));

    assert!(assertion.run(&mut person_db()).is_ok());
}

#[test]
fn options_load_from_toml() {
    let options = AssertOptions::from_toml_str(
        r#"
        retry_times = 0
        retry = false
        fail_if_not_found = false
        "#,
    )
    .unwrap();
    let assertion = Assertion::new("person")
        .filter(Filter::eq("id", 42))
        .verify(name_is("nobody"))
        .options(options);

    assert_eq!(
        assertion.run(&mut person_db()).unwrap().verdict,
        Verdict::NotFound
    );
}

#[test]
fn qualified_table_uses_attached_database() {
    let mut conn = person_db();
    conn.execute_batch("attach database ':memory:' as archive; create table archive.person (id integer, name text); insert into archive.person values (7, 'dave');")
        .unwrap();
    let assertion = Assertion::new(dbcheck_sql::TableRef::qualified("archive", "person"))
        .verify(name_is("dave"))
        .verify(rows_equal(1))
        .options(AssertOptions::no_retry());

    assert!(assertion.run(&mut conn).is_ok());
}
