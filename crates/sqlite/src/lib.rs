//! dbcheck-sqlite: a [`Connection`] over an embedded SQLite database.
//!
//! Wraps a `rusqlite::Connection` and materializes every result row into
//! [`Value`]s. Used for local checks and to run the backend conformance
//! suite.

use std::path::Path;

use dbcheck_core::Value;
use dbcheck_exec::{Connection, ConnectionError, ResultSet};
use rusqlite::types::ValueRef;

const TARGET: &str = "dbcheck::sqlite";

/// Product name reported to the executor's dialect registry.
pub const PRODUCT_NAME: &str = "SQLite";

pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    pub fn open_in_memory() -> Result<Self, ConnectionError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(backend)?;
        Ok(SqliteConnection { conn })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConnectionError> {
        let conn = rusqlite::Connection::open(path).map_err(backend)?;
        Ok(SqliteConnection { conn })
    }

    /// Run a batch of statements (schema setup, fixtures, writes from a test).
    pub fn execute_batch(&self, sql: &str) -> Result<(), ConnectionError> {
        self.conn.execute_batch(sql).map_err(|e| ConnectionError::Query {
            sql: sql.to_string(),
            message: e.to_string(),
        })
    }

    /// The wrapped connection, for writes the caller makes between runs.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl From<rusqlite::Connection> for SqliteConnection {
    fn from(conn: rusqlite::Connection) -> Self {
        SqliteConnection { conn }
    }
}

impl Connection for SqliteConnection {
    fn query(&mut self, sql: &str) -> Result<ResultSet, ConnectionError> {
        let failed = |e: rusqlite::Error| ConnectionError::Query {
            sql: sql.to_string(),
            message: e.to_string(),
        };
        let mut stmt = self.conn.prepare(sql).map_err(failed)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(failed)?;
        while let Some(row) = cursor.next().map_err(failed)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(to_value(row.get_ref(i).map_err(failed)?)?);
            }
            rows.push(values);
        }
        tracing::trace!(target: TARGET, rows = rows.len(), "query returned");
        Ok(ResultSet::new(columns, rows))
    }

    fn product_name(&self) -> &str {
        PRODUCT_NAME
    }
}

fn to_value(value: ValueRef<'_>) -> Result<Value, ConnectionError> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| ConnectionError::Backend(format!("invalid UTF-8 text: {}", e)))?
                .to_string(),
        ),
        ValueRef::Blob(_) => {
            return Err(ConnectionError::Backend(
                "blob columns are not supported".to_string(),
            ))
        }
    })
}

fn backend(e: rusqlite::Error) -> ConnectionError {
    ConnectionError::Backend(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_map_to_values() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "create table t (i integer, r real, s text, n text);
             insert into t values (1, 2.5, 'x', null);",
        )
        .unwrap();
        let rs = conn.query("select i, r, s, n from t").unwrap();
        assert_eq!(rs.columns, vec!["i", "r", "s", "n"]);
        assert_eq!(
            rs.rows,
            vec![vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Null
            ]]
        );
    }

    #[test]
    fn aliases_become_column_labels() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        let rs = conn.query("select count(*) as \"count\"").unwrap();
        assert_eq!(rs.get(0, "count").unwrap(), &Value::Int(1));
    }

    #[test]
    fn writes_through_the_wrapped_connection_are_visible() {
        let mut conn = SqliteConnection::open(":memory:").unwrap();
        conn.inner()
            .execute_batch("create table t (s text); insert into t values ('late');")
            .unwrap();
        let rs = conn.query("select s from t").unwrap();
        assert_eq!(rs.rows, vec![vec![Value::from("late")]]);
    }

    #[test]
    fn bad_sql_is_a_query_error() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        let err = conn.query("select * from missing").unwrap_err();
        assert!(matches!(err, ConnectionError::Query { .. }));
    }
}
