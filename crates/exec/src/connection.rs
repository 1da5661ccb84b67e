use dbcheck_core::Value;

use crate::error::ConnectionError;

/// Column-labelled rows returned by one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        ResultSet { columns, rows }
    }

    /// Position of `label`, matched exactly first, then case-insensitively.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == label)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(label)))
    }

    /// Value of `label` in row `row`.
    pub fn get(&self, row: usize, label: &str) -> Result<&Value, ConnectionError> {
        let idx = self
            .column_index(label)
            .ok_or_else(|| ConnectionError::MissingColumn {
                column: label.to_string(),
            })?;
        self.rows
            .get(row)
            .and_then(|r| r.get(idx))
            .ok_or_else(|| ConnectionError::Backend(format!("row {} has no column {}", row, label)))
    }

    /// Every value of `label`, in row order.
    pub fn column(&self, label: &str) -> Result<Vec<Value>, ConnectionError> {
        let idx = self
            .column_index(label)
            .ok_or_else(|| ConnectionError::MissingColumn {
                column: label.to_string(),
            })?;
        Ok(self
            .rows
            .iter()
            .map(|r| r.get(idx).cloned().unwrap_or(Value::Null))
            .collect())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A live, already-open database connection.
///
/// The executor only runs parameterless `select` statements through it and
/// never opens, closes, pools or shares it.
pub trait Connection {
    /// Run one query and materialize its rows.
    fn query(&mut self, sql: &str) -> Result<ResultSet, ConnectionError>;

    /// Product name as the driver reports it (`"SQLite"`, `"MySQL"`, ...),
    /// used to pick the SQL dialect.
    fn product_name(&self) -> &str;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn query(&mut self, sql: &str) -> Result<ResultSet, ConnectionError> {
        (**self).query(sql)
    }

    fn product_name(&self) -> &str {
        (**self).product_name()
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn query(&mut self, sql: &str) -> Result<ResultSet, ConnectionError> {
        (**self).query(sql)
    }

    fn product_name(&self) -> &str {
        (**self).product_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_falls_back_to_case_insensitive() {
        let rs = ResultSet::new(
            vec!["Count".into(), "name".into()],
            vec![vec![Value::Int(2), Value::from("a")]],
        );
        assert_eq!(rs.get(0, "count").unwrap(), &Value::Int(2));
        assert_eq!(rs.column("name").unwrap(), vec![Value::from("a")]);
        assert!(matches!(
            rs.get(0, "age"),
            Err(ConnectionError::MissingColumn { .. })
        ));
    }
}
