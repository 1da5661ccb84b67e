//! SQL dialects: identifier quoting, literal rendering, aggregate syntax and
//! paging for one database product.

use dbcheck_core::{Aggregate, EvalError, Value};

use crate::filter::{self, Filter, TableRef};

/// One backend's SQL flavour.
///
/// Only `name`, `quote_char` and `paging` are required; every other method has
/// a default that renders ANSI-style SQL and can be overridden per backend.
pub trait Dialect: Send + Sync {
    /// Lower-case product name this dialect is registered under
    /// (`"mysql"`, `"sqlite"`, `"postgresql"`).
    fn name(&self) -> &'static str;

    /// Character that opens and closes a quoted identifier.
    fn quote_char(&self) -> char;

    /// `LIMIT` clause (with a leading space) for `limit` rows after skipping
    /// `offset` rows.
    fn paging(&self, limit: u64, offset: u64) -> String;

    fn quote_identifier(&self, ident: &str) -> String {
        let q = self.quote_char();
        let mut doubled = String::with_capacity(2);
        doubled.push(q);
        doubled.push(q);
        format!("{}{}{}", q, ident.replace(q, &doubled), q)
    }

    fn quote_table(&self, table: &TableRef) -> String {
        match &table.database {
            Some(db) => format!(
                "{}.{}",
                self.quote_identifier(db),
                self.quote_identifier(&table.name)
            ),
            None => self.quote_identifier(&table.name),
        }
    }

    /// Escape the body of a single-quoted string literal.
    fn escape_text(&self, text: &str) -> String {
        text.replace('\'', "''")
    }

    /// Render a scalar as a SQL literal.
    fn literal(&self, value: &Value) -> Result<String, EvalError> {
        match value {
            Value::Null => Ok("null".to_string()),
            Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Decimal(d) => Ok(d.to_string()),
            Value::Float(x) if x.is_finite() => Ok(x.to_string()),
            Value::Float(x) => Err(EvalError::configuration(format!(
                "{} can not be rendered as a SQL literal",
                x
            ))),
            Value::Text(s) => Ok(format!("'{}'", self.escape_text(s))),
            Value::List(_) => Err(EvalError::configuration(
                "a list can not be rendered as a scalar SQL literal",
            )),
        }
    }

    /// `count(*) as "count"`: the row-count expression of the aggregate query.
    fn row_count_expression(&self, label: &str) -> String {
        format!("count(*) as {}", self.quote_identifier(label))
    }

    /// One aggregate select item, labelled with [`Aggregate::label`].
    fn aggregate_expression(&self, aggregate: Aggregate, column: &str) -> String {
        let col = self.quote_identifier(column);
        let expr = match aggregate {
            Aggregate::Count => format!("count({})", col),
            Aggregate::DistinctCount => format!("count(distinct {})", col),
            Aggregate::Sum => format!("sum({})", col),
            Aggregate::Avg => format!("avg({})", col),
            Aggregate::Min => format!("min({})", col),
            Aggregate::Max => format!("max({})", col),
        };
        format!(
            "{} as {}",
            expr,
            self.quote_identifier(&aggregate.label(column))
        )
    }

    /// `WHERE` clause (with a leading space) joining rendered predicates.
    fn where_clause(&self, predicates: &[String]) -> String {
        if predicates.is_empty() {
            String::new()
        } else {
            format!(" where {}", predicates.join(" and "))
        }
    }

    fn render_filter(&self, filter: &Filter) -> Result<String, EvalError> {
        filter::render(self, filter)
    }

    /// Whether the aggregate query may carry the detail query's `ORDER BY`.
    fn aggregate_accepts_order_by(&self) -> bool {
        true
    }
}

// ──────────────────────────────────────────────
// Built-in dialects
// ──────────────────────────────────────────────

/// MySQL and MariaDB: backtick quoting, `where 1`, `limit <offset>,<n>`, and
/// no `ORDER BY` on the aggregate query.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn paging(&self, limit: u64, offset: u64) -> String {
        if offset > 0 {
            format!(" limit {},{}", offset, limit)
        } else {
            format!(" limit {}", limit)
        }
    }

    fn escape_text(&self, text: &str) -> String {
        text.replace('\\', "\\\\").replace('\'', "''")
    }

    fn where_clause(&self, predicates: &[String]) -> String {
        let mut clause = String::from(" where 1");
        for p in predicates {
            clause.push_str(" and ");
            clause.push_str(p);
        }
        clause
    }

    /// `ONLY_FULL_GROUP_BY` rejects ordering an ungrouped aggregate by a
    /// plain column.
    fn aggregate_accepts_order_by(&self) -> bool {
        false
    }
}

/// SQLite: double-quote quoting, `LIMIT n OFFSET m`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn paging(&self, limit: u64, offset: u64) -> String {
        limit_offset(limit, offset)
    }
}

/// PostgreSQL: double-quote quoting, `LIMIT n OFFSET m`, and no `ORDER BY`
/// on the aggregate query (ungrouped columns are rejected there).
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn paging(&self, limit: u64, offset: u64) -> String {
        limit_offset(limit, offset)
    }

    fn aggregate_accepts_order_by(&self) -> bool {
        false
    }
}

fn limit_offset(limit: u64, offset: u64) -> String {
    if offset > 0 {
        format!(" limit {} offset {}", limit, offset)
    } else {
        format!(" limit {}", limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quote_chars() {
        assert_eq!(MySql.quote_identifier("a`b"), "`a``b`");
        assert_eq!(Sqlite.quote_identifier("na\"me"), "\"na\"\"me\"");
    }

    #[test]
    fn qualified_tables_quote_both_parts() {
        let t = TableRef::qualified("shop", "person");
        assert_eq!(MySql.quote_table(&t), "`shop`.`person`");
        assert_eq!(Postgres.quote_table(&TableRef::new("person")), "\"person\"");
    }

    #[test]
    fn aggregate_expressions_carry_prefixed_labels() {
        assert_eq!(
            MySql.aggregate_expression(Aggregate::DistinctCount, "name"),
            "count(distinct `name`) as `dc_name`"
        );
        assert_eq!(
            Sqlite.aggregate_expression(Aggregate::Avg, "age"),
            "avg(\"age\") as \"avg_age\""
        );
    }

    #[test]
    fn paging_per_dialect() {
        assert_eq!(MySql.paging(100, 0), " limit 100");
        assert_eq!(MySql.paging(10, 20), " limit 20,10");
        assert_eq!(Sqlite.paging(10, 20), " limit 10 offset 20");
    }

    #[test]
    fn literals_escape_quotes() {
        assert_eq!(Sqlite.literal(&Value::from("o'neil")).unwrap(), "'o''neil'");
        assert_eq!(MySql.literal(&Value::from("a\\b")).unwrap(), "'a\\\\b'");
        assert!(Sqlite.literal(&Value::from(vec![1])).is_err());
        assert!(Sqlite.literal(&Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn where_clauses() {
        let preds = vec!["a=1".to_string(), "b=2".to_string()];
        assert_eq!(MySql.where_clause(&[]), " where 1");
        assert_eq!(MySql.where_clause(&preds), " where 1 and a=1 and b=2");
        assert_eq!(Sqlite.where_clause(&[]), "");
        assert_eq!(Sqlite.where_clause(&preds), " where a=1 and b=2");
    }

    #[test]
    fn only_sqlite_orders_the_aggregate_query() {
        assert!(!MySql.aggregate_accepts_order_by());
        assert!(!Postgres.aggregate_accepts_order_by());
        assert!(Sqlite.aggregate_accepts_order_by());
    }
}
