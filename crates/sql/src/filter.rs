//! Row selection inputs: target table, filters, sorts and paging.

use serde::{Deserialize, Serialize};

use dbcheck_core::{Boundary, Comparator, EvalError, Expected, Value};

use crate::dialect::Dialect;

/// A table name, optionally qualified by its database/schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(default)]
    pub database: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        TableRef {
            database: None,
            name: name.into(),
        }
    }

    pub fn qualified(database: impl Into<String>, name: impl Into<String>) -> Self {
        TableRef {
            database: Some(database.into()),
            name: name.into(),
        }
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::new(name)
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        TableRef::new(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub column: String,
    #[serde(default)]
    pub order: Order,
}

impl Sort {
    pub fn asc(column: impl Into<String>) -> Self {
        Sort {
            column: column.into(),
            order: Order::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Sort {
            column: column.into(),
            order: Order::Desc,
        }
    }
}

/// Which page of the filtered rows the detail query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// 1-based index of the first row.
    pub start_index: u64,
    pub page_size: u64,
}

impl Paging {
    pub fn offset(&self) -> u64 {
        self.start_index.saturating_sub(1)
    }
}

impl Default for Paging {
    fn default() -> Self {
        Paging {
            start_index: 1,
            page_size: 100,
        }
    }
}

// ──────────────────────────────────────────────
// Filters
// ──────────────────────────────────────────────

/// One `WHERE` predicate: either structured, or caller-trusted SQL text.
#[derive(Debug, Clone)]
pub enum Filter {
    Column {
        column: String,
        comparator: Comparator,
        expected: Expected,
    },
    Raw(String),
}

impl Filter {
    pub fn new(column: impl Into<String>, comparator: Comparator, expected: impl Into<Expected>) -> Self {
        Filter::Column {
            column: column.into(),
            comparator,
            expected: expected.into(),
        }
    }

    /// `column = value`, or `column is null` for a null value.
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => Filter::new(column, Comparator::Null, Expected::None),
            v => Filter::new(column, Comparator::Equal, v),
        }
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => Filter::new(column, Comparator::NotNull, Expected::None),
            v => Filter::new(column, Comparator::NotEqual, v),
        }
    }

    pub fn between(column: impl Into<String>, boundary: Boundary) -> Self {
        Filter::new(column, Comparator::Between, boundary)
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Filter::Raw(sql.into())
    }

    /// Reject filters no dialect can render, before any query runs.
    pub fn validate(&self) -> Result<(), EvalError> {
        match self {
            Filter::Raw(sql) => validate_raw(sql),
            Filter::Column {
                column,
                comparator,
                expected,
            } => {
                if column.trim().is_empty() {
                    return Err(EvalError::configuration(
                        "filter column name must not be empty",
                    ));
                }
                argument(*comparator, expected).map(|_| ())
            }
        }
    }
}

/// Checks a raw clause is one balanced expression: no statement separator,
/// no comment, closed quotes, matched parentheses.
fn validate_raw(sql: &str) -> Result<(), EvalError> {
    let malformed = |why: &str| {
        Err(EvalError::configuration(format!(
            "malformed raw filter '{}': {}",
            sql, why
        )))
    };
    if sql.trim().is_empty() {
        return malformed("empty clause");
    }
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return malformed("unbalanced parentheses");
                    }
                }
                ';' => return malformed("statement separator"),
                '-' if chars.peek() == Some(&'-') => return malformed("comment"),
                '/' if chars.peek() == Some(&'*') => return malformed("comment"),
                '#' => return malformed("comment"),
                _ => {}
            },
        }
    }
    if quote.is_some() {
        return malformed("unterminated quote");
    }
    if depth != 0 {
        return malformed("unbalanced parentheses");
    }
    Ok(())
}

enum Argument<'a> {
    None,
    Scalar(&'a Value),
    List(&'a [Value]),
    Range(&'a Boundary),
}

fn argument(comparator: Comparator, expected: &Expected) -> Result<Argument<'_>, EvalError> {
    let unsupported = || {
        EvalError::configuration(format!(
            "unsupported filter comparator: {}",
            comparator
        ))
    };
    let wrong = |what: &str| {
        EvalError::configuration(format!("filter comparator {} requires {}", comparator, what))
    };
    match comparator {
        Comparator::Null | Comparator::NotNull | Comparator::IsTrue | Comparator::IsFalse => {
            match expected {
                Expected::None => Ok(Argument::None),
                _ => Err(wrong("no value")),
            }
        }
        Comparator::In | Comparator::NotIn => match expected.as_value().and_then(Value::as_list) {
            Some(items) if !items.is_empty() => Ok(Argument::List(items)),
            _ => Err(wrong("a non-empty list")),
        },
        Comparator::Between => match expected {
            Expected::Boundary(b) => Ok(Argument::Range(b)),
            _ => Err(wrong("a boundary")),
        },
        Comparator::Equal
        | Comparator::NotEqual
        | Comparator::GreaterThan
        | Comparator::GreaterThanOrEqual
        | Comparator::LessThan
        | Comparator::LessThanOrEqual
        | Comparator::Contains
        | Comparator::NotContain => match expected.as_value() {
            Some(Value::List(_)) | None => Err(wrong("a scalar value")),
            Some(v) => Ok(Argument::Scalar(v)),
        },
        _ => Err(unsupported()),
    }
}

/// Render one filter with `dialect`'s quoting and literal syntax.
pub fn render<D: Dialect + ?Sized>(dialect: &D, filter: &Filter) -> Result<String, EvalError> {
    let (column, comparator, expected) = match filter {
        Filter::Raw(sql) => {
            validate_raw(sql)?;
            return Ok(format!("({})", sql.trim()));
        }
        Filter::Column {
            column,
            comparator,
            expected,
        } => (column, *comparator, expected),
    };
    let col = dialect.quote_identifier(column);
    let arg = argument(comparator, expected)?;
    let sql = match (comparator, arg) {
        (Comparator::Null, _) => format!("{} is null", col),
        (Comparator::NotNull, _) => format!("{} is not null", col),
        (Comparator::IsTrue, _) => format!("{}=true", col),
        (Comparator::IsFalse, _) => format!("{}=false", col),
        (Comparator::Equal, Argument::Scalar(Value::Null)) => format!("{} is null", col),
        (Comparator::NotEqual, Argument::Scalar(Value::Null)) => format!("{} is not null", col),
        (Comparator::In, Argument::List(items)) => format!("{} in {}", col, in_list(dialect, items)?),
        (Comparator::NotIn, Argument::List(items)) => {
            format!("{} not in {}", col, in_list(dialect, items)?)
        }
        (Comparator::Contains, Argument::Scalar(v)) => {
            format!("{} like {}", col, like_pattern(dialect, v))
        }
        (Comparator::NotContain, Argument::Scalar(v)) => {
            format!("{} not like {}", col, like_pattern(dialect, v))
        }
        (Comparator::Between, Argument::Range(b)) => {
            let min = dialect.literal(&b.min)?;
            let max = dialect.literal(&b.max)?;
            if !b.exclude_min && !b.exclude_max {
                format!("{} between {} and {}", col, min, max)
            } else {
                format!(
                    "({}{}{} and {}{}{})",
                    col,
                    if b.exclude_min { ">" } else { ">=" },
                    min,
                    col,
                    if b.exclude_max { "<" } else { "<=" },
                    max
                )
            }
        }
        (op, Argument::Scalar(v)) => {
            let symbol = match op {
                Comparator::Equal => "=",
                Comparator::NotEqual => "!=",
                Comparator::GreaterThan => ">",
                Comparator::GreaterThanOrEqual => ">=",
                Comparator::LessThan => "<",
                Comparator::LessThanOrEqual => "<=",
                other => {
                    return Err(EvalError::configuration(format!(
                        "unsupported filter comparator: {}",
                        other
                    )))
                }
            };
            format!("{}{}{}", col, symbol, dialect.literal(v)?)
        }
        (other, _) => {
            return Err(EvalError::configuration(format!(
                "unsupported filter comparator: {}",
                other
            )))
        }
    };
    Ok(sql)
}

fn in_list<D: Dialect + ?Sized>(dialect: &D, items: &[Value]) -> Result<String, EvalError> {
    let rendered = items
        .iter()
        .map(|v| dialect.literal(v))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", rendered.join(",")))
}

/// `'%v%' escape '\'`, with `%`, `_` and the escape character in `v` matched
/// literally.
fn like_pattern<D: Dialect + ?Sized>(dialect: &D, value: &Value) -> String {
    let text = match value {
        Value::Text(s) => s.clone(),
        other => other.to_string(),
    };
    let mut pattern = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    format!(
        "'%{}%' escape '{}'",
        dialect.escape_text(&pattern),
        dialect.escape_text("\\")
    )
}
