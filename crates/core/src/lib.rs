//! dbcheck-core: condition model and typed comparison engine.
//!
//! A [`Condition`] describes one expectation about a query result: a column's
//! value in every row, an aggregate over a column, the whole list of a
//! column's values, or the number of matching rows. [`tester::test`] decides
//! whether an observed [`Value`] satisfies it, and [`message::render`] turns a
//! failed condition into a self-describing message.
//!
//! # Public API
//!
//! - [`Value`] -- closed tagged runtime value
//! - [`Comparator`], [`Aggregate`] -- closed comparator and aggregate sets
//! - [`Condition`], [`Boundary`], [`Expected`], [`Predicate`] -- condition model
//! - [`EvalError`] -- configuration and data-format errors

pub mod aggregate;
pub mod coerce;
pub mod comparator;
pub mod condition;
pub mod error;
pub mod message;
pub mod tester;
pub mod value;

pub use aggregate::Aggregate;
pub use comparator::{Comparator, Family};
pub use condition::{
    Boundary, Condition, ConditionKind, Expected, Predicate, ROW_COUNT_ALIAS, ROW_COUNT_COLUMN,
    ROW_COUNT_LABEL,
};
pub use error::EvalError;
pub use tester::{test, test_condition};
pub use value::Value;
