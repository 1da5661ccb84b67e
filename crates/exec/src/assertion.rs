use dbcheck_core::{Condition, EvalError};
use dbcheck_sql::{Filter, QueryRequest, Sort, TableRef};

use crate::options::AssertOptions;

/// A finalized assertion: where to look, what to expect, how long to wait.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub table: TableRef,
    pub filters: Vec<Filter>,
    pub sorts: Vec<Sort>,
    pub conditions: Vec<Condition>,
    pub options: AssertOptions,
}

impl Assertion {
    pub fn new(table: impl Into<TableRef>) -> Self {
        Assertion {
            table: table.into(),
            filters: Vec::new(),
            sorts: Vec::new(),
            conditions: Vec::new(),
            options: AssertOptions::default(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn verify(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn options(mut self, options: AssertOptions) -> Self {
        self.options = options;
        self
    }

    /// Reject an assertion that can never succeed, before any query runs.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.table.name.trim().is_empty() {
            return Err(EvalError::configuration("table name must not be empty"));
        }
        if matches!(&self.table.database, Some(db) if db.trim().is_empty()) {
            return Err(EvalError::configuration(
                "database name must not be empty when given",
            ));
        }
        if self.conditions.is_empty() {
            return Err(EvalError::configuration(
                "assertion has no conditions to verify",
            ));
        }
        for sort in &self.sorts {
            if sort.column.trim().is_empty() {
                return Err(EvalError::configuration("sort column must not be empty"));
            }
        }
        for filter in &self.filters {
            filter.validate()?;
        }
        self.options.validate()
    }

    pub fn request(&self) -> QueryRequest<'_> {
        QueryRequest {
            table: &self.table,
            filters: &self.filters,
            sorts: &self.sorts,
            paging: self.options.paging(),
            conditions: &self.conditions,
        }
    }
}
