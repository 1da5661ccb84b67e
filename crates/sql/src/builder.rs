//! Turns a finalized condition set into the detail and aggregate queries.

use dbcheck_core::{Aggregate, Condition, ConditionKind, EvalError, ROW_COUNT_LABEL};

use crate::dialect::Dialect;
use crate::filter::{Filter, Paging, Sort, TableRef};
use crate::groups::ColumnGroups;

/// Everything the builder needs to render one assertion's SQL.
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    pub table: &'a TableRef,
    pub filters: &'a [Filter],
    pub sorts: &'a [Sort],
    pub paging: Paging,
    pub conditions: &'a [Condition],
}

/// The rendered queries plus the grouped conditions they serve.
///
/// Built once per assertion run and re-executed unchanged on every attempt.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Raw rows for per-row and list conditions; `None` when only row-count
    /// and aggregate conditions exist.
    pub detail_sql: Option<String>,
    /// `count(*)` plus one expression per distinct aggregate.
    pub aggregate_sql: String,
    pub row_conditions: Vec<Condition>,
    /// Aggregate conditions in declaration order; evaluated in this order.
    pub aggregate_conditions: Vec<Condition>,
    /// List conditions in declaration order; evaluated in this order.
    pub list_conditions: Vec<Condition>,
    pub aggregate_columns: ColumnGroups,
    pub plain_columns: ColumnGroups,
    pub list_columns: ColumnGroups,
    /// Columns selected by the detail query, in declaration order.
    pub selected_columns: Vec<String>,
}

/// Render the [`QueryPlan`] for `request` in `dialect`.
pub fn build(dialect: &dyn Dialect, request: &QueryRequest<'_>) -> Result<QueryPlan, EvalError> {
    if request.table.name.trim().is_empty() {
        return Err(EvalError::configuration("table name must not be empty"));
    }
    if request.paging.page_size == 0 {
        return Err(EvalError::configuration("page size must be at least 1"));
    }

    let mut row_conditions = Vec::new();
    let mut aggregate_conditions = Vec::new();
    let mut list_conditions = Vec::new();
    let mut aggregate_columns = ColumnGroups::default();
    let mut plain_columns = ColumnGroups::default();
    let mut list_columns = ColumnGroups::default();
    let mut selected_columns: Vec<String> = Vec::new();
    let mut aggregates: Vec<(Aggregate, String)> = Vec::new();

    for condition in request.conditions {
        match condition.kind() {
            ConditionKind::RowCount => row_conditions.push(condition.clone()),
            ConditionKind::Aggregate(agg) => {
                let key = (agg, condition.column().to_string());
                if !aggregates.contains(&key) {
                    aggregates.push(key);
                }
                aggregate_conditions.push(condition.clone());
                aggregate_columns.push(condition.clone());
            }
            ConditionKind::Plain | ConditionKind::List => {
                if !selected_columns.iter().any(|c| c == condition.column()) {
                    selected_columns.push(condition.column().to_string());
                }
                if condition.kind() == ConditionKind::Plain {
                    plain_columns.push(condition.clone());
                } else {
                    list_conditions.push(condition.clone());
                    list_columns.push(condition.clone());
                }
            }
        }
    }

    let predicates = request
        .filters
        .iter()
        .map(|f| dialect.render_filter(f))
        .collect::<Result<Vec<_>, _>>()?;
    let from = format!(
        " from {}{}",
        dialect.quote_table(request.table),
        dialect.where_clause(&predicates)
    );
    let order_by = render_order_by(dialect, request.sorts);

    let detail_sql = if selected_columns.is_empty() {
        None
    } else {
        let columns = selected_columns
            .iter()
            .map(|c| dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(",");
        Some(format!(
            "select {}{}{}{}",
            columns,
            from,
            order_by,
            dialect.paging(request.paging.page_size, request.paging.offset())
        ))
    };

    let mut select_items = vec![dialect.row_count_expression(ROW_COUNT_LABEL)];
    select_items.extend(
        aggregates
            .iter()
            .map(|(agg, col)| dialect.aggregate_expression(*agg, col)),
    );
    let aggregate_sql = format!(
        "select {}{}{}{}",
        select_items.join(","),
        from,
        if dialect.aggregate_accepts_order_by() {
            order_by.as_str()
        } else {
            ""
        },
        dialect.paging(request.paging.page_size, 0)
    );

    Ok(QueryPlan {
        detail_sql,
        aggregate_sql,
        row_conditions,
        aggregate_conditions,
        list_conditions,
        aggregate_columns,
        plain_columns,
        list_columns,
        selected_columns,
    })
}

fn render_order_by(dialect: &dyn Dialect, sorts: &[Sort]) -> String {
    if sorts.is_empty() {
        return String::new();
    }
    let items = sorts
        .iter()
        .map(|s| match s.order {
            crate::filter::Order::Asc => dialect.quote_identifier(&s.column),
            crate::filter::Order::Desc => format!("{} desc", dialect.quote_identifier(&s.column)),
        })
        .collect::<Vec<_>>();
    format!(" order by {}", items.join(","))
}
