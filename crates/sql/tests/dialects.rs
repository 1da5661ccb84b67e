//! One assertion rendered by every built-in dialect, resolved the way the
//! executor resolves them: by the product name a connection reports.

use dbcheck_core::{Aggregate, Boundary, Comparator, Condition, Value};
use dbcheck_sql::{build, DialectRegistry, Filter, Paging, QueryPlan, QueryRequest, Sort, TableRef};

fn plan_for(product: &str) -> QueryPlan {
    let registry = DialectRegistry::with_defaults();
    let dialect = registry.resolve(product).unwrap();
    let table = TableRef::qualified("shop", "orders");
    let filters = [
        Filter::eq("status", "paid"),
        Filter::between("total", Boundary::with_exclusions(10, true, 100, false).unwrap()),
    ];
    let sorts = [Sort::desc("created_at")];
    let conditions = [
        Condition::new("customer", Comparator::NotEqual, Value::from("o'brien")).unwrap(),
        Condition::aggregate(Aggregate::Avg, "total", Comparator::GreaterThan, Value::from(20))
            .unwrap(),
    ];
    build(
        dialect.as_ref(),
        &QueryRequest {
            table: &table,
            filters: &filters,
            sorts: &sorts,
            paging: Paging {
                start_index: 11,
                page_size: 10,
            },
            conditions: &conditions,
        },
    )
    .unwrap()
}

#[test]
fn mysql_and_mariadb_share_a_dialect() {
    for product in ["MySQL", "MariaDB"] {
        let plan = plan_for(product);
        assert_eq!(
            plan.detail_sql.as_deref(),
            Some(
                "select `customer` from `shop`.`orders` where 1 and `status`='paid' and (`total`>10 and `total`<=100) order by `created_at` desc limit 10,10"
            )
        );
        assert_eq!(
            plan.aggregate_sql,
            "select count(*) as `count`,avg(`total`) as `avg_total` from `shop`.`orders` where 1 and `status`='paid' and (`total`>10 and `total`<=100) limit 10"
        );
    }
}

#[test]
fn sqlite_uses_limit_offset() {
    let plan = plan_for("SQLite");
    assert_eq!(
        plan.detail_sql.as_deref(),
        Some(
            "select \"customer\" from \"shop\".\"orders\" where \"status\"='paid' and (\"total\">10 and \"total\"<=100) order by \"created_at\" desc limit 10 offset 10"
        )
    );
}

#[test]
fn postgres_drops_order_by_from_the_aggregate_query() {
    let plan = plan_for("PostgreSQL");
    assert_eq!(
        plan.aggregate_sql,
        "select count(*) as \"count\",avg(\"total\") as \"avg_total\" from \"shop\".\"orders\" where \"status\"='paid' and (\"total\">10 and \"total\"<=100) limit 10"
    );
}

#[test]
fn unknown_products_are_rejected() {
    assert!(DialectRegistry::with_defaults().resolve("db2").is_err());
}
