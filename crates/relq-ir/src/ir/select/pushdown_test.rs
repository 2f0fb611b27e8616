use super::*;
use crate::ir::expr::BinOp;
use crate::ir::select::OrderDirection;
use crate::ir::table::TableRef;
use crate::source::QuerySource;
use crate::test_utils::*;
use relq_core::{Nullability, SqlType};

fn names(entries: &[ExprRef]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.projection_name().unwrap_or("?").to_string())
        .collect()
}

fn assert_reference(expr: &ExprRef, table: &str, name: &str) {
    let SqlExpr::ColumnReference(reference) = expr.as_ref() else {
        panic!("expected a reference to {table}.{name}, got {expr:?}");
    };
    assert_eq!(reference.table().alias(), table);
    assert_eq!(reference.name(), name);
}

/// `SELECT o.Id, o.CustomerId FROM Orders o ORDER BY o.Id`
fn ordered_orders(ctx: &mut CompilationContext) -> (SelectExpression, QuerySource) {
    let catalog = catalog();
    let (mut select, o) = orders_select(ctx, &catalog);
    let id = prop(&catalog, "Order", "Id");
    select.add_property_to_projection(&id, &o);
    select.add_property_to_projection(&prop(&catalog, "Order", "CustomerId"), &o);
    let key = select.bind_property(&id, &o).unwrap();
    select.add_to_order_by(Ordering::asc(key));
    (select, o)
}

#[test]
fn test_push_down_moves_body() {
    let mut ctx = make_ctx();
    let (mut select, o) = ordered_orders(&mut ctx);
    let filter = SqlExpr::binary(
        BinOp::Gt,
        select.projection()[0].clone(),
        SqlExpr::int(5),
    );
    select.add_to_predicate(Arc::clone(&filter));
    let grouping = select.projection()[1].clone();
    select.add_to_group_by([grouping]);
    select.set_limit(&mut ctx, Some(SqlExpr::int(10)));

    let subquery = select.push_down_subquery(&mut ctx);
    assert_eq!(subquery.alias(), Some("t"));
    assert!(!subquery.is_project_star());
    assert_eq!(names(subquery.projection()), ["Id", "CustomerId"]);
    assert_eq!(subquery.tables().len(), 1);
    assert_eq!(subquery.predicate(), Some(&filter));
    assert_eq!(subquery.group_by().len(), 1);
    assert_eq!(subquery.limit(), Some(&SqlExpr::int(10)));
    // Paged, so the ordering stays
    assert_eq!(subquery.order_by().len(), 1);

    assert!(select.is_project_star());
    assert!(select.projection().is_empty());
    assert_eq!(select.star_projection().len(), 2);
    assert_reference(&select.star_projection()[0], "t", "Id");
    assert_reference(&select.star_projection()[1], "t", "CustomerId");
    assert!(select.predicate().is_none());
    assert!(select.group_by().is_empty());
    assert!(select.limit().is_none());
    assert!(select.order_by().is_empty());
    assert_eq!(select.project_star_table().and_then(|t| t.alias()), Some("t"));
    assert!(select.handles_query_source(&o));

    let lifted = select.bind_subquery_projection_index(1, &o).unwrap();
    assert_reference(&lifted, "t", "CustomerId");
    assert!(select.bind_subquery_projection_index(5, &o).is_none());
}

#[test]
fn test_push_down_drops_unpaged_ordering() {
    let mut ctx = make_ctx();
    let (mut select, _) = ordered_orders(&mut ctx);
    let subquery = select.push_down_subquery(&mut ctx);
    assert!(subquery.order_by().is_empty());
}

#[test]
fn test_push_down_of_empty_projection_is_star() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, _) = orders_select(&mut ctx, &catalog);
    let subquery = select.push_down_subquery(&mut ctx);
    assert!(subquery.is_project_star());
    assert!(subquery.projection().is_empty());
    assert!(select.star_projection().is_empty());
}

#[test]
fn test_push_down_in_star_mode_moves_both_lists() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, o) = orders_select(&mut ctx, &catalog);
    select.set_project_star(true);
    let id = select.bind_property(&prop(&catalog, "Order", "Id"), &o).unwrap();

    let other_id =
        SqlExpr::column_named("Id", &TableRef::new("x", None), SqlType::int(), Nullability::NotNull)
            .unwrap();
    select.add_to_projection(other_id, false);
    select.add_to_projection(SqlExpr::binary(BinOp::Plus, id, SqlExpr::int(1)), false);
    assert!(select.is_project_star());

    let subquery = select.push_down_subquery(&mut ctx);
    assert!(subquery.is_project_star());
    assert_eq!(names(subquery.star_projection()), ["Id"]);
    // Names are unique across both lists
    assert_eq!(names(subquery.projection()), ["Id0", "c"]);

    assert_eq!(names(select.star_projection()), ["Id", "Id0", "c"]);
    for entry in select.star_projection() {
        assert_eq!(entry.table_ref().map(TableRef::alias), Some("t"));
    }
}

#[test]
fn test_push_down_keeps_aliased_ordering() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, o) = orders_select(&mut ctx, &catalog);
    let freight = select
        .bind_property(&prop(&catalog, "Order", "Freight"), &o)
        .unwrap();
    let doubled = SqlExpr::binary(BinOp::Multiply, freight, SqlExpr::int(2));
    select.add_to_order_by(Ordering::desc(Arc::clone(&doubled)));
    select.add_to_projection(doubled, true);
    select.set_offset(&mut ctx, Some(SqlExpr::int(5)));

    let subquery = select.push_down_subquery(&mut ctx);
    assert_eq!(names(subquery.projection()), ["c"]);
    assert_eq!(subquery.order_by().len(), 1);
    assert_eq!(subquery.order_by()[0].expression, subquery.projection()[0]);
    assert_eq!(subquery.order_by()[0].direction, OrderDirection::Descending);
    assert_reference(&select.star_projection()[0], "t", "c");
}

#[test]
fn test_push_down_repoints_member_mapping() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, o) = orders_select(&mut ctx, &catalog);
    let id = prop(&catalog, "Order", "Id");
    select.add_property_to_projection(&id, &o);
    let column = select.bind_property(&id, &o).unwrap();
    select.set_projection_for_member("OrderId", column);

    select.push_down_subquery(&mut ctx);

    let mapped = select.get_projection_for_member("OrderId").unwrap();
    assert_reference(mapped, "t", "OrderId");
    assert_eq!(&select.star_projection()[0], mapped);
}

#[test]
fn test_limit_alone_does_not_push_down() {
    let mut ctx = make_ctx();
    let (mut select, _) = ordered_orders(&mut ctx);

    select.set_limit(&mut ctx, Some(SqlExpr::int(10)));
    assert!(matches!(select.tables()[0], TableExpr::Table(_)));
    assert_eq!(select.limit(), Some(&SqlExpr::int(10)));

    // Clearing never pushes down
    select.set_limit(&mut ctx, None);
    select.set_offset(&mut ctx, None);
    assert!(matches!(select.tables()[0], TableExpr::Table(_)));
    assert!(select.limit().is_none());
}

#[test]
fn test_offset_after_limit_pushes_down() {
    let mut ctx = make_ctx();
    let (mut select, _) = ordered_orders(&mut ctx);
    select.set_limit(&mut ctx, Some(SqlExpr::int(10)));
    select.set_offset(&mut ctx, Some(SqlExpr::int(5)));

    assert_eq!(select.offset(), Some(&SqlExpr::int(5)));
    assert!(select.limit().is_none());
    let subquery = select.tables()[0].as_select().unwrap();
    assert_eq!(subquery.limit(), Some(&SqlExpr::int(10)));
    assert!(subquery.offset().is_none());

    // Ordering is carried up to the wrapper
    assert_eq!(select.order_by().len(), 1);
    assert_reference(&select.order_by()[0].expression, "t", "Id");
}

#[test]
fn test_second_limit_nests_again() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, o) = ordered_orders(&mut ctx);

    select.set_offset(&mut ctx, Some(SqlExpr::int(5)));
    select.set_limit(&mut ctx, Some(SqlExpr::int(10)));
    select.set_limit(&mut ctx, Some(SqlExpr::int(20)));

    assert_eq!(select.limit(), Some(&SqlExpr::int(20)));
    assert!(select.offset().is_none());

    let middle = select.tables()[0].as_select().unwrap();
    assert_eq!(middle.alias(), Some("t0"));
    assert_eq!(middle.limit(), Some(&SqlExpr::int(10)));
    assert!(middle.offset().is_none());
    assert!(middle.is_project_star());

    let inner = middle.tables()[0].as_select().unwrap();
    assert_eq!(inner.alias(), Some("t"));
    assert_eq!(inner.offset(), Some(&SqlExpr::int(5)));
    assert!(inner.limit().is_none());
    assert_eq!(inner.tables()[0].alias(), Some("o"));

    assert_eq!(select.order_by().len(), 1);
    assert_eq!(select.order_by()[0].direction, OrderDirection::Ascending);
    assert_reference(&select.order_by()[0].expression, "t0", "Id");

    // Types are read through both levels
    let types = select.get_projection_types();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0].property, Some(prop(&catalog, "Order", "Id")));
    assert_eq!(types[1].nullability, Nullability::Nullable);

    // Binding through both levels reuses the star entry
    let bound = select
        .bind_property(&prop(&catalog, "Order", "Id"), &o)
        .unwrap();
    assert!(Arc::ptr_eq(&bound, &select.star_projection()[0]));
    assert_eq!(select.star_projection().len(), 2);
}

#[test]
fn test_lift_projects_computed_ordering() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, o) = orders_select(&mut ctx, &catalog);
    let freight = select
        .bind_property(&prop(&catalog, "Order", "Freight"), &o)
        .unwrap();
    select.add_to_order_by(Ordering::desc(SqlExpr::binary(
        BinOp::Multiply,
        freight,
        SqlExpr::int(2),
    )));

    select.set_offset(&mut ctx, Some(SqlExpr::int(5)));
    select.set_limit(&mut ctx, Some(SqlExpr::int(10)));
    select.set_limit(&mut ctx, Some(SqlExpr::int(3)));

    let middle = select.tables()[0].as_select().unwrap();
    assert!(middle.projection().is_empty());
    assert_eq!(names(middle.star_projection()), ["c"]);

    // The computed key was projected where it is evaluated
    let inner = middle.tables()[0].as_select().unwrap();
    assert!(inner.is_project_star());
    assert_eq!(names(inner.projection()), ["c"]);
    assert_eq!(inner.order_by()[0].expression, inner.projection()[0]);

    assert_eq!(select.order_by().len(), 1);
    assert_eq!(select.order_by()[0].direction, OrderDirection::Descending);
    assert_reference(&select.order_by()[0].expression, "t0", "c");
}

#[test]
fn test_lift_order_by_without_subquery_is_noop() {
    let mut ctx = make_ctx();
    let (mut select, _) = ordered_orders(&mut ctx);
    select.lift_order_by();
    assert_eq!(select.order_by().len(), 1);
}

#[test]
fn test_distinct_prunes_unprojected_orderings() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, o) = ordered_orders(&mut ctx);
    let customer_id = select
        .bind_property(&prop(&catalog, "Order", "CustomerId"), &o)
        .unwrap();
    let freight = select
        .bind_property(&prop(&catalog, "Order", "Freight"), &o)
        .unwrap();
    select.add_to_order_by(Ordering::desc(SqlExpr::nullable(customer_id)));
    select.add_to_order_by(Ordering::asc(freight));

    select.set_distinct(&mut ctx, true);

    assert!(select.is_distinct());
    assert_eq!(select.order_by().len(), 2);
    assert!(matches!(select.tables()[0], TableExpr::Table(_)));
    assert!(select
        .order_by()
        .iter()
        .all(|ordering| {
            ordering.expression.find_property().map(|p| p.name.as_str()) != Some("Freight")
        }));
}

#[test]
fn test_distinct_keeps_star_bound_ordering() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, o) = orders_select(&mut ctx, &catalog);
    select.set_project_star(true);
    let freight = select
        .bind_property(&prop(&catalog, "Order", "Freight"), &o)
        .unwrap();
    select.add_to_order_by(Ordering::asc(freight));

    select.set_distinct(&mut ctx, true);
    assert_eq!(select.order_by().len(), 1);
}

#[test]
fn test_distinct_over_paged_result_pushes_down() {
    let mut ctx = make_ctx();
    let (mut select, _) = ordered_orders(&mut ctx);
    select.set_limit(&mut ctx, Some(SqlExpr::int(10)));

    select.set_distinct(&mut ctx, false);
    assert!(matches!(select.tables()[0], TableExpr::Table(_)));

    select.set_distinct(&mut ctx, true);
    assert!(select.is_distinct());
    assert!(select.limit().is_none());
    let subquery = select.tables()[0].as_select().unwrap();
    assert!(!subquery.is_distinct());
    assert_eq!(subquery.limit(), Some(&SqlExpr::int(10)));
    assert_eq!(subquery.order_by().len(), 1);
}

#[test]
fn test_explode_star_projection() {
    let mut ctx = make_ctx();
    let (mut select, _) = ordered_orders(&mut ctx);

    select.explode_star_projection();
    assert_eq!(names(select.projection()), ["Id", "CustomerId"]);

    select.push_down_subquery(&mut ctx);
    select.explode_star_projection();
    assert!(!select.is_project_star());
    assert!(select.star_projection().is_empty());
    assert_eq!(select.projection().len(), 2);
    assert_reference(&select.projection()[0], "t", "Id");
    assert_reference(&select.projection()[1], "t", "CustomerId");
}

#[test]
fn test_star_subquery_over_join_names_outputs_uniquely() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut select, o) = orders_select(&mut ctx, &catalog);
    let c = ctx.new_query_source("c");
    let customers = entity_table(&mut ctx, &catalog, "Customer", &c);
    select.add_cross_join(customers, Vec::new());
    select.push_down_subquery(&mut ctx);

    let order_id = select
        .bind_property(&prop(&catalog, "Order", "Id"), &o)
        .unwrap();
    let customer_id = select
        .bind_property(&prop(&catalog, "Customer", "Id"), &c)
        .unwrap();
    assert_reference(&order_id, "t", "Id");
    assert_reference(&customer_id, "t", "Id0");
    assert_ne!(order_id.to_string(), customer_id.to_string());

    let subquery = select.tables()[0].as_select().unwrap();
    assert_eq!(names(subquery.star_projection()), ["Id", "Id0"]);

    // Rebinding reuses the renamed entry
    let again = select
        .bind_property(&prop(&catalog, "Customer", "Id"), &c)
        .unwrap();
    assert!(Arc::ptr_eq(&again, &customer_id));
    let subquery = select.tables()[0].as_select().unwrap();
    assert_eq!(subquery.star_projection().len(), 2);
}
