use super::*;
use crate::error::IrError;
use crate::test_utils::*;
use relq_core::{Nullability, SqlType};
use std::sync::Arc;

#[test]
fn test_table_requires_name_and_alias() {
    let mut ctx = make_ctx();
    let source = ctx.new_query_source("o");

    let table = TableExpr::table("Orders", Some("dbo".into()), "o", source.clone()).unwrap();
    assert_eq!(table.alias(), Some("o"));
    assert_eq!(table.query_source(), Some(&source));
    assert!(matches!(&table, TableExpr::Table(t) if t.schema() == Some("dbo")));

    assert!(matches!(
        TableExpr::table("", None, "o", source.clone()),
        Err(IrError::EmptyArgument {
            node: "Table",
            argument: "name"
        })
    ));
    assert!(TableExpr::table("Orders", None, " ", source.clone()).is_err());
    assert!(TableExpr::table("Orders", Some(String::new()), "o", source.clone()).is_err());
    assert!(TableExpr::from_sql("", vec![], "f", source).is_err());
}

#[test]
fn test_table_valued_function_needs_function_call() {
    let mut ctx = make_ctx();
    let source = ctx.new_query_source("f");

    let call = SqlExpr::function("split", SqlType::varchar())
        .argument(SqlExpr::string("a,b"))
        .build()
        .unwrap();
    let tvf = TableExpr::table_valued_function(call, "f", source.clone()).unwrap();
    assert!(matches!(tvf, TableExpr::TableValuedFunction(_)));

    let err = TableExpr::table_valued_function(SqlExpr::int(1), "f", source).unwrap_err();
    assert!(matches!(
        err,
        IrError::NotAFunctionCall {
            found: "Literal",
            ..
        }
    ));
    assert!(err.to_string().starts_with("[IR010]"));
}

#[test]
fn test_handles_query_source_follows_origin() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let customers = ctx.new_query_source("c");
    let group = ctx.group_join(&customers, "cs");
    let flattened = ctx.flatten(&group, "c2");
    let other = ctx.new_query_source("x");

    let table = entity_table(&mut ctx, &catalog, "Customer", &customers);
    assert!(table.handles_query_source(&customers));
    assert!(table.handles_query_source(&group));
    assert!(table.handles_query_source(&flattened));
    assert!(!table.handles_query_source(&other));
}

#[test]
fn test_join_delegates_to_inner_table() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let source = ctx.new_query_source("c");
    let table = entity_table(&mut ctx, &catalog, "Customer", &source);

    let mut join = TableExpr::left_outer_join(table.clone());
    assert_eq!(join.alias(), Some("c"));
    assert!(join.handles_query_source(&source));
    assert_eq!(join.inner_table(), &table);
    assert_eq!(join.table_ref(), table.table_ref());

    let predicate = SqlExpr::is_not_null(
        SqlExpr::column_named("City", &table.table_ref(), SqlType::varchar(), Nullability::Nullable)
            .unwrap(),
    );
    let handle = join.as_predicate_join_mut().unwrap();
    handle.add_to_predicate(Arc::clone(&predicate));
    handle.add_to_predicate(SqlExpr::literal(crate::ir::expr::LiteralValue::Boolean(true)));
    assert!(matches!(
        handle.predicate().map(|p| p.as_ref()),
        Some(SqlExpr::Binary(b)) if b.left() == &predicate
    ));

    handle.set_predicate(None);
    assert!(handle.predicate().is_none());

    assert!(TableExpr::cross_join(table).as_predicate_join_mut().is_none());
}

#[test]
fn test_subquery_table_uses_select_identity() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (select, source) = orders_select(&mut ctx, &catalog);
    let mut aliased = select.clone_with_alias(&mut ctx, Some("t"));
    aliased.set_query_source(Some(ctx.new_query_source("sq")));

    let table = TableExpr::select(aliased).unwrap();
    assert_eq!(table.alias(), Some("t"));
    assert!(table.handles_query_source(&source));
    assert!(table.as_select().is_some());
    assert_eq!(table.table_ref().alias(), "t");
}

#[test]
fn test_subquery_table_requires_alias() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (select, _) = orders_select(&mut ctx, &catalog);
    assert!(select.alias().is_none());

    let err = TableExpr::select(select).unwrap_err();
    assert!(matches!(err, IrError::SubqueryWithoutAlias));
}
