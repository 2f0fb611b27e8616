use super::*;
use crate::error::IrError;
use crate::ir::expr::{BinOp, LiteralValue};
use crate::ir::table::TableRef;
use crate::test_utils::*;
use relq_core::{Nullability, SqlType};

fn col(name: &str) -> ExprRef {
    SqlExpr::column_named(name, &TableRef::new("o", None), SqlType::int(), Nullability::NotNull)
        .unwrap()
}

fn sample() -> ExprRef {
    let id = col("Id");
    let case = SqlExpr::case(
        Some(Arc::clone(&id)),
        vec![CaseWhen::new(SqlExpr::int(1), SqlExpr::string("one"))],
        Some(SqlExpr::string("many")),
    )
    .unwrap();
    SqlExpr::and(
        SqlExpr::equal(case, SqlExpr::string("one")),
        SqlExpr::in_list(col("Freight"), vec![SqlExpr::int(1), SqlExpr::int(2)]),
    )
}

#[test]
fn test_identity_rewrite_returns_same_handle() {
    let expr = sample();
    let same = SqlExpr::map_children(&expr, |c| Ok(Arc::clone(c))).unwrap();
    assert!(Arc::ptr_eq(&expr, &same));

    let deep = SqlExpr::transform_up(&expr, &mut |e| Ok(Arc::clone(e))).unwrap();
    assert!(Arc::ptr_eq(&expr, &deep));
}

#[test]
fn test_leaf_rewrite_returns_same_handle() {
    let literal = SqlExpr::int(7);
    let same = SqlExpr::map_children(&literal, |_| Ok(SqlExpr::int(8))).unwrap();
    assert!(Arc::ptr_eq(&literal, &same));
}

#[test]
fn test_rewrite_replaces_matching_children() {
    let expr = sample();
    let renamed = SqlExpr::transform_up(&expr, &mut |e| {
        Ok(match e.as_ref() {
            SqlExpr::Literal(l) if l.value() == &LiteralValue::Integer(2) => SqlExpr::int(3),
            _ => Arc::clone(e),
        })
    })
    .unwrap();

    assert!(!Arc::ptr_eq(&expr, &renamed));
    assert_ne!(expr, renamed);

    let SqlExpr::Binary(and) = renamed.as_ref() else {
        panic!("expected AND, got {renamed:?}");
    };
    assert_eq!(and.op(), &BinOp::And);
    // Untouched side keeps its identity
    let SqlExpr::Binary(original) = expr.as_ref() else {
        unreachable!()
    };
    assert!(Arc::ptr_eq(and.left(), original.left()));
    assert_eq!(
        and.right(),
        &SqlExpr::in_list(col("Freight"), vec![SqlExpr::int(1), SqlExpr::int(3)])
    );
}

#[test]
fn test_case_rewrite_is_revalidated() {
    let case = SqlExpr::case(
        Some(col("Id")),
        vec![
            CaseWhen::new(SqlExpr::int(1), SqlExpr::string("one")),
            CaseWhen::new(SqlExpr::int(2), SqlExpr::string("two")),
        ],
        None,
    )
    .unwrap();

    let err = SqlExpr::map_children(&case, |c| {
        Ok(match c.as_ref() {
            SqlExpr::Literal(l) if l.value() == &LiteralValue::String("one".into()) => {
                SqlExpr::int(1)
            }
            _ => Arc::clone(c),
        })
    })
    .unwrap_err();
    assert!(matches!(
        err,
        IrError::CaseResultTypeMismatch { index: 1, .. }
    ));
}

#[test]
fn test_rewrite_errors_propagate() {
    let expr = sample();
    let result = SqlExpr::transform_up(&expr, &mut |e| match e.as_ref() {
        SqlExpr::In(_) => SqlExpr::fragment("", SqlType::Boolean),
        _ => Ok(Arc::clone(e)),
    });
    assert!(result.is_err());
}

#[test]
fn test_rewrite_keeps_alias_name() {
    let aliased = SqlExpr::alias("total", col("Freight")).unwrap();
    let rewritten = SqlExpr::map_children(&aliased, |_| Ok(col("Id"))).unwrap();
    assert_eq!(rewritten.projection_name(), Some("total"));
    assert_eq!(rewritten.alias_inner(), Some(&col("Id")));
}

/// Rewrite every integer literal `from` to `to`
fn replace_int(from: i64, to: i64) -> impl FnMut(&ExprRef) -> IrResult<ExprRef> {
    move |e: &ExprRef| {
        SqlExpr::transform_up(e, &mut |node| {
            Ok(match node.as_ref() {
                SqlExpr::Literal(l) if l.value() == &LiteralValue::Integer(from) => {
                    SqlExpr::int(to)
                }
                _ => Arc::clone(node),
            })
        })
    }
}

#[test]
fn test_join_predicate_rewrite() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let c = ctx.new_query_source("c");
    let customers = entity_table(&mut ctx, &catalog, "Customer", &c);
    let (mut select, _) = orders_select(&mut ctx, &catalog);
    select
        .add_inner_join(customers)
        .set_predicate(Some(SqlExpr::equal(col("CustomerId"), SqlExpr::int(1))));
    let mut join = select.tables()[1].clone();

    let unchanged = join.map_children(&mut |e| Ok(Arc::clone(e))).unwrap();
    assert!(!unchanged);
    assert_eq!(join, select.tables()[1]);
    let (TableExpr::InnerJoin(before), TableExpr::InnerJoin(after)) = (&select.tables()[1], &join)
    else {
        panic!("expected inner joins");
    };
    assert!(Arc::ptr_eq(
        before.predicate().unwrap(),
        after.predicate().unwrap()
    ));

    assert!(join.map_children(&mut replace_int(1, 2)).unwrap());
    let TableExpr::InnerJoin(rewritten) = &join else {
        panic!("expected an inner join, got {join:?}");
    };
    assert_eq!(
        rewritten.predicate(),
        Some(&SqlExpr::equal(col("CustomerId"), SqlExpr::int(2)))
    );
    assert_eq!(rewritten.table(), before.table());
}

#[test]
fn test_table_source_rewrites() {
    let mut ctx = make_ctx();
    let source = ctx.new_query_source("f");

    let mut raw = TableExpr::from_sql(
        "SELECT * FROM Orders WHERE Id > @p0",
        vec![SqlExpr::int(1), SqlExpr::int(5)],
        "f",
        source.clone(),
    )
    .unwrap();
    assert!(raw.map_children(&mut replace_int(1, 9)).unwrap());
    let TableExpr::FromSql(rewritten) = &raw else {
        panic!("expected raw SQL, got {raw:?}");
    };
    assert_eq!(rewritten.arguments(), [SqlExpr::int(9), SqlExpr::int(5)]);

    let call = SqlExpr::function("split", SqlType::varchar())
        .argument(SqlExpr::int(1))
        .build()
        .unwrap();
    let mut tvf = TableExpr::table_valued_function(call, "f", source).unwrap();
    let err = tvf.map_children(&mut |_| Ok(SqlExpr::int(0))).unwrap_err();
    assert!(matches!(err, IrError::NotAFunctionCall { .. }));
}

#[test]
fn test_statement_rewrite_covers_clauses_and_tables() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let c = ctx.new_query_source("c");
    let customers = entity_table(&mut ctx, &catalog, "Customer", &c);
    let (mut select, _) = orders_select(&mut ctx, &catalog);
    select.add_to_predicate(SqlExpr::binary(BinOp::Gt, col("Id"), SqlExpr::int(1)));
    select
        .add_left_outer_join(customers)
        .set_predicate(Some(SqlExpr::equal(col("CustomerId"), SqlExpr::int(1))));
    select.set_limit(&mut ctx, Some(SqlExpr::int(1)));

    let original = select.clone_with_alias(&mut ctx, None);
    assert!(!select.map_expressions(&mut |e| Ok(Arc::clone(e))).unwrap());
    assert_eq!(select, original);

    assert!(select.map_expressions(&mut replace_int(1, 2)).unwrap());
    assert_eq!(
        select.predicate(),
        Some(&SqlExpr::binary(BinOp::Gt, col("Id"), SqlExpr::int(2)))
    );
    assert_eq!(select.limit(), Some(&SqlExpr::int(2)));
    let TableExpr::LeftOuterJoin(join) = &select.tables()[1] else {
        panic!("expected a left join");
    };
    assert_eq!(
        join.predicate(),
        Some(&SqlExpr::equal(col("CustomerId"), SqlExpr::int(2)))
    );
}

#[test]
fn test_subquery_rewrite() {
    let mut ctx = make_ctx();
    let catalog = catalog();
    let (mut inner, _) = entity_select(&mut ctx, &catalog, "Customer", "c");
    inner.add_to_predicate(SqlExpr::equal(col("Id"), SqlExpr::int(1)));
    let exists = SqlExpr::exists(inner);

    // Expression children stop at the statement boundary
    let same = SqlExpr::transform_up(&exists, &mut replace_int(1, 2)).unwrap();
    assert!(Arc::ptr_eq(&exists, &same));

    let same = SqlExpr::map_subquery(&exists, |s| s.map_expressions(&mut |e| Ok(Arc::clone(e))))
        .unwrap();
    assert!(Arc::ptr_eq(&exists, &same));

    let rewritten =
        SqlExpr::map_subquery(&exists, |s| s.map_expressions(&mut replace_int(1, 2))).unwrap();
    let SqlExpr::Exists(e) = rewritten.as_ref() else {
        panic!("expected EXISTS, got {rewritten:?}");
    };
    assert_eq!(
        e.subquery().predicate(),
        Some(&SqlExpr::equal(col("Id"), SqlExpr::int(2)))
    );

    let literal = SqlExpr::int(1);
    let untouched = SqlExpr::map_subquery(&literal, |_| Ok(true)).unwrap();
    assert!(Arc::ptr_eq(&literal, &untouched));
}
