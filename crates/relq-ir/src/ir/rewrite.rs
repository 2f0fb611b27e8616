//! Children rewriting for expression and table nodes.
//!
//! A rewrite that returns every child unchanged (by pointer) returns the
//! original handle. The statement inside EXISTS, a scalar subquery or IN is
//! a separate scope: [`SqlExpr::map_children`] does not enter it, and
//! [`SqlExpr::map_subquery`] rewrites it as a whole, usually through
//! [`SelectExpression::map_expressions`]. The inner side of a column
//! reference is never rewritten.

use super::expr::{
    CaseWhen, ExistsExpr, ExprRef, InExpr, InValues, ScalarSubqueryExpr, SqlExpr,
};
use super::select::SelectExpression;
use super::table::TableExpr;
use crate::error::{IrError, IrResult};
use std::sync::Arc;

/// Apply `f` to `child`, recording whether the result is a different node
fn map_one<F>(child: &ExprRef, f: &mut F, changed: &mut bool) -> IrResult<ExprRef>
where
    F: FnMut(&ExprRef) -> IrResult<ExprRef>,
{
    let new = f(child)?;
    if !Arc::ptr_eq(&new, child) {
        *changed = true;
    }
    Ok(new)
}

fn map_opt<F>(child: &Option<ExprRef>, f: &mut F, changed: &mut bool) -> IrResult<Option<ExprRef>>
where
    F: FnMut(&ExprRef) -> IrResult<ExprRef>,
{
    child.as_ref().map(|c| map_one(c, f, changed)).transpose()
}

fn map_all<F>(children: &[ExprRef], f: &mut F, changed: &mut bool) -> IrResult<Vec<ExprRef>>
where
    F: FnMut(&ExprRef) -> IrResult<ExprRef>,
{
    children.iter().map(|c| map_one(c, f, changed)).collect()
}

impl SqlExpr {
    /// Rebuild `this` with each direct child replaced by `f(child)`.
    ///
    /// Returns `Arc::clone(this)` when no child changed. A rebuilt CASE is
    /// re-validated, which is the only way this can fail.
    pub fn map_children<F>(this: &ExprRef, mut f: F) -> IrResult<ExprRef>
    where
        F: FnMut(&ExprRef) -> IrResult<ExprRef>,
    {
        let mut changed = false;
        let f = &mut f;

        let rebuilt = match this.as_ref() {
            SqlExpr::Column(_)
            | SqlExpr::ColumnReference(_)
            | SqlExpr::Literal(_)
            | SqlExpr::Parameter(_)
            | SqlExpr::SqlFragment(_)
            | SqlExpr::Exists(_)
            | SqlExpr::ScalarSubquery(_) => return Ok(Arc::clone(this)),

            SqlExpr::Alias(a) => {
                let expr = map_one(&a.expr, f, &mut changed)?;
                SqlExpr::alias_unchecked(a.alias.clone(), expr)
            }
            SqlExpr::Binary(b) => {
                let left = map_one(&b.left, f, &mut changed)?;
                let right = map_one(&b.right, f, &mut changed)?;
                SqlExpr::binary(b.op.clone(), left, right)
            }
            SqlExpr::Unary(u) => {
                let operand = map_one(&u.operand, f, &mut changed)?;
                SqlExpr::unary(u.op.clone(), operand)
            }
            SqlExpr::Convert(c) => {
                let operand = map_one(&c.operand, f, &mut changed)?;
                SqlExpr::convert(operand, c.sql_type.clone())
            }
            SqlExpr::ExplicitCast(c) => {
                let operand = map_one(&c.operand, f, &mut changed)?;
                SqlExpr::cast(operand, c.sql_type.clone())
            }
            SqlExpr::IsNull(n) => {
                let operand = map_one(&n.operand, f, &mut changed)?;
                if n.negated {
                    SqlExpr::is_not_null(operand)
                } else {
                    SqlExpr::is_null(operand)
                }
            }
            SqlExpr::Case(c) => {
                let operand = map_opt(&c.operand, f, &mut changed)?;
                let mut when_clauses = Vec::with_capacity(c.when_clauses.len());
                for clause in &c.when_clauses {
                    let test = map_one(&clause.test, f, &mut changed)?;
                    let result = map_one(&clause.result, f, &mut changed)?;
                    when_clauses.push(CaseWhen::new(test, result));
                }
                let else_result = map_opt(&c.else_result, f, &mut changed)?;
                if !changed {
                    return Ok(Arc::clone(this));
                }
                SqlExpr::case(operand, when_clauses, else_result)?
            }
            SqlExpr::In(i) => {
                let operand = map_one(&i.operand, f, &mut changed)?;
                match &i.values {
                    InValues::List(values) => {
                        let values = map_all(values, f, &mut changed)?;
                        SqlExpr::in_list(operand, values)
                    }
                    InValues::Subquery(subquery) => Arc::new(SqlExpr::In(InExpr {
                        operand,
                        values: InValues::Subquery(Arc::clone(subquery)),
                    })),
                }
            }
            SqlExpr::Like(l) => {
                let match_expr = map_one(&l.match_expr, f, &mut changed)?;
                let pattern = map_one(&l.pattern, f, &mut changed)?;
                let escape = map_opt(&l.escape, f, &mut changed)?;
                SqlExpr::like(match_expr, pattern, escape)
            }
            SqlExpr::SqlFunction(func) => {
                let instance = map_opt(&func.instance, f, &mut changed)?;
                let arguments = map_all(&func.arguments, f, &mut changed)?;
                let mut rebuilt = func.clone();
                rebuilt.instance = instance;
                rebuilt.arguments = arguments;
                Arc::new(SqlExpr::SqlFunction(rebuilt))
            }
        };

        Ok(if changed { rebuilt } else { Arc::clone(this) })
    }

    /// Bottom-up rewrite: children first, then `f` on the rebuilt node.
    ///
    /// Pointer identity is preserved wherever neither a child nor `f`
    /// changed anything.
    pub fn transform_up<F>(this: &ExprRef, f: &mut F) -> IrResult<ExprRef>
    where
        F: FnMut(&ExprRef) -> IrResult<ExprRef>,
    {
        let with_children = Self::map_children(this, |child| Self::transform_up(child, f))?;
        f(&with_children)
    }

    /// Rewrite the statement carried by EXISTS, a scalar subquery or an IN
    /// over a subquery.
    ///
    /// `g` edits a copy of the statement and reports whether it changed
    /// anything. Other nodes, and statements `g` left alone, come back as
    /// the same handle.
    pub fn map_subquery<G>(this: &ExprRef, g: G) -> IrResult<ExprRef>
    where
        G: FnOnce(&mut SelectExpression) -> IrResult<bool>,
    {
        let subquery = match this.as_ref() {
            SqlExpr::Exists(e) => &e.subquery,
            SqlExpr::ScalarSubquery(e) => &e.subquery,
            SqlExpr::In(InExpr {
                values: InValues::Subquery(subquery),
                ..
            }) => subquery,
            _ => return Ok(Arc::clone(this)),
        };

        let mut edited = SelectExpression::clone(subquery);
        if !g(&mut edited)? {
            return Ok(Arc::clone(this));
        }

        let rebuilt = match this.as_ref() {
            SqlExpr::Exists(_) => SqlExpr::Exists(ExistsExpr {
                subquery: Arc::new(edited),
            }),
            SqlExpr::ScalarSubquery(e) => {
                let sql_type = edited
                    .resolved_type()
                    .cloned()
                    .unwrap_or_else(|| e.sql_type.clone());
                SqlExpr::ScalarSubquery(ScalarSubqueryExpr {
                    subquery: Arc::new(edited),
                    sql_type,
                })
            }
            SqlExpr::In(i) => SqlExpr::In(InExpr {
                operand: Arc::clone(&i.operand),
                values: InValues::Subquery(Arc::new(edited)),
            }),
            _ => unreachable!("only subquery nodes carry a statement"),
        };
        Ok(Arc::new(rebuilt))
    }
}

impl TableExpr {
    /// Replace the expressions this entry owns with `f(expr)`, in place.
    ///
    /// Covers raw SQL arguments, the table-valued function call and join ON
    /// predicates; a join's table is rewritten in turn. A subquery table is
    /// its own scope and is not entered. Returns whether anything changed;
    /// untouched children keep their handles.
    pub fn map_children<F>(&mut self, f: &mut F) -> IrResult<bool>
    where
        F: FnMut(&ExprRef) -> IrResult<ExprRef>,
    {
        let mut changed = false;
        match self {
            TableExpr::Table(_) | TableExpr::Select(_) => {}
            TableExpr::FromSql(t) => {
                let arguments = map_all(&t.arguments, f, &mut changed)?;
                if changed {
                    t.arguments = arguments;
                }
            }
            TableExpr::TableValuedFunction(t) => {
                let function = map_one(&t.function, f, &mut changed)?;
                if changed {
                    if !matches!(function.as_ref(), SqlExpr::SqlFunction(_)) {
                        return Err(IrError::NotAFunctionCall {
                            alias: t.alias.clone(),
                            found: function.node_name(),
                        });
                    }
                    t.function = function;
                }
            }
            TableExpr::CrossJoin(j) | TableExpr::CrossJoinLateral(j) => {
                changed = j.table.map_children(f)?;
            }
            TableExpr::InnerJoin(j) | TableExpr::LeftOuterJoin(j) => {
                let predicate = map_opt(&j.predicate, f, &mut changed)?;
                if changed {
                    j.predicate = predicate;
                }
                if j.table.map_children(f)? {
                    changed = true;
                }
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
#[path = "rewrite_test.rs"]
mod tests;
