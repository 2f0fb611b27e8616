//! Correlation detection.
//!
//! A statement is correlated when some column reachable from it belongs to
//! a table that is not in scope. Each statement visited opens a scope
//! holding the aliases and query sources of its tables, nested subquery
//! tables included; a column is local when any open scope knows its table.

use super::expr::{
    AliasExpr, BinaryExpr, CaseExpr, ColumnExpr, ColumnReferenceExpr, ConvertExpr, ExistsExpr,
    ExplicitCastExpr, ExprRef, InExpr, InValues, IsNullExpr, LikeExpr, LiteralExpr,
    ParameterExpr, ScalarSubqueryExpr, SqlFragmentExpr, SqlFunctionExpr, UnaryExpr,
};
use super::select::SelectExpression;
use super::table::{
    FromSqlExpression, JoinExpr, PredicateJoinExpr, TableExpr, TableExpression, TableRef,
    TableValuedFunctionExpression,
};
use super::visitor::SqlVisitor;
use crate::source::QuerySource;
use std::collections::HashSet;

#[derive(Debug, Default)]
struct Scope {
    aliases: HashSet<String>,
    sources: Vec<QuerySource>,
}

impl Scope {
    fn of(select: &SelectExpression) -> Self {
        let mut scope = Scope::default();
        scope.collect_select(select);
        scope
    }

    fn collect_select(&mut self, select: &SelectExpression) {
        if let Some(alias) = select.alias() {
            self.aliases.insert(alias.to_string());
        }
        if let Some(source) = select.query_source() {
            self.sources.push(source.clone());
        }
        for table in select.tables() {
            self.collect_table(table);
        }
    }

    fn collect_table(&mut self, table: &TableExpr) {
        let table = table.inner_table();
        if let Some(select) = table.as_select() {
            self.collect_select(select);
            return;
        }
        if let Some(alias) = table.alias() {
            self.aliases.insert(alias.to_string());
        }
        if let Some(source) = table.query_source() {
            self.sources.push(source.clone());
        }
    }

    fn knows(&self, table: &TableRef) -> bool {
        self.aliases.contains(table.alias())
            || table
                .query_source()
                .is_some_and(|qs| self.sources.iter().any(|s| s.same_origin(qs)))
    }
}

/// Short-circuiting walk that reports whether any column escapes the scopes
/// of the statements it belongs to
#[derive(Debug, Default)]
pub(crate) struct CorrelationFinder {
    scopes: Vec<Scope>,
}

impl CorrelationFinder {
    pub(crate) fn is_correlated(mut self, select: &SelectExpression) -> bool {
        self.visit_select(select)
    }

    /// Columns of tables without a query source are only checked by alias;
    /// an unknown alias without a source is not treated as correlation.
    fn escapes(&self, table: &TableRef) -> bool {
        table.query_source().is_some() && !self.scopes.iter().any(|s| s.knows(table))
    }

    fn any(&mut self, exprs: &[ExprRef]) -> bool {
        exprs.iter().any(|e| e.accept(self))
    }

    fn opt(&mut self, expr: Option<&ExprRef>) -> bool {
        expr.is_some_and(|e| e.accept(self))
    }
}

impl SqlVisitor for CorrelationFinder {
    type Output = bool;

    fn visit_column(&mut self, column: &ColumnExpr) -> bool {
        let escapes = self.escapes(column.table());
        if escapes {
            log::trace!(
                "Column '{}' of '{}' is outside every scope",
                column.name(),
                column.table().alias()
            );
        }
        escapes
    }

    fn visit_column_reference(&mut self, reference: &ColumnReferenceExpr) -> bool {
        self.escapes(reference.table())
    }

    fn visit_alias(&mut self, alias: &AliasExpr) -> bool {
        alias.expr().accept(self)
    }

    fn visit_literal(&mut self, _literal: &LiteralExpr) -> bool {
        false
    }

    fn visit_parameter(&mut self, _parameter: &ParameterExpr) -> bool {
        false
    }

    fn visit_binary(&mut self, binary: &BinaryExpr) -> bool {
        binary.left().accept(self) || binary.right().accept(self)
    }

    fn visit_unary(&mut self, unary: &UnaryExpr) -> bool {
        unary.operand().accept(self)
    }

    fn visit_convert(&mut self, convert: &ConvertExpr) -> bool {
        convert.operand().accept(self)
    }

    fn visit_explicit_cast(&mut self, cast: &ExplicitCastExpr) -> bool {
        cast.operand().accept(self)
    }

    fn visit_is_null(&mut self, is_null: &IsNullExpr) -> bool {
        is_null.operand().accept(self)
    }

    fn visit_case(&mut self, case: &CaseExpr) -> bool {
        self.opt(case.operand())
            || case
                .when_clauses()
                .iter()
                .any(|w| w.test.accept(self) || w.result.accept(self))
            || self.opt(case.else_result())
    }

    fn visit_in(&mut self, in_expr: &InExpr) -> bool {
        if in_expr.operand().accept(self) {
            return true;
        }
        match in_expr.values() {
            InValues::List(values) => self.any(values),
            InValues::Subquery(subquery) => self.visit_select(subquery),
        }
    }

    fn visit_like(&mut self, like: &LikeExpr) -> bool {
        like.match_expr().accept(self) || like.pattern().accept(self) || self.opt(like.escape())
    }

    fn visit_exists(&mut self, exists: &ExistsExpr) -> bool {
        self.visit_select(exists.subquery())
    }

    fn visit_sql_function(&mut self, function: &SqlFunctionExpr) -> bool {
        self.opt(function.instance()) || self.any(function.arguments())
    }

    fn visit_sql_fragment(&mut self, _fragment: &SqlFragmentExpr) -> bool {
        false
    }

    fn visit_scalar_subquery(&mut self, subquery: &ScalarSubqueryExpr) -> bool {
        self.visit_select(subquery.subquery())
    }

    fn visit_table(&mut self, _table: &TableExpression) -> bool {
        false
    }

    fn visit_from_sql(&mut self, from_sql: &FromSqlExpression) -> bool {
        self.any(from_sql.arguments())
    }

    fn visit_table_valued_function(&mut self, function: &TableValuedFunctionExpression) -> bool {
        function.function().accept(self)
    }

    fn visit_cross_join(&mut self, join: &JoinExpr) -> bool {
        join.table().accept(self)
    }

    fn visit_cross_join_lateral(&mut self, join: &JoinExpr) -> bool {
        join.table().accept(self)
    }

    fn visit_inner_join(&mut self, join: &PredicateJoinExpr) -> bool {
        join.table().accept(self) || self.opt(join.predicate())
    }

    fn visit_left_outer_join(&mut self, join: &PredicateJoinExpr) -> bool {
        join.table().accept(self) || self.opt(join.predicate())
    }

    fn visit_select(&mut self, select: &SelectExpression) -> bool {
        self.scopes.push(Scope::of(select));
        let correlated = self.any(select.projection())
            || self.any(select.star_projection())
            || select.tables().iter().any(|t| t.accept(self))
            || self.opt(select.predicate())
            || self.any(select.group_by())
            || select.order_by().iter().any(|o| o.expression.accept(self))
            || self.opt(select.limit())
            || self.opt(select.offset());
        self.scopes.pop();
        correlated
    }
}

#[cfg(test)]
#[path = "correlation_test.rs"]
mod tests;
