//! Diagnostic SQL rendering.
//!
//! Produces readable ANSI-flavoured text for logs and test failures. It is
//! not a dialect generator: implicit conversions are invisible and every
//! identifier is double-quoted.

use super::expr::{
    AliasExpr, BinaryExpr, CaseExpr, ColumnExpr, ColumnReferenceExpr, ConvertExpr, ExistsExpr,
    ExplicitCastExpr, ExprRef, InExpr, InValues, IsNullExpr, LikeExpr, LiteralExpr,
    LiteralValue, ParameterExpr, ScalarSubqueryExpr, SqlExpr, SqlFragmentExpr, SqlFunctionExpr,
    UnOp, UnaryExpr,
};
use super::select::{OrderDirection, SelectExpression};
use super::table::{
    FromSqlExpression, JoinExpr, PredicateJoinExpr, TableExpr, TableExpression,
    TableValuedFunctionExpression,
};
use super::visitor::SqlVisitor;
use sqlparser::ast::Ident;
use std::fmt;

fn quoted(name: &str) -> Ident {
    Ident::with_quote('"', name)
}

struct SqlRenderer<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
}

impl SqlRenderer<'_, '_> {
    fn list(&mut self, exprs: &[ExprRef]) -> fmt::Result {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                write!(self.f, ", ")?;
            }
            expr.accept(self)?;
        }
        Ok(())
    }

    fn column(&mut self, table: &str, name: &str) -> fmt::Result {
        write!(self.f, "{}.{}", quoted(table), quoted(name))
    }

    /// Ordering keys that name a projected alias render as the bare alias
    fn ordering_key(&mut self, expr: &ExprRef) -> fmt::Result {
        match expr.as_ref() {
            SqlExpr::Alias(a) => write!(self.f, "{}", quoted(a.alias())),
            _ => expr.accept(self),
        }
    }

    fn subquery(&mut self, select: &SelectExpression) -> fmt::Result {
        write!(self.f, "(")?;
        self.visit_select(select)?;
        write!(self.f, ")")
    }

    fn aliased(&mut self, alias: &str) -> fmt::Result {
        write!(self.f, " AS {}", quoted(alias))
    }

    /// FROM-list entry; subqueries are parenthesized and aliased
    fn table_entry(&mut self, table: &TableExpr) -> fmt::Result {
        match table {
            TableExpr::Select(subquery) => {
                self.subquery(subquery)?;
                match subquery.alias() {
                    Some(alias) => self.aliased(alias),
                    None => Ok(()),
                }
            }
            other => other.accept(self),
        }
    }
}

impl SqlVisitor for SqlRenderer<'_, '_> {
    type Output = fmt::Result;

    fn visit_column(&mut self, column: &ColumnExpr) -> fmt::Result {
        self.column(column.table().alias(), column.name())
    }

    fn visit_column_reference(&mut self, reference: &ColumnReferenceExpr) -> fmt::Result {
        self.column(reference.table().alias(), reference.name())
    }

    fn visit_alias(&mut self, alias: &AliasExpr) -> fmt::Result {
        alias.expr().accept(self)?;
        self.aliased(alias.alias())
    }

    fn visit_literal(&mut self, literal: &LiteralExpr) -> fmt::Result {
        match literal.value() {
            LiteralValue::Null => write!(self.f, "NULL"),
            LiteralValue::Boolean(true) => write!(self.f, "TRUE"),
            LiteralValue::Boolean(false) => write!(self.f, "FALSE"),
            LiteralValue::Integer(i) => write!(self.f, "{i}"),
            LiteralValue::Float(v) => write!(self.f, "{v}"),
            LiteralValue::String(s) => write!(self.f, "'{}'", s.replace('\'', "''")),
        }
    }

    fn visit_parameter(&mut self, parameter: &ParameterExpr) -> fmt::Result {
        write!(self.f, "@{}", parameter.name())
    }

    fn visit_binary(&mut self, binary: &BinaryExpr) -> fmt::Result {
        write!(self.f, "(")?;
        binary.left().accept(self)?;
        write!(self.f, " {} ", binary.op())?;
        binary.right().accept(self)?;
        write!(self.f, ")")
    }

    fn visit_unary(&mut self, unary: &UnaryExpr) -> fmt::Result {
        match unary.op() {
            UnOp::Not => write!(self.f, "NOT ")?,
            UnOp::Minus => write!(self.f, "-")?,
        }
        unary.operand().accept(self)
    }

    fn visit_convert(&mut self, convert: &ConvertExpr) -> fmt::Result {
        convert.operand().accept(self)
    }

    fn visit_explicit_cast(&mut self, cast: &ExplicitCastExpr) -> fmt::Result {
        write!(self.f, "CAST(")?;
        cast.operand().accept(self)?;
        write!(self.f, " AS {})", cast.sql_type)
    }

    fn visit_is_null(&mut self, is_null: &IsNullExpr) -> fmt::Result {
        is_null.operand().accept(self)?;
        if is_null.negated() {
            write!(self.f, " IS NOT NULL")
        } else {
            write!(self.f, " IS NULL")
        }
    }

    fn visit_case(&mut self, case: &CaseExpr) -> fmt::Result {
        write!(self.f, "CASE")?;
        if let Some(operand) = case.operand() {
            write!(self.f, " ")?;
            operand.accept(self)?;
        }
        for clause in case.when_clauses() {
            write!(self.f, " WHEN ")?;
            clause.test.accept(self)?;
            write!(self.f, " THEN ")?;
            clause.result.accept(self)?;
        }
        if let Some(else_result) = case.else_result() {
            write!(self.f, " ELSE ")?;
            else_result.accept(self)?;
        }
        write!(self.f, " END")
    }

    fn visit_in(&mut self, in_expr: &InExpr) -> fmt::Result {
        in_expr.operand().accept(self)?;
        write!(self.f, " IN ")?;
        match in_expr.values() {
            InValues::List(values) => {
                write!(self.f, "(")?;
                self.list(values)?;
                write!(self.f, ")")
            }
            InValues::Subquery(subquery) => self.subquery(subquery),
        }
    }

    fn visit_like(&mut self, like: &LikeExpr) -> fmt::Result {
        like.match_expr().accept(self)?;
        write!(self.f, " LIKE ")?;
        like.pattern().accept(self)?;
        if let Some(escape) = like.escape() {
            write!(self.f, " ESCAPE ")?;
            escape.accept(self)?;
        }
        Ok(())
    }

    fn visit_exists(&mut self, exists: &ExistsExpr) -> fmt::Result {
        write!(self.f, "EXISTS ")?;
        self.subquery(exists.subquery())
    }

    fn visit_sql_function(&mut self, function: &SqlFunctionExpr) -> fmt::Result {
        if let Some(instance) = function.instance() {
            instance.accept(self)?;
            write!(self.f, ".")?;
        }
        if let Some(schema) = function.schema() {
            write!(self.f, "{}.", quoted(schema))?;
        }
        write!(self.f, "{}", function.name())?;
        if function.is_niladic() {
            return Ok(());
        }
        write!(self.f, "(")?;
        self.list(function.arguments())?;
        write!(self.f, ")")
    }

    fn visit_sql_fragment(&mut self, fragment: &SqlFragmentExpr) -> fmt::Result {
        write!(self.f, "{}", fragment.sql())
    }

    fn visit_scalar_subquery(&mut self, subquery: &ScalarSubqueryExpr) -> fmt::Result {
        self.subquery(subquery.subquery())
    }

    fn visit_table(&mut self, table: &TableExpression) -> fmt::Result {
        if let Some(schema) = table.schema() {
            write!(self.f, "{}.", quoted(schema))?;
        }
        write!(self.f, "{}", quoted(table.name()))?;
        self.aliased(&table.alias)
    }

    fn visit_from_sql(&mut self, from_sql: &FromSqlExpression) -> fmt::Result {
        write!(self.f, "({})", from_sql.sql())?;
        self.aliased(&from_sql.alias)
    }

    fn visit_table_valued_function(
        &mut self,
        function: &TableValuedFunctionExpression,
    ) -> fmt::Result {
        function.function().accept(self)?;
        self.aliased(&function.alias)
    }

    fn visit_cross_join(&mut self, join: &JoinExpr) -> fmt::Result {
        write!(self.f, "CROSS JOIN ")?;
        self.table_entry(join.table())
    }

    fn visit_cross_join_lateral(&mut self, join: &JoinExpr) -> fmt::Result {
        write!(self.f, "CROSS JOIN LATERAL ")?;
        self.table_entry(join.table())
    }

    fn visit_inner_join(&mut self, join: &PredicateJoinExpr) -> fmt::Result {
        write!(self.f, "INNER JOIN ")?;
        self.table_entry(join.table())?;
        if let Some(predicate) = join.predicate() {
            write!(self.f, " ON ")?;
            predicate.accept(self)?;
        }
        Ok(())
    }

    fn visit_left_outer_join(&mut self, join: &PredicateJoinExpr) -> fmt::Result {
        write!(self.f, "LEFT JOIN ")?;
        self.table_entry(join.table())?;
        if let Some(predicate) = join.predicate() {
            write!(self.f, " ON ")?;
            predicate.accept(self)?;
        }
        Ok(())
    }

    fn visit_select(&mut self, select: &SelectExpression) -> fmt::Result {
        write!(self.f, "SELECT ")?;
        if select.is_distinct() {
            write!(self.f, "DISTINCT ")?;
        }

        if select.is_project_star() {
            match select.project_star_table().and_then(|t| t.alias()) {
                Some(alias) => write!(self.f, "{}.*", quoted(alias))?,
                None => write!(self.f, "*")?,
            }
            // Renamed star entries are not covered by the star
            let renamed: Vec<ExprRef> = select
                .star_projection()
                .iter()
                .filter(|e| matches!(e.as_ref(), SqlExpr::Alias(_)))
                .cloned()
                .collect();
            if !renamed.is_empty() {
                write!(self.f, ", ")?;
                self.list(&renamed)?;
            }
            if !select.projection().is_empty() {
                write!(self.f, ", ")?;
            }
        } else if select.projection().is_empty() {
            write!(self.f, "1")?;
        }
        self.list(select.projection())?;

        for (i, table) in select.tables().iter().enumerate() {
            let is_join = matches!(
                table,
                TableExpr::CrossJoin(_)
                    | TableExpr::CrossJoinLateral(_)
                    | TableExpr::InnerJoin(_)
                    | TableExpr::LeftOuterJoin(_)
            );
            match (i, is_join) {
                (0, _) => write!(self.f, " FROM ")?,
                (_, true) => write!(self.f, " ")?,
                (_, false) => write!(self.f, ", ")?,
            }
            self.table_entry(table)?;
        }

        if let Some(predicate) = select.predicate() {
            write!(self.f, " WHERE ")?;
            predicate.accept(self)?;
        }
        if !select.group_by().is_empty() {
            write!(self.f, " GROUP BY ")?;
            self.list(select.group_by())?;
        }
        for (i, ordering) in select.order_by().iter().enumerate() {
            write!(self.f, "{}", if i == 0 { " ORDER BY " } else { ", " })?;
            self.ordering_key(&ordering.expression)?;
            if ordering.direction == OrderDirection::Descending {
                write!(self.f, " DESC")?;
            }
        }
        if let Some(limit) = select.limit() {
            write!(self.f, " LIMIT ")?;
            limit.accept(self)?;
        }
        if let Some(offset) = select.offset() {
            write!(self.f, " OFFSET ")?;
            offset.accept(self)?;
        }
        Ok(())
    }
}

impl fmt::Display for SqlExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.accept(&mut SqlRenderer { f })
    }
}

impl fmt::Display for TableExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        SqlRenderer { f }.table_entry(self)
    }
}

impl fmt::Display for SelectExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.accept(&mut SqlRenderer { f })
    }
}

#[cfg(test)]
#[path = "display_test.rs"]
mod tests;
