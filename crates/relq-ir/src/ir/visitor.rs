//! Double-dispatch visitor over the closed node set.
//!
//! `SqlVisitor` has one required method per expression variant and per
//! table variant, so adding a variant breaks every backend at compile time
//! instead of falling through a default. Visitors decide themselves whether
//! and how to descend into children.

use super::expr::{
    AliasExpr, BinaryExpr, CaseExpr, ColumnExpr, ColumnReferenceExpr, ConvertExpr, ExistsExpr,
    ExplicitCastExpr, InExpr, IsNullExpr, LikeExpr, LiteralExpr, ParameterExpr,
    ScalarSubqueryExpr, SqlExpr, SqlFragmentExpr, SqlFunctionExpr, UnaryExpr,
};
use super::select::SelectExpression;
use super::table::{
    FromSqlExpression, JoinExpr, PredicateJoinExpr, TableExpr, TableExpression,
    TableValuedFunctionExpression,
};

/// Visitor over expression, table and statement nodes
pub trait SqlVisitor {
    /// Value produced per visited node
    type Output;

    fn visit_column(&mut self, column: &ColumnExpr) -> Self::Output;
    fn visit_column_reference(&mut self, reference: &ColumnReferenceExpr) -> Self::Output;
    fn visit_alias(&mut self, alias: &AliasExpr) -> Self::Output;
    fn visit_literal(&mut self, literal: &LiteralExpr) -> Self::Output;
    fn visit_parameter(&mut self, parameter: &ParameterExpr) -> Self::Output;
    fn visit_binary(&mut self, binary: &BinaryExpr) -> Self::Output;
    fn visit_unary(&mut self, unary: &UnaryExpr) -> Self::Output;
    fn visit_convert(&mut self, convert: &ConvertExpr) -> Self::Output;
    fn visit_explicit_cast(&mut self, cast: &ExplicitCastExpr) -> Self::Output;
    fn visit_is_null(&mut self, is_null: &IsNullExpr) -> Self::Output;
    fn visit_case(&mut self, case: &CaseExpr) -> Self::Output;
    fn visit_in(&mut self, in_expr: &InExpr) -> Self::Output;
    fn visit_like(&mut self, like: &LikeExpr) -> Self::Output;
    fn visit_exists(&mut self, exists: &ExistsExpr) -> Self::Output;
    fn visit_sql_function(&mut self, function: &SqlFunctionExpr) -> Self::Output;
    fn visit_sql_fragment(&mut self, fragment: &SqlFragmentExpr) -> Self::Output;
    fn visit_scalar_subquery(&mut self, subquery: &ScalarSubqueryExpr) -> Self::Output;

    fn visit_table(&mut self, table: &TableExpression) -> Self::Output;
    fn visit_from_sql(&mut self, from_sql: &FromSqlExpression) -> Self::Output;
    fn visit_table_valued_function(
        &mut self,
        function: &TableValuedFunctionExpression,
    ) -> Self::Output;
    fn visit_cross_join(&mut self, join: &JoinExpr) -> Self::Output;
    fn visit_cross_join_lateral(&mut self, join: &JoinExpr) -> Self::Output;
    fn visit_inner_join(&mut self, join: &PredicateJoinExpr) -> Self::Output;
    fn visit_left_outer_join(&mut self, join: &PredicateJoinExpr) -> Self::Output;

    fn visit_select(&mut self, select: &SelectExpression) -> Self::Output;
}

impl SqlExpr {
    /// Dispatch to the visitor method for this variant
    pub fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            SqlExpr::Column(e) => visitor.visit_column(e),
            SqlExpr::ColumnReference(e) => visitor.visit_column_reference(e),
            SqlExpr::Alias(e) => visitor.visit_alias(e),
            SqlExpr::Literal(e) => visitor.visit_literal(e),
            SqlExpr::Parameter(e) => visitor.visit_parameter(e),
            SqlExpr::Binary(e) => visitor.visit_binary(e),
            SqlExpr::Unary(e) => visitor.visit_unary(e),
            SqlExpr::Convert(e) => visitor.visit_convert(e),
            SqlExpr::ExplicitCast(e) => visitor.visit_explicit_cast(e),
            SqlExpr::IsNull(e) => visitor.visit_is_null(e),
            SqlExpr::Case(e) => visitor.visit_case(e),
            SqlExpr::In(e) => visitor.visit_in(e),
            SqlExpr::Like(e) => visitor.visit_like(e),
            SqlExpr::Exists(e) => visitor.visit_exists(e),
            SqlExpr::SqlFunction(e) => visitor.visit_sql_function(e),
            SqlExpr::SqlFragment(e) => visitor.visit_sql_fragment(e),
            SqlExpr::ScalarSubquery(e) => visitor.visit_scalar_subquery(e),
        }
    }
}

impl TableExpr {
    /// Dispatch to the visitor method for this variant
    pub fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            TableExpr::Table(t) => visitor.visit_table(t),
            TableExpr::FromSql(t) => visitor.visit_from_sql(t),
            TableExpr::TableValuedFunction(t) => visitor.visit_table_valued_function(t),
            TableExpr::Select(s) => visitor.visit_select(s),
            TableExpr::CrossJoin(j) => visitor.visit_cross_join(j),
            TableExpr::CrossJoinLateral(j) => visitor.visit_cross_join_lateral(j),
            TableExpr::InnerJoin(j) => visitor.visit_inner_join(j),
            TableExpr::LeftOuterJoin(j) => visitor.visit_left_outer_join(j),
        }
    }
}

impl SelectExpression {
    /// Dispatch to [`SqlVisitor::visit_select`]
    pub fn accept<V: SqlVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_select(self)
    }
}
