//! Join builders

use super::SelectExpression;
use crate::ir::expr::ExprRef;
use crate::ir::table::{JoinExpr, PredicateJoinExpr, TableExpr};

impl SelectExpression {
    /// `CROSS JOIN table`, projecting `projection` alongside
    pub fn add_cross_join(
        &mut self,
        table: TableExpr,
        projection: impl IntoIterator<Item = ExprRef>,
    ) -> &JoinExpr {
        self.extend_join_projection(projection);
        self.tables.push(TableExpr::cross_join(table));
        match self.tables.last() {
            Some(TableExpr::CrossJoin(join)) => join,
            _ => unreachable!("cross join was just pushed"),
        }
    }

    /// `CROSS JOIN LATERAL table`, projecting `projection` alongside
    pub fn add_cross_join_lateral(
        &mut self,
        table: TableExpr,
        projection: impl IntoIterator<Item = ExprRef>,
    ) -> &JoinExpr {
        self.extend_join_projection(projection);
        self.tables.push(TableExpr::cross_join_lateral(table));
        match self.tables.last() {
            Some(TableExpr::CrossJoinLateral(join)) => join,
            _ => unreachable!("lateral join was just pushed"),
        }
    }

    /// `INNER JOIN table`; the ON predicate is set through the returned join
    pub fn add_inner_join(&mut self, table: TableExpr) -> &mut PredicateJoinExpr {
        self.add_inner_join_with(table, Vec::new(), None)
    }

    /// `INNER JOIN table` with extra projection; `inner_predicate` is ANDed
    /// onto the WHERE clause
    pub fn add_inner_join_with(
        &mut self,
        table: TableExpr,
        projection: impl IntoIterator<Item = ExprRef>,
        inner_predicate: Option<ExprRef>,
    ) -> &mut PredicateJoinExpr {
        self.extend_join_projection(projection);
        if let Some(predicate) = inner_predicate {
            self.add_to_predicate(predicate);
        }
        self.push_predicate_join(TableExpr::inner_join(table))
    }

    /// `LEFT JOIN table`; the ON predicate is set through the returned join
    pub fn add_left_outer_join(&mut self, table: TableExpr) -> &mut PredicateJoinExpr {
        self.add_left_outer_join_with(table, Vec::new())
    }

    /// `LEFT JOIN table` with extra projection
    pub fn add_left_outer_join_with(
        &mut self,
        table: TableExpr,
        projection: impl IntoIterator<Item = ExprRef>,
    ) -> &mut PredicateJoinExpr {
        self.extend_join_projection(projection);
        self.push_predicate_join(TableExpr::left_outer_join(table))
    }

    fn extend_join_projection(&mut self, projection: impl IntoIterator<Item = ExprRef>) {
        for expr in projection {
            self.add_to_projection(expr, false);
        }
    }

    fn push_predicate_join(&mut self, join: TableExpr) -> &mut PredicateJoinExpr {
        self.tables.push(join);
        match self.tables.last_mut() {
            Some(TableExpr::InnerJoin(join)) | Some(TableExpr::LeftOuterJoin(join)) => join,
            _ => unreachable!("predicate join was just pushed"),
        }
    }
}
