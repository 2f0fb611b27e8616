//! The SELECT composition engine.
//!
//! A [`SelectExpression`] accumulates the clauses of one statement while the
//! translator walks the object query. When a new clause cannot be applied to
//! the statement as it stands (a second LIMIT, an OFFSET after a LIMIT,
//! DISTINCT over a paged result) the statement is pushed down: its body moves
//! into a subquery and the clause is applied to the wrapper.
//!
//! The implementation is spread over several files:
//! - `projection`: projection list, unique aliases, member mapping
//! - `binding`: property binding and projection lookup through subqueries
//! - `pushdown`: push-down, order-by lifting, limit/offset/distinct, star
//!   explosion
//! - `join`: join builders

mod binding;
mod join;
mod projection;
mod pushdown;

use super::correlation::CorrelationFinder;
use super::expr::{ExprRef, SqlExpr};
use super::table::{TableExpr, TableRef};
use crate::error::IrResult;
use crate::source::QuerySource;
use relq_core::SqlType;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use projection::ProjectionType;

/// Sort direction of an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    /// ASC
    #[default]
    Ascending,
    /// DESC
    Descending,
}

/// One ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ordering {
    /// Sort key
    pub expression: ExprRef,
    /// Direction
    pub direction: OrderDirection,
}

impl Ordering {
    /// Build an ordering
    pub fn new(expression: ExprRef, direction: OrderDirection) -> Self {
        Self {
            expression,
            direction,
        }
    }

    /// Ascending ordering on `expression`
    pub fn asc(expression: ExprRef) -> Self {
        Self::new(expression, OrderDirection::Ascending)
    }

    /// Descending ordering on `expression`
    pub fn desc(expression: ExprRef) -> Self {
        Self::new(expression, OrderDirection::Descending)
    }
}

/// Mutable builder for one SELECT statement
#[derive(Debug, Clone)]
pub struct SelectExpression {
    /// Set exactly when the statement is (or will be) a subquery table
    alias: Option<String>,
    query_source: Option<QuerySource>,
    projection: Vec<ExprRef>,
    /// Entries bound while in star mode; not part of the live output list
    star_projection: Vec<ExprRef>,
    tables: Vec<TableExpr>,
    predicate: Option<ExprRef>,
    group_by: Vec<ExprRef>,
    order_by: Vec<Ordering>,
    limit: Option<ExprRef>,
    offset: Option<ExprRef>,
    is_distinct: bool,
    is_project_star: bool,
    /// Alias of the explicit star table; defaults to the single table
    project_star_table: Option<String>,
    member_projections: BTreeMap<String, ExprRef>,
    column_alias_prefix: String,
}

impl SelectExpression {
    pub(crate) fn new(alias: Option<String>, column_alias_prefix: String) -> Self {
        Self {
            alias,
            query_source: None,
            projection: Vec::new(),
            star_projection: Vec::new(),
            tables: Vec::new(),
            predicate: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            is_distinct: false,
            is_project_star: false,
            project_star_table: None,
            member_projections: BTreeMap::new(),
            column_alias_prefix,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn query_source(&self) -> Option<&QuerySource> {
        self.query_source.as_ref()
    }

    /// Attach the query source this statement stands for as a subquery
    pub fn set_query_source(&mut self, query_source: Option<QuerySource>) {
        self.query_source = query_source;
    }

    /// Live output list
    pub fn projection(&self) -> &[ExprRef] {
        &self.projection
    }

    /// Entries memoized while in star mode
    pub fn star_projection(&self) -> &[ExprRef] {
        &self.star_projection
    }

    pub fn tables(&self) -> &[TableExpr] {
        &self.tables
    }

    pub fn predicate(&self) -> Option<&ExprRef> {
        self.predicate.as_ref()
    }

    pub fn group_by(&self) -> &[ExprRef] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[Ordering] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<&ExprRef> {
        self.limit.as_ref()
    }

    pub fn offset(&self) -> Option<&ExprRef> {
        self.offset.as_ref()
    }

    pub fn is_distinct(&self) -> bool {
        self.is_distinct
    }

    pub fn is_project_star(&self) -> bool {
        self.is_project_star
    }

    /// Type of the single projected value, if exactly one is projected
    pub fn resolved_type(&self) -> Option<&SqlType> {
        match self.projection.as_slice() {
            [only] => Some(only.resolved_type()),
            _ => None,
        }
    }

    /// Identity columns use when this statement is a table of another
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.alias.clone().unwrap_or_default(), self.query_source.clone())
    }

    /// Enter or leave star mode.
    ///
    /// Entering moves the current projection into the star cache; leaving
    /// drops the cache.
    pub fn set_project_star(&mut self, value: bool) {
        self.is_project_star = value;
        if value {
            let projection = std::mem::take(&mut self.projection);
            self.star_projection.extend(projection);
        } else {
            self.star_projection.clear();
        }
    }

    /// The table star mode projects: the explicit one, else the only table
    pub fn project_star_table(&self) -> Option<&TableExpr> {
        self.project_star_table_index().map(|i| &self.tables[i])
    }

    /// Choose the star table by alias
    pub fn set_project_star_table(&mut self, alias: Option<&str>) {
        self.project_star_table = alias.map(str::to_string);
    }

    pub(crate) fn project_star_table_index(&self) -> Option<usize> {
        match &self.project_star_table {
            Some(alias) => self
                .tables
                .iter()
                .position(|t| t.alias() == Some(alias.as_str())),
            None if self.tables.len() == 1 => Some(0),
            None => None,
        }
    }

    // ----- tables -----

    pub fn add_table(&mut self, table: TableExpr) {
        self.tables.push(table);
    }

    /// Remove the table with the given alias; returns it if present
    pub fn remove_table(&mut self, alias: &str) -> Option<TableExpr> {
        let index = self.tables.iter().position(|t| t.alias() == Some(alias))?;
        Some(self.tables.remove(index))
    }

    pub fn clear_tables(&mut self) {
        self.tables.clear();
    }

    /// True if this statement itself, or any of its tables, backs the source
    pub fn handles_query_source(&self, query_source: &QuerySource) -> bool {
        self.query_source
            .as_ref()
            .is_some_and(|own| own.same_origin(query_source))
            || self
                .tables
                .iter()
                .any(|t| t.handles_query_source(query_source))
    }

    /// First table handling the source, falling back to the star table
    pub fn table_for_query_source(&self, query_source: &QuerySource) -> Option<&TableExpr> {
        self.table_index_for_query_source(query_source)
            .or_else(|| self.project_star_table_index())
            .map(|i| &self.tables[i])
    }

    pub(crate) fn table_index_for_query_source(&self, query_source: &QuerySource) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.handles_query_source(query_source))
    }

    // ----- predicate / grouping -----

    /// AND `predicate` onto the WHERE clause
    pub fn add_to_predicate(&mut self, predicate: ExprRef) {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => SqlExpr::and(existing, predicate),
            None => predicate,
        });
    }

    pub fn set_predicate(&mut self, predicate: Option<ExprRef>) {
        self.predicate = predicate;
    }

    pub fn add_to_group_by(&mut self, expressions: impl IntoIterator<Item = ExprRef>) {
        self.group_by.extend(expressions);
    }

    // ----- ordering -----

    /// Append an ordering unless an equivalent key is already ordered on;
    /// returns the ordering now in effect for that key
    pub fn add_to_order_by(&mut self, ordering: Ordering) -> Ordering {
        if let Some(existing) = self
            .order_by
            .iter()
            .find(|o| same_ordering_key(&o.expression, &ordering.expression))
        {
            return existing.clone();
        }
        self.order_by.push(ordering.clone());
        ordering
    }

    /// Put `orderings` in front of the existing ones, dropping duplicates
    pub fn prepend_to_order_by(&mut self, orderings: impl IntoIterator<Item = Ordering>) {
        let existing = std::mem::take(&mut self.order_by);
        for ordering in orderings.into_iter().chain(existing) {
            self.add_to_order_by(ordering);
        }
    }

    pub fn replace_order_by(&mut self, orderings: impl IntoIterator<Item = Ordering>) {
        self.order_by = orderings.into_iter().collect();
    }

    pub fn clear_order_by(&mut self) {
        self.order_by.clear();
    }

    // ----- whole statement -----

    /// Copy this statement. Clause values are shared with the original; the
    /// copy gets a fresh unique alias only when `alias` is given.
    pub fn clone_with_alias(
        &self,
        ctx: &mut crate::context::CompilationContext,
        alias: Option<&str>,
    ) -> SelectExpression {
        let mut copy = SelectExpression::new(
            alias.map(|a| ctx.create_unique_table_alias(a)),
            self.column_alias_prefix.clone(),
        );
        copy.projection = self.projection.clone();
        copy.star_projection = self.star_projection.clone();
        copy.tables = self.tables.clone();
        copy.predicate = self.predicate.clone();
        copy.group_by = self.group_by.clone();
        copy.order_by = self.order_by.clone();
        copy.limit = self.limit.clone();
        copy.offset = self.offset.clone();
        copy.is_distinct = self.is_distinct;
        copy.is_project_star = self.is_project_star;
        copy.project_star_table = self.project_star_table.clone();
        copy.member_projections = self.member_projections.clone();
        copy
    }

    /// Replace each clause expression of this statement with `f(expr)`.
    ///
    /// Walks the projection, star cache, grouping, ordering, predicate,
    /// paging and member mapping, then the expressions owned by the tables
    /// (see [`TableExpr::map_children`]). Nested statements are not entered.
    /// Returns whether anything changed.
    pub fn map_expressions<F>(&mut self, f: &mut F) -> IrResult<bool>
    where
        F: FnMut(&ExprRef) -> IrResult<ExprRef>,
    {
        let mut changed = false;
        let mut apply = |expr: &mut ExprRef| -> IrResult<()> {
            let new = f(expr)?;
            if !Arc::ptr_eq(&new, expr) {
                *expr = new;
                changed = true;
            }
            Ok(())
        };

        for expr in self
            .projection
            .iter_mut()
            .chain(self.star_projection.iter_mut())
            .chain(self.group_by.iter_mut())
        {
            apply(expr)?;
        }
        for ordering in &mut self.order_by {
            apply(&mut ordering.expression)?;
        }
        for expr in self
            .predicate
            .iter_mut()
            .chain(self.limit.iter_mut())
            .chain(self.offset.iter_mut())
        {
            apply(expr)?;
        }
        for expr in self.member_projections.values_mut() {
            apply(expr)?;
        }

        for table in &mut self.tables {
            if table.map_children(f)? {
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Reset every clause. Alias, query source and member mapping stay.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.projection.clear();
        self.star_projection.clear();
        self.order_by.clear();
        self.group_by.clear();
        self.limit = None;
        self.offset = None;
        self.is_distinct = false;
        self.predicate = None;
        self.project_star_table = None;
        self.is_project_star = false;
    }

    /// One table, returned unmodified
    pub fn is_identity_query(&self) -> bool {
        !self.is_project_star
            && !self.is_distinct
            && self.predicate.is_none()
            && self.limit.is_none()
            && self.offset.is_none()
            && self.projection.is_empty()
            && self.order_by.is_empty()
            && self.group_by.is_empty()
            && self.tables.len() == 1
    }

    /// True if some column reachable from this statement belongs to a table
    /// that is not in scope here
    pub fn is_correlated(&self) -> bool {
        CorrelationFinder::default().is_correlated(self)
    }
}

/// Ordering keys match after looking through implicit conversions
pub(crate) fn same_ordering_key(a: &ExprRef, b: &ExprRef) -> bool {
    SqlExpr::without_convert(a) == SqlExpr::without_convert(b)
}

// Structural equality over the clauses; the star cache, member mapping and
// alias prefix are bookkeeping and do not participate.
impl PartialEq for SelectExpression {
    fn eq(&self, other: &Self) -> bool {
        self.alias == other.alias
            && self.query_source == other.query_source
            && self.projection == other.projection
            && self.tables == other.tables
            && self.predicate == other.predicate
            && self.group_by == other.group_by
            && self.order_by == other.order_by
            && self.limit == other.limit
            && self.offset == other.offset
            && self.is_distinct == other.is_distinct
            && self.is_project_star == other.is_project_star
            && self.project_star_table == other.project_star_table
    }
}

impl Eq for SelectExpression {}

impl Hash for SelectExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.alias.hash(state);
        self.projection.len().hash(state);
        self.tables.len().hash(state);
        self.is_distinct.hash(state);
        self.is_project_star.hash(state);
    }
}

#[cfg(test)]
#[path = "select_test.rs"]
mod tests;
