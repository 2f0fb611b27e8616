//! Push-down and the clause mutators that depend on it.
//!
//! SQL applies clauses in a fixed order (WHERE, DISTINCT, ORDER BY, OFFSET,
//! LIMIT), while the object query applies operators in the order written.
//! When an operator would be evaluated in the wrong place by a single
//! statement, the current statement becomes a subquery and the operator is
//! applied to the wrapper.

use super::projection::unique_entry;
use super::{Ordering, SelectExpression};
use crate::context::CompilationContext;
use crate::ir::expr::{ExprRef, SqlExpr};
use crate::ir::table::TableExpr;
use std::sync::Arc;

impl SelectExpression {
    /// Move the body of this statement into a new subquery and select from
    /// it.
    ///
    /// Afterwards this statement has the subquery as its single table, is in
    /// star mode over it and holds the lifted projection as its star
    /// projection. Member mappings are re-pointed at the lifted entries. The
    /// subquery keeps its ordering only if it is paged.
    pub fn push_down_subquery(&mut self, ctx: &mut CompilationContext) -> &mut SelectExpression {
        let alias = ctx.create_subquery_alias();
        let mut subquery = SelectExpression::new(Some(alias), self.column_alias_prefix.clone());
        subquery.is_project_star = self.is_project_star || self.projection.is_empty();
        let subquery_ref = subquery.table_ref();

        let star_entries = std::mem::take(&mut self.star_projection);
        let entries = std::mem::take(&mut self.projection);
        let mut renamed_aliases: Vec<(ExprRef, ExprRef)> = Vec::new();
        let mut outer_projection = Vec::with_capacity(star_entries.len() + entries.len());

        let moved = star_entries
            .into_iter()
            .map(|e| (e, true))
            .chain(entries.into_iter().map(|e| (e, false)));
        for (entry, into_star) in moved {
            let added = if into_star {
                let added = unique_entry(
                    &mut subquery.star_projection,
                    &subquery.projection,
                    &mut [],
                    &self.column_alias_prefix,
                    &entry,
                    None,
                );
                subquery.star_projection.push(Arc::clone(&added));
                added
            } else {
                let added = unique_entry(
                    &mut subquery.projection,
                    &subquery.star_projection,
                    &mut [],
                    &self.column_alias_prefix,
                    &entry,
                    None,
                );
                subquery.projection.push(Arc::clone(&added));
                added
            };

            if entry.alias_inner().is_some() {
                renamed_aliases.push((Arc::clone(&entry), Arc::clone(&added)));
            }

            match SqlExpr::lift_from_subquery(&added, &subquery_ref) {
                Some(lifted) => {
                    for value in self.member_projections.values_mut() {
                        if *value == entry {
                            *value = Arc::clone(&lifted);
                        }
                    }
                    outer_projection.push(lifted);
                }
                None => {
                    log::warn!("Dropping {entry} from push-down: it cannot be lifted");
                    self.member_projections.retain(|_, value| *value != entry);
                }
            }
        }

        subquery.tables = std::mem::take(&mut self.tables);
        for ordering in std::mem::take(&mut self.order_by) {
            let expression = renamed_aliases
                .iter()
                .find(|(old, _)| *old == ordering.expression)
                .map_or(ordering.expression, |(_, new)| Arc::clone(new));
            subquery.add_to_order_by(Ordering::new(expression, ordering.direction));
        }
        subquery.predicate = self.predicate.take();
        subquery.group_by = std::mem::take(&mut self.group_by);
        subquery.limit = self.limit.take();
        subquery.offset = self.offset.take();
        subquery.is_distinct = self.is_distinct;
        subquery.project_star_table = self.project_star_table.take();

        if subquery.limit.is_none() && subquery.offset.is_none() {
            subquery.order_by.clear();
        }

        self.clear();
        self.project_star_table = subquery.alias.clone();
        self.projection = outer_projection;
        self.set_project_star(true);

        log::debug!(
            "Pushed down into subquery '{}' ({} tables, {} projected)",
            subquery_ref.alias(),
            subquery.tables.len(),
            self.star_projection.len()
        );

        self.tables.push(TableExpr::Select(Box::new(subquery)));
        match self.tables.last_mut() {
            Some(TableExpr::Select(subquery)) => &mut **subquery,
            _ => unreachable!("pushed-down subquery is the last table"),
        }
    }

    /// Carry the ordering of the star subquery up to this statement.
    ///
    /// Orderings are collected from the innermost ordered level. Each one is
    /// exposed by the subquery (projected there first if needed) and
    /// re-expressed against it, keeping its direction. The subquery drops
    /// its own ordering unless it is paged.
    pub fn lift_order_by(&mut self) {
        let Some(index) = self.project_star_table_index() else {
            return;
        };
        let table = &mut self.tables[index];
        let subquery_ref = table.table_ref();
        let Some(subquery) = table.as_select_mut() else {
            return;
        };

        if subquery.order_by.is_empty() {
            subquery.lift_order_by();
        }

        for ordering in subquery.order_by.clone() {
            let expression = SqlExpr::without_nullable_widening(&ordering.expression);
            let exposed = subquery.expose(expression);
            match SqlExpr::lift_from_subquery(&exposed, &subquery_ref) {
                Some(lifted) => self
                    .order_by
                    .push(Ordering::new(lifted, ordering.direction)),
                None => log::warn!("Ordering on {exposed} cannot be lifted; dropped"),
            }
        }

        if subquery.limit.is_none() && subquery.offset.is_none() {
            subquery.order_by.clear();
        }

        log::debug!(
            "Lifted {} orderings out of '{}'",
            self.order_by.len(),
            subquery_ref.alias()
        );
    }

    /// Set or clear LIMIT.
    ///
    /// A limit set while a limit or an offset is already in place is applied
    /// to the paged result: the statement is pushed down (keeping its
    /// ordering) first.
    pub fn set_limit(&mut self, ctx: &mut CompilationContext, limit: Option<ExprRef>) {
        if limit.is_some() && (self.limit.is_some() || self.offset.is_some()) {
            self.push_down_subquery(ctx);
            self.lift_order_by();
        }
        self.limit = limit;
    }

    /// Set or clear OFFSET; pushes down first when a limit is in place
    pub fn set_offset(&mut self, ctx: &mut CompilationContext, offset: Option<ExprRef>) {
        if offset.is_some() && self.limit.is_some() {
            self.push_down_subquery(ctx);
            self.lift_order_by();
        }
        self.offset = offset;
    }

    /// Set or clear DISTINCT.
    ///
    /// DISTINCT over a paged result pushes down first. Orderings on values
    /// that are not projected are dropped.
    pub fn set_distinct(&mut self, ctx: &mut CompilationContext, value: bool) {
        if value && (self.limit.is_some() || self.offset.is_some()) {
            self.push_down_subquery(ctx);
        }

        if value {
            let orderings = std::mem::take(&mut self.order_by);
            let (kept, dropped): (Vec<_>, Vec<_>) = orderings
                .into_iter()
                .partition(|o| self.projects_ordering(o));
            if !dropped.is_empty() {
                log::debug!("DISTINCT dropped {} unprojected orderings", dropped.len());
            }
            self.order_by = kept;
        }

        self.is_distinct = value;
    }

    /// Turn star mode into an explicit projection of the star entries
    pub fn explode_star_projection(&mut self) {
        if !self.is_project_star {
            return;
        }
        let star = std::mem::take(&mut self.star_projection);
        log::debug!("Exploding {} star entries", star.len());
        self.projection.extend(star);
        self.set_project_star(false);
    }
}

#[cfg(test)]
#[path = "pushdown_test.rs"]
mod tests;
