//! Projection list maintenance, unique output names and member mapping

use super::{same_ordering_key, Ordering, SelectExpression};
use crate::ir::expr::{ExprRef, SqlExpr};
use crate::source::QuerySource;
use relq_core::{Nullability, Property, SqlType};
use std::sync::Arc;

/// Shape of one projected value as the result shaper reads it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionType {
    pub sql_type: SqlType,
    pub nullability: Nullability,
    /// Backing property when the value reads a mapped column
    pub property: Option<Arc<Property>>,
}

/// True if `entry` is `expr` or an alias over it
pub(crate) fn entry_matches(entry: &ExprRef, expr: &ExprRef) -> bool {
    entry == expr || entry.alias_inner() == Some(expr)
}

fn name_taken(entries: &[ExprRef], name: &str) -> bool {
    entries
        .iter()
        .filter_map(|e| e.projection_name())
        .any(|n| n.eq_ignore_ascii_case(name))
}

/// Give `expr` an output name unique (ignoring case) across `list` and
/// `others`.
///
/// The base name is `new_alias`, else the expression's own name, else
/// `prefix`; `0`, `1`, ... is appended until free. The result is wrapped in
/// an alias when the expression has no name of its own or had to be renamed.
/// If `expr` already sits in `list`, the renamed entry replaces it in place;
/// an ordering on `expr` is rewritten the same way.
pub(crate) fn unique_entry(
    list: &mut Vec<ExprRef>,
    others: &[ExprRef],
    order_by: &mut [Ordering],
    prefix: &str,
    expr: &ExprRef,
    new_alias: Option<&str>,
) -> ExprRef {
    let current_index = list.iter().position(|e| e == expr);
    if let Some(index) = current_index {
        list.remove(index);
    }

    let current_name = expr.projection_name();
    let base = new_alias.or(current_name).unwrap_or(prefix).to_string();
    let mut unique = base.clone();
    let mut counter = 0usize;
    while name_taken(list, &unique) || name_taken(others, &unique) {
        unique = format!("{base}{counter}");
        counter += 1;
    }

    let named = matches!(
        expr.as_ref(),
        SqlExpr::Column(_) | SqlExpr::ColumnReference(_) | SqlExpr::Alias(_)
    );
    let renamed = !current_name.is_some_and(|n| n.eq_ignore_ascii_case(&unique));
    let updated = if !named || renamed {
        let inner = expr.alias_inner().unwrap_or(expr);
        SqlExpr::alias_unchecked(unique, Arc::clone(inner))
    } else {
        Arc::clone(expr)
    };

    if let Some(ordering) = order_by.iter_mut().find(|o| o.expression == *expr) {
        ordering.expression = Arc::clone(&updated);
    }
    if let Some(index) = current_index {
        list.insert(index, Arc::clone(&updated));
    }
    updated
}

impl SelectExpression {
    /// Append `expr` to the projection and return its index.
    ///
    /// A nullable widening around `expr` is dropped first. An entry equal to
    /// `expr` (or aliasing it) is reused. Subquery statements name every
    /// entry uniquely; a computed value that is already ordered on gets a
    /// `c`-prefixed alias and the ordering is rewritten to match.
    pub fn add_to_projection(&mut self, expr: ExprRef, reset_project_star: bool) -> usize {
        let expr = SqlExpr::without_nullable_widening(&expr);

        if let Some(index) = self
            .projection
            .iter()
            .position(|e| entry_matches(e, &expr))
        {
            return index;
        }

        let mut to_add = Arc::clone(&expr);

        if !expr.is_column_like() && self.order_by.iter().any(|o| o.expression == expr) {
            let prefix = self.column_alias_prefix.clone();
            to_add = unique_entry(
                &mut self.projection,
                &self.star_projection,
                &mut self.order_by,
                &prefix,
                &expr,
                Some(&prefix),
            );
        }

        if self.alias.is_some() {
            to_add = unique_entry(
                &mut self.projection,
                &self.star_projection,
                &mut self.order_by,
                &self.column_alias_prefix,
                &to_add,
                None,
            );
        }

        self.projection.push(to_add);

        if reset_project_star {
            self.set_project_star(false);
        }

        self.projection.len() - 1
    }

    /// Bind `property` of `query_source` and project it.
    ///
    /// Returns `None` when no table handles the source.
    pub fn add_property_to_projection(
        &mut self,
        property: &Arc<Property>,
        query_source: &QuerySource,
    ) -> Option<usize> {
        let bound = self.bind_property(property, query_source)?;
        Some(self.add_to_projection(bound, true))
    }

    /// Index of the projection entry reading `property` of `query_source`
    pub fn get_projection_index(
        &self,
        property: &Arc<Property>,
        query_source: &QuerySource,
    ) -> Option<usize> {
        let target = self.resolve_property(property, query_source)?;
        self.projection
            .iter()
            .position(|e| entry_matches(e, &target))
    }

    /// Replace the whole projection, bypassing dedup and naming
    pub fn replace_projection(&mut self, expressions: impl IntoIterator<Item = ExprRef>) {
        self.projection.clear();
        self.projection.extend(expressions);
    }

    /// Make `expr` the single projected value
    pub fn set_projection_expression(&mut self, expr: ExprRef) {
        self.projection.clear();
        self.add_to_projection(expr, true);
    }

    pub fn clear_projection(&mut self) {
        self.projection.clear();
    }

    /// Drop every projection entry from `index` on
    pub fn remove_range_from_projection(&mut self, index: usize) {
        if index < self.projection.len() {
            self.projection.truncate(index);
        }
    }

    /// Value types the result shaper reads, star table first.
    ///
    /// Boxing conversions are looked through.
    pub fn get_projection_types(&self) -> Vec<ProjectionType> {
        let mut types = Vec::new();

        if self.is_project_star {
            if let Some(sub) = self
                .project_star_table()
                .and_then(|t| t.inner_table().as_select())
            {
                types.extend(sub.get_projection_types());
            }
        }

        types.extend(self.projection.iter().map(|entry| {
            let value = match entry.as_ref() {
                SqlExpr::Convert(c) if c.is_boxing() => c.operand(),
                _ => entry,
            };
            ProjectionType {
                sql_type: value.resolved_type().clone(),
                nullability: value.nullability(),
                property: value.find_property().cloned(),
            }
        }));

        types
    }

    /// Projection registered for a member of the result type
    pub fn get_projection_for_member(&self, member: &str) -> Option<&ExprRef> {
        self.member_projections.get(member)
    }

    /// Register `projection` for `member`, named after the member.
    ///
    /// If the value is already projected, the entry is renamed in place.
    pub fn set_projection_for_member(&mut self, member: &str, projection: ExprRef) {
        let unique = unique_entry(
            &mut self.projection,
            &self.star_projection,
            &mut self.order_by,
            &self.column_alias_prefix,
            &projection,
            Some(member),
        );
        log::trace!("Member '{member}' mapped to {unique}");
        self.member_projections.insert(member.to_string(), unique);
    }

    /// Projected entry matching `expr`, live projection first
    pub(crate) fn find_output(&self, expr: &ExprRef) -> Option<&ExprRef> {
        self.projection
            .iter()
            .chain(self.star_projection.iter())
            .find(|e| entry_matches(e, expr))
    }

    /// True if some projected value matches `ordering` ignoring conversions
    pub(crate) fn projects_ordering(&self, ordering: &Ordering) -> bool {
        self.projection
            .iter()
            .chain(self.star_projection.iter())
            .any(|e| {
                same_ordering_key(e, &ordering.expression)
                    || e
                        .alias_inner()
                        .is_some_and(|inner| same_ordering_key(inner, &ordering.expression))
            })
    }
}
