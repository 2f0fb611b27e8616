//! Property binding through nested subqueries

use super::projection::{entry_matches, unique_entry};
use super::SelectExpression;
use crate::ir::expr::{ExprRef, SqlExpr};
use crate::source::QuerySource;
use relq_core::Property;
use std::sync::Arc;

impl SelectExpression {
    /// Expression for `property` of `query_source` as seen by this statement.
    ///
    /// When the owning table is a subquery, the property is bound inside it,
    /// exposed by its projection and lifted to a reference against it. In
    /// star mode the result is memoized in the star projection, so binding
    /// the same property twice yields the same entry.
    pub fn bind_property(
        &mut self,
        property: &Arc<Property>,
        query_source: &QuerySource,
    ) -> Option<ExprRef> {
        let Some(index) = self.table_index_for_query_source(query_source) else {
            log::warn!(
                "No table handles query source {query_source:?}; cannot bind '{}'",
                property.name
            );
            return None;
        };

        let table = self.tables[index].inner_table_mut();
        let table_ref = table.table_ref();
        let bound = match table.as_select_mut() {
            Some(subquery) => {
                let inner = subquery.bind_property(property, query_source)?;
                let exposed = subquery.expose(inner);
                match SqlExpr::lift_from_subquery(&exposed, &table_ref) {
                    Some(lifted) => lifted,
                    None => {
                        log::warn!(
                            "Cannot lift {exposed} out of subquery '{}'",
                            table_ref.alias()
                        );
                        return None;
                    }
                }
            }
            None => SqlExpr::column(property, &table_ref),
        };
        log::trace!("Bound '{}' to {bound}", property.name);

        if self.is_project_star {
            if let Some(existing) = self
                .star_projection
                .iter()
                .find(|e| entry_matches(e, &bound))
            {
                return Some(Arc::clone(existing.alias_inner().unwrap_or(existing)));
            }
            // Output names of a subquery stay unique; the star entry may be
            // an alias over the bound value, which is returned bare
            let entry = if self.alias.is_some() {
                unique_entry(
                    &mut self.star_projection,
                    &self.projection,
                    &mut [],
                    &self.column_alias_prefix,
                    &bound,
                    None,
                )
            } else {
                Arc::clone(&bound)
            };
            self.star_projection.push(entry);
        }
        Some(bound)
    }

    /// Read-only variant of [`bind_property`](Self::bind_property): resolves
    /// only values the subqueries already expose
    pub fn resolve_property(
        &self,
        property: &Arc<Property>,
        query_source: &QuerySource,
    ) -> Option<ExprRef> {
        let index = self.table_index_for_query_source(query_source)?;
        let table = self.tables[index].inner_table();
        match table.as_select() {
            Some(subquery) => {
                let inner = subquery.resolve_property(property, query_source)?;
                let exposed = subquery.find_output(&inner)?;
                SqlExpr::lift_from_subquery(exposed, &table.table_ref())
            }
            None => Some(SqlExpr::column(property, &table.table_ref())),
        }
    }

    /// Lift entry `index` of the subquery backing `query_source`.
    ///
    /// Indexes address the star projection when the subquery is in star
    /// mode, the live projection otherwise.
    pub fn bind_subquery_projection_index(
        &self,
        index: usize,
        query_source: &QuerySource,
    ) -> Option<ExprRef> {
        let table = self.table_for_query_source(query_source)?.inner_table();
        let subquery = table.as_select()?;
        let entry = if subquery.is_project_star {
            subquery.star_projection.get(index)
        } else {
            subquery.projection.get(index)
        }?;
        SqlExpr::lift_from_subquery(entry, &table.table_ref())
    }

    /// Make sure this statement outputs `expr` and return the entry that
    /// does.
    ///
    /// In star mode columns are already output through the star; they are
    /// only recorded in the star projection.
    pub(crate) fn expose(&mut self, expr: ExprRef) -> ExprRef {
        if self.is_project_star && expr.is_column_like() {
            if let Some(existing) = self.find_output(&expr) {
                return Arc::clone(existing);
            }
            let entry = if self.alias.is_some() {
                unique_entry(
                    &mut self.star_projection,
                    &self.projection,
                    &mut self.order_by,
                    &self.column_alias_prefix,
                    &expr,
                    None,
                )
            } else {
                expr
            };
            self.star_projection.push(Arc::clone(&entry));
            return entry;
        }

        let index = self.add_to_projection(expr, false);
        Arc::clone(&self.projection[index])
    }
}
