//! Table-list entries: base tables, raw SQL sources, table-valued functions,
//! subqueries and joins.

use super::expr::{ExprRef, SqlExpr};
use super::select::SelectExpression;
use crate::error::{require_non_empty, IrError, IrResult};
use crate::source::QuerySource;

/// Identity of a table instance as seen by columns.
///
/// Table aliases are unique within a compilation, so the alias alone names
/// one table instance; the query source is carried for correlation checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    alias: String,
    query_source: Option<QuerySource>,
}

impl TableRef {
    /// Build a reference
    pub fn new(alias: impl Into<String>, query_source: Option<QuerySource>) -> Self {
        Self {
            alias: alias.into(),
            query_source,
        }
    }

    /// Table alias
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Query source of the table, if it has one
    pub fn query_source(&self) -> Option<&QuerySource> {
        self.query_source.as_ref()
    }
}

/// A named base table or view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableExpression {
    pub(crate) name: String,
    pub(crate) schema: Option<String>,
    pub(crate) alias: String,
    pub(crate) query_source: QuerySource,
}

impl TableExpression {
    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema qualifier
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }
}

/// A raw SQL query used as a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FromSqlExpression {
    pub(crate) sql: String,
    pub(crate) arguments: Vec<ExprRef>,
    pub(crate) alias: String,
    pub(crate) query_source: QuerySource,
}

impl FromSqlExpression {
    /// SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Parameter values
    pub fn arguments(&self) -> &[ExprRef] {
        &self.arguments
    }
}

/// A function call returning rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableValuedFunctionExpression {
    pub(crate) function: ExprRef,
    pub(crate) alias: String,
    pub(crate) query_source: QuerySource,
}

impl TableValuedFunctionExpression {
    /// The call, always a [`SqlExpr::SqlFunction`]
    pub fn function(&self) -> &ExprRef {
        &self.function
    }
}

/// Join without a condition (CROSS JOIN / CROSS JOIN LATERAL)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinExpr {
    pub(crate) table: Box<TableExpr>,
}

impl JoinExpr {
    /// Joined table
    pub fn table(&self) -> &TableExpr {
        &self.table
    }
}

/// Join with an ON predicate (INNER / LEFT OUTER)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateJoinExpr {
    pub(crate) table: Box<TableExpr>,
    pub(crate) predicate: Option<ExprRef>,
}

impl PredicateJoinExpr {
    /// Joined table
    pub fn table(&self) -> &TableExpr {
        &self.table
    }

    /// ON predicate
    pub fn predicate(&self) -> Option<&ExprRef> {
        self.predicate.as_ref()
    }

    /// Replace the ON predicate
    pub fn set_predicate(&mut self, predicate: Option<ExprRef>) {
        self.predicate = predicate;
    }

    /// AND another condition onto the ON predicate
    pub fn add_to_predicate(&mut self, predicate: ExprRef) {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => SqlExpr::and(existing, predicate),
            None => predicate,
        });
    }
}

/// One entry of a statement's FROM list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableExpr {
    /// Base table
    Table(TableExpression),
    /// Raw SQL source
    FromSql(FromSqlExpression),
    /// Table-valued function
    TableValuedFunction(TableValuedFunctionExpression),
    /// Nested SELECT
    Select(Box<SelectExpression>),
    /// CROSS JOIN
    CrossJoin(JoinExpr),
    /// CROSS JOIN LATERAL
    CrossJoinLateral(JoinExpr),
    /// INNER JOIN .. ON
    InnerJoin(PredicateJoinExpr),
    /// LEFT JOIN .. ON
    LeftOuterJoin(PredicateJoinExpr),
}

impl TableExpr {
    /// Base table `schema.name AS alias`
    pub fn table(
        name: impl Into<String>,
        schema: Option<String>,
        alias: impl Into<String>,
        query_source: QuerySource,
    ) -> IrResult<Self> {
        let name = name.into();
        let alias = alias.into();
        require_non_empty(&name, "Table", "name")?;
        require_non_empty(&alias, "Table", "alias")?;
        if let Some(schema) = &schema {
            require_non_empty(schema, "Table", "schema")?;
        }
        Ok(TableExpr::Table(TableExpression {
            name,
            schema,
            alias,
            query_source,
        }))
    }

    /// Raw SQL source
    pub fn from_sql(
        sql: impl Into<String>,
        arguments: Vec<ExprRef>,
        alias: impl Into<String>,
        query_source: QuerySource,
    ) -> IrResult<Self> {
        let sql = sql.into();
        let alias = alias.into();
        require_non_empty(&sql, "FromSql", "sql")?;
        require_non_empty(&alias, "FromSql", "alias")?;
        Ok(TableExpr::FromSql(FromSqlExpression {
            sql,
            arguments,
            alias,
            query_source,
        }))
    }

    /// Table-valued function; `function` must be a function call
    pub fn table_valued_function(
        function: ExprRef,
        alias: impl Into<String>,
        query_source: QuerySource,
    ) -> IrResult<Self> {
        let alias = alias.into();
        require_non_empty(&alias, "TableValuedFunction", "alias")?;
        if !matches!(function.as_ref(), SqlExpr::SqlFunction(_)) {
            return Err(IrError::NotAFunctionCall {
                alias,
                found: function.node_name(),
            });
        }
        Ok(TableExpr::TableValuedFunction(
            TableValuedFunctionExpression {
                function,
                alias,
                query_source,
            },
        ))
    }

    /// Wrap a subquery. Its alias names the table, so it must have one.
    pub fn select(select: SelectExpression) -> IrResult<Self> {
        if select.alias().is_none() {
            return Err(IrError::SubqueryWithoutAlias);
        }
        Ok(TableExpr::Select(Box::new(select)))
    }

    /// Alias of the entry; joins report their joined table's alias
    pub fn alias(&self) -> Option<&str> {
        match self {
            TableExpr::Table(t) => Some(&t.alias),
            TableExpr::FromSql(t) => Some(&t.alias),
            TableExpr::TableValuedFunction(t) => Some(&t.alias),
            TableExpr::Select(s) => s.alias(),
            TableExpr::CrossJoin(j) | TableExpr::CrossJoinLateral(j) => j.table.alias(),
            TableExpr::InnerJoin(j) | TableExpr::LeftOuterJoin(j) => j.table.alias(),
        }
    }

    /// Query source of the entry; joins report their joined table's source
    pub fn query_source(&self) -> Option<&QuerySource> {
        match self {
            TableExpr::Table(t) => Some(&t.query_source),
            TableExpr::FromSql(t) => Some(&t.query_source),
            TableExpr::TableValuedFunction(t) => Some(&t.query_source),
            TableExpr::Select(s) => s.query_source(),
            TableExpr::CrossJoin(j) | TableExpr::CrossJoinLateral(j) => j.table.query_source(),
            TableExpr::InnerJoin(j) | TableExpr::LeftOuterJoin(j) => j.table.query_source(),
        }
    }

    /// Identity used by columns bound to this entry
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(
            self.alias().unwrap_or_default(),
            self.query_source().cloned(),
        )
    }

    /// True if this entry, or anything nested in it, backs `query_source`.
    /// Both sides are normalized first.
    pub fn handles_query_source(&self, query_source: &QuerySource) -> bool {
        match self {
            TableExpr::Select(s) => s.handles_query_source(query_source),
            TableExpr::CrossJoin(j) | TableExpr::CrossJoinLateral(j) => {
                j.table.handles_query_source(query_source)
            }
            TableExpr::InnerJoin(j) | TableExpr::LeftOuterJoin(j) => {
                j.table.handles_query_source(query_source)
            }
            _ => self
                .query_source()
                .is_some_and(|own| own.same_origin(query_source)),
        }
    }

    /// The joined table for a join, the entry itself otherwise
    pub fn inner_table(&self) -> &TableExpr {
        match self {
            TableExpr::CrossJoin(j) | TableExpr::CrossJoinLateral(j) => &*j.table,
            TableExpr::InnerJoin(j) | TableExpr::LeftOuterJoin(j) => &*j.table,
            other => other,
        }
    }

    /// Mutable variant of [`inner_table`](Self::inner_table)
    pub fn inner_table_mut(&mut self) -> &mut TableExpr {
        match self {
            TableExpr::CrossJoin(j) | TableExpr::CrossJoinLateral(j) => &mut *j.table,
            TableExpr::InnerJoin(j) | TableExpr::LeftOuterJoin(j) => &mut *j.table,
            other => other,
        }
    }

    /// The subquery, if this entry is one
    pub fn as_select(&self) -> Option<&SelectExpression> {
        match self {
            TableExpr::Select(s) => Some(&**s),
            _ => None,
        }
    }

    /// Mutable access to the subquery, if this entry is one
    pub fn as_select_mut(&mut self) -> Option<&mut SelectExpression> {
        match self {
            TableExpr::Select(s) => Some(&mut **s),
            _ => None,
        }
    }

    /// Mutable access to a predicate join
    pub fn as_predicate_join_mut(&mut self) -> Option<&mut PredicateJoinExpr> {
        match self {
            TableExpr::InnerJoin(j) | TableExpr::LeftOuterJoin(j) => Some(j),
            _ => None,
        }
    }

    pub(crate) fn cross_join(table: TableExpr) -> Self {
        TableExpr::CrossJoin(JoinExpr {
            table: Box::new(table),
        })
    }

    pub(crate) fn cross_join_lateral(table: TableExpr) -> Self {
        TableExpr::CrossJoinLateral(JoinExpr {
            table: Box::new(table),
        })
    }

    pub(crate) fn inner_join(table: TableExpr) -> Self {
        TableExpr::InnerJoin(PredicateJoinExpr {
            table: Box::new(table),
            predicate: None,
        })
    }

    pub(crate) fn left_outer_join(table: TableExpr) -> Self {
        TableExpr::LeftOuterJoin(PredicateJoinExpr {
            table: Box::new(table),
            predicate: None,
        })
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
