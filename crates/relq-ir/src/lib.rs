//! relq-ir: SQL SELECT intermediate representation
//!
//! This crate provides the relational expression nodes, table and join
//! entries, and `SelectExpression`, the builder that composes one SELECT
//! statement clause by clause and pushes it down into a subquery whenever a
//! new clause could not otherwise keep its meaning.

pub mod context;
pub mod error;
pub mod ir;
pub mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use context::CompilationContext;
pub use error::{IrError, IrResult};
pub use ir::expr::{
    BinOp, CaseWhen, ExprRef, InValues, LiteralValue, SqlExpr, SqlFunctionBuilder, TypeMapping,
    UnOp,
};
pub use ir::select::{OrderDirection, Ordering, ProjectionType, SelectExpression};
pub use ir::table::{JoinExpr, PredicateJoinExpr, TableExpr, TableRef};
pub use ir::visitor::SqlVisitor;
pub use source::{QuerySource, QuerySourceId, QuerySourceKind};
