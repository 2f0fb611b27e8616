//! Error types for relq-ir

use relq_core::SqlType;
use thiserror::Error;

/// IR construction error type
///
/// These use the `IR` prefix to stay distinct from the `E` codes of
/// relq-core. Every variant is a fatal, deterministic construction failure;
/// unresolved bindings are reported as `None`, never as errors.
#[derive(Error, Debug)]
pub enum IrError {
    /// IR001: A CASE test does not match the operand type (or BOOLEAN)
    #[error("[IR001] CASE test #{index} has type {found}, expected {expected}")]
    CaseTestTypeMismatch {
        index: usize,
        expected: SqlType,
        found: SqlType,
    },

    /// IR002: A CASE result does not match the first result's type
    #[error("[IR002] CASE result #{index} has type {found}, expected {expected}")]
    CaseResultTypeMismatch {
        index: usize,
        expected: SqlType,
        found: SqlType,
    },

    /// IR003: The CASE ELSE branch does not match the result type
    #[error("[IR003] CASE ELSE has type {found}, expected {expected}")]
    CaseElseTypeMismatch { expected: SqlType, found: SqlType },

    /// IR004: A CASE expression needs at least one WHEN clause
    #[error("[IR004] CASE expression requires at least one WHEN clause")]
    CaseWithoutWhen,

    /// IR005: Instance type mapping supplied for a function without an instance
    #[error("[IR005] Function '{function}' has an instance type mapping but no instance")]
    InstanceMappingWithoutInstance { function: String },

    /// IR006: Argument type mapping count differs from argument count
    #[error("[IR006] Function '{function}' has {arguments} arguments but {mappings} argument type mappings")]
    ArgumentMappingCount {
        function: String,
        arguments: usize,
        mappings: usize,
    },

    /// IR007: One of the argument type mappings is missing
    #[error("[IR007] Function '{function}' is missing the type mapping for argument #{index}")]
    MissingTypeMapping { function: String, index: usize },

    /// IR008: A required string argument was empty
    #[error("[IR008] {node}: '{argument}' must not be empty")]
    EmptyArgument {
        node: &'static str,
        argument: &'static str,
    },

    /// IR010: A table-valued function source was given something other than a call
    #[error("[IR010] Table-valued function '{alias}' must wrap a function call, got {found}")]
    NotAFunctionCall { alias: String, found: &'static str },

    /// IR011: A statement used as a table has no alias
    #[error("[IR011] A subquery used as a table requires an alias")]
    SubqueryWithoutAlias,

    /// IR009: Core error propagation
    #[error("[IR009] Core error: {0}")]
    Core(#[from] relq_core::CoreError),
}

/// Result type alias for IrError
pub type IrResult<T> = Result<T, IrError>;

/// Reject empty or whitespace-only required strings
pub(crate) fn require_non_empty(
    value: &str,
    node: &'static str,
    argument: &'static str,
) -> IrResult<()> {
    if value.trim().is_empty() {
        return Err(IrError::EmptyArgument { node, argument });
    }
    Ok(())
}
