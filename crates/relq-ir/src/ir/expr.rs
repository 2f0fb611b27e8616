//! Relational expression nodes.
//!
//! Nodes are immutable once built and shared through [`ExprRef`] handles, so a
//! clause value can sit in several statements at once (a clone and its
//! original, an ordering and a projection) and a rewrite that changes nothing
//! hands back the very same handle.

use super::select::SelectExpression;
use super::table::TableRef;
use crate::error::{require_non_empty, IrError, IrResult};
use relq_core::{Nullability, Property, SqlType};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared handle to an expression node
pub type ExprRef = Arc<SqlExpr>;

static BOOLEAN: SqlType = SqlType::Boolean;

/// A literal value in the IR
#[derive(Debug, Clone)]
pub enum LiteralValue {
    /// Null literal
    Null,
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
}

// Floats compare by bit pattern so equality and hashing agree.
impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LiteralValue::Null, LiteralValue::Null) => true,
            (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => a == b,
            (LiteralValue::Integer(a), LiteralValue::Integer(b)) => a == b,
            (LiteralValue::Float(a), LiteralValue::Float(b)) => a.to_bits() == b.to_bits(),
            (LiteralValue::String(a), LiteralValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for LiteralValue {}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LiteralValue::Null => {}
            LiteralValue::Boolean(b) => b.hash(state),
            LiteralValue::Integer(i) => i.hash(state),
            LiteralValue::Float(f) => f.to_bits().hash(state),
            LiteralValue::String(s) => s.hash(state),
        }
    }
}

/// Binary operator enum with variants for common SQL operators
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// Equality (=)
    Eq,
    /// Inequality (<>)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// Addition (+)
    Plus,
    /// Subtraction (-)
    Minus,
    /// Multiplication (*)
    Multiply,
    /// Division (/)
    Divide,
    /// Modulo (%)
    Modulo,
    /// String concatenation (||)
    StringConcat,
}

impl BinOp {
    /// Check if this is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq
        )
    }

    /// Check if this is a logical operator
    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Eq => write!(f, "="),
            BinOp::NotEq => write!(f, "<>"),
            BinOp::Lt => write!(f, "<"),
            BinOp::LtEq => write!(f, "<="),
            BinOp::Gt => write!(f, ">"),
            BinOp::GtEq => write!(f, ">="),
            BinOp::And => write!(f, "AND"),
            BinOp::Or => write!(f, "OR"),
            BinOp::Plus => write!(f, "+"),
            BinOp::Minus => write!(f, "-"),
            BinOp::Multiply => write!(f, "*"),
            BinOp::Divide => write!(f, "/"),
            BinOp::Modulo => write!(f, "%"),
            BinOp::StringConcat => write!(f, "||"),
        }
    }
}

/// Unary operator enum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnOp {
    /// Logical NOT
    Not,
    /// Unary minus (negation)
    Minus,
}

impl std::fmt::Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnOp::Not => write!(f, "NOT"),
            UnOp::Minus => write!(f, "-"),
        }
    }
}

/// Store type hint attached to function results, instances and arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeMapping {
    /// Store type name as the database spells it (`nvarchar(max)`)
    pub store_type: String,
    /// Parsed type
    pub sql_type: SqlType,
}

impl TypeMapping {
    /// Build a mapping from a store type name
    pub fn new(store_type: impl Into<String>) -> Self {
        let store_type = store_type.into();
        let sql_type = relq_core::parse_sql_type(&store_type);
        Self {
            store_type,
            sql_type,
        }
    }
}

/// A column of a table in the current statement
#[derive(Debug, Clone)]
pub struct ColumnExpr {
    pub(crate) name: String,
    pub(crate) table: TableRef,
    pub(crate) property: Option<Arc<Property>>,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl ColumnExpr {
    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning table
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Backing property, when bound from the model
    pub fn property(&self) -> Option<&Arc<Property>> {
        self.property.as_ref()
    }
}

// Two columns are the same column when they read the same property (or the
// same name, for unmapped columns) from the same table instance. Type and
// nullability do not participate.
impl PartialEq for ColumnExpr {
    fn eq(&self, other: &Self) -> bool {
        if self.table != other.table {
            return false;
        }
        match (&self.property, &other.property) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

impl Eq for ColumnExpr {}

impl Hash for ColumnExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        match &self.property {
            Some(property) => {
                true.hash(state);
                property.hash(state);
            }
            None => {
                false.hash(state);
                self.name.hash(state);
            }
        }
    }
}

/// A projected value of a subquery table, seen from the enclosing statement
#[derive(Debug, Clone)]
pub struct ColumnReferenceExpr {
    pub(crate) name: String,
    pub(crate) table: TableRef,
    pub(crate) referenced: ExprRef,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl ColumnReferenceExpr {
    /// Name under which the subquery exposes the value
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The subquery table
    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// The projection entry inside the subquery this refers to
    pub fn referenced(&self) -> &ExprRef {
        &self.referenced
    }
}

impl PartialEq for ColumnReferenceExpr {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.table == other.table && self.referenced == other.referenced
    }
}

impl Eq for ColumnReferenceExpr {}

impl Hash for ColumnReferenceExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.table.hash(state);
    }
}

/// `expr AS alias`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasExpr {
    pub(crate) alias: String,
    pub(crate) expr: ExprRef,
}

impl AliasExpr {
    /// The alias
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The aliased expression
    pub fn expr(&self) -> &ExprRef {
        &self.expr
    }
}

/// A constant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralExpr {
    pub(crate) value: LiteralValue,
    pub(crate) sql_type: SqlType,
}

impl LiteralExpr {
    /// The value
    pub fn value(&self) -> &LiteralValue {
        &self.value
    }
}

/// A named command parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterExpr {
    pub(crate) name: String,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl ParameterExpr {
    /// Parameter name, without any dialect prefix
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// `left op right`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryExpr {
    pub(crate) op: BinOp,
    pub(crate) left: ExprRef,
    pub(crate) right: ExprRef,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl BinaryExpr {
    /// Operator
    pub fn op(&self) -> &BinOp {
        &self.op
    }

    /// Left operand
    pub fn left(&self) -> &ExprRef {
        &self.left
    }

    /// Right operand
    pub fn right(&self) -> &ExprRef {
        &self.right
    }
}

/// `op operand`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnaryExpr {
    pub(crate) op: UnOp,
    pub(crate) operand: ExprRef,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl UnaryExpr {
    /// Operator
    pub fn op(&self) -> &UnOp {
        &self.op
    }

    /// Operand
    pub fn operand(&self) -> &ExprRef {
        &self.operand
    }
}

/// Implicit conversion that never reaches SQL text.
///
/// Converting to the operand's own type only widens nullability; converting
/// to [`SqlType::Any`] boxes the value for the result shaper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConvertExpr {
    pub(crate) operand: ExprRef,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl ConvertExpr {
    /// Operand
    pub fn operand(&self) -> &ExprRef {
        &self.operand
    }

    /// True when only nullability changes
    pub fn is_nullable_widening(&self) -> bool {
        self.sql_type == *self.operand.resolved_type()
    }

    /// True when the target is the untyped `Any` slot
    pub fn is_boxing(&self) -> bool {
        self.sql_type.is_any()
    }
}

/// SQL `CAST(operand AS type)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExplicitCastExpr {
    pub(crate) operand: ExprRef,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl ExplicitCastExpr {
    /// Operand
    pub fn operand(&self) -> &ExprRef {
        &self.operand
    }
}

/// `operand IS [NOT] NULL`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IsNullExpr {
    pub(crate) operand: ExprRef,
    pub(crate) negated: bool,
}

impl IsNullExpr {
    /// Operand
    pub fn operand(&self) -> &ExprRef {
        &self.operand
    }

    /// True for IS NOT NULL
    pub fn negated(&self) -> bool {
        self.negated
    }
}

/// One `WHEN test THEN result` arm
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseWhen {
    /// WHEN condition (or value compared to the operand)
    pub test: ExprRef,
    /// THEN value
    pub result: ExprRef,
}

impl CaseWhen {
    /// Build a WHEN arm
    pub fn new(test: ExprRef, result: ExprRef) -> Self {
        Self { test, result }
    }
}

/// `CASE [operand] WHEN .. THEN .. [ELSE ..] END`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseExpr {
    pub(crate) operand: Option<ExprRef>,
    pub(crate) when_clauses: Vec<CaseWhen>,
    pub(crate) else_result: Option<ExprRef>,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl CaseExpr {
    /// Operand of a simple CASE
    pub fn operand(&self) -> Option<&ExprRef> {
        self.operand.as_ref()
    }

    /// WHEN arms in order
    pub fn when_clauses(&self) -> &[CaseWhen] {
        &self.when_clauses
    }

    /// ELSE branch
    pub fn else_result(&self) -> Option<&ExprRef> {
        self.else_result.as_ref()
    }
}

/// Right-hand side of an IN
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InValues {
    /// `IN (a, b, c)`
    List(Vec<ExprRef>),
    /// `IN (SELECT ..)`
    Subquery(Arc<SelectExpression>),
}

/// `operand IN (..)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InExpr {
    pub(crate) operand: ExprRef,
    pub(crate) values: InValues,
}

impl InExpr {
    /// Operand
    pub fn operand(&self) -> &ExprRef {
        &self.operand
    }

    /// Value list or subquery
    pub fn values(&self) -> &InValues {
        &self.values
    }
}

/// `match LIKE pattern [ESCAPE escape]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LikeExpr {
    pub(crate) match_expr: ExprRef,
    pub(crate) pattern: ExprRef,
    pub(crate) escape: Option<ExprRef>,
}

impl LikeExpr {
    /// Matched value
    pub fn match_expr(&self) -> &ExprRef {
        &self.match_expr
    }

    /// Pattern
    pub fn pattern(&self) -> &ExprRef {
        &self.pattern
    }

    /// Escape character
    pub fn escape(&self) -> Option<&ExprRef> {
        self.escape.as_ref()
    }
}

/// `EXISTS (SELECT ..)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExistsExpr {
    pub(crate) subquery: Arc<SelectExpression>,
}

impl ExistsExpr {
    /// The subquery
    pub fn subquery(&self) -> &SelectExpression {
        &self.subquery
    }
}

/// A function call, optionally on an instance and in a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlFunctionExpr {
    pub(crate) instance: Option<ExprRef>,
    pub(crate) schema: Option<String>,
    pub(crate) name: String,
    pub(crate) niladic: bool,
    pub(crate) arguments: Vec<ExprRef>,
    pub(crate) result_type_mapping: Option<TypeMapping>,
    pub(crate) instance_type_mapping: Option<TypeMapping>,
    pub(crate) argument_type_mappings: Option<Vec<TypeMapping>>,
    pub(crate) sql_type: SqlType,
    pub(crate) nullability: Nullability,
}

impl SqlFunctionExpr {
    /// Instance receiver (`instance.name(..)`)
    pub fn instance(&self) -> Option<&ExprRef> {
        self.instance.as_ref()
    }

    /// Schema qualifier
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Niladic functions are rendered without parentheses
    pub fn is_niladic(&self) -> bool {
        self.niladic
    }

    /// Arguments in order
    pub fn arguments(&self) -> &[ExprRef] {
        &self.arguments
    }

    /// Result type hint
    pub fn result_type_mapping(&self) -> Option<&TypeMapping> {
        self.result_type_mapping.as_ref()
    }

    /// Instance type hint
    pub fn instance_type_mapping(&self) -> Option<&TypeMapping> {
        self.instance_type_mapping.as_ref()
    }

    /// Per-argument type hints, one per argument when present
    pub fn argument_type_mappings(&self) -> Option<&[TypeMapping]> {
        self.argument_type_mappings.as_deref()
    }
}

/// Builder for [`SqlFunctionExpr`]; `build` enforces the mapping rules
#[derive(Debug, Clone)]
pub struct SqlFunctionBuilder {
    name: String,
    sql_type: SqlType,
    nullability: Nullability,
    instance: Option<ExprRef>,
    schema: Option<String>,
    niladic: bool,
    arguments: Vec<ExprRef>,
    result_type_mapping: Option<TypeMapping>,
    instance_type_mapping: Option<TypeMapping>,
    argument_type_mappings: Option<Vec<Option<TypeMapping>>>,
}

impl SqlFunctionBuilder {
    /// Receiver expression
    pub fn instance(mut self, instance: ExprRef) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Schema qualifier
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Mark as niladic (`CURRENT_TIMESTAMP`)
    pub fn niladic(mut self) -> Self {
        self.niladic = true;
        self
    }

    /// Append one argument
    pub fn argument(mut self, argument: ExprRef) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Append several arguments
    pub fn arguments(mut self, arguments: impl IntoIterator<Item = ExprRef>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    /// Result nullability (defaults to nullable)
    pub fn nullability(mut self, nullability: Nullability) -> Self {
        self.nullability = nullability;
        self
    }

    /// Result type hint
    pub fn result_type_mapping(mut self, mapping: TypeMapping) -> Self {
        self.result_type_mapping = Some(mapping);
        self
    }

    /// Instance type hint
    pub fn instance_type_mapping(mut self, mapping: TypeMapping) -> Self {
        self.instance_type_mapping = Some(mapping);
        self
    }

    /// Per-argument type hints; `None` entries are rejected by `build`
    pub fn argument_type_mappings(
        mut self,
        mappings: impl IntoIterator<Item = Option<TypeMapping>>,
    ) -> Self {
        self.argument_type_mappings = Some(mappings.into_iter().collect());
        self
    }

    /// Validate and build the node
    pub fn build(self) -> IrResult<ExprRef> {
        require_non_empty(&self.name, "SqlFunction", "name")?;
        if let Some(schema) = &self.schema {
            require_non_empty(schema, "SqlFunction", "schema")?;
        }

        if self.instance_type_mapping.is_some() && self.instance.is_none() {
            return Err(IrError::InstanceMappingWithoutInstance {
                function: self.name,
            });
        }

        let argument_type_mappings = match self.argument_type_mappings {
            None => None,
            Some(mappings) => {
                if mappings.len() != self.arguments.len() {
                    return Err(IrError::ArgumentMappingCount {
                        function: self.name,
                        arguments: self.arguments.len(),
                        mappings: mappings.len(),
                    });
                }
                let mut resolved = Vec::with_capacity(mappings.len());
                for (index, mapping) in mappings.into_iter().enumerate() {
                    match mapping {
                        Some(mapping) => resolved.push(mapping),
                        None => {
                            return Err(IrError::MissingTypeMapping {
                                function: self.name,
                                index,
                            })
                        }
                    }
                }
                Some(resolved)
            }
        };

        Ok(Arc::new(SqlExpr::SqlFunction(SqlFunctionExpr {
            instance: self.instance,
            schema: self.schema,
            name: self.name,
            niladic: self.niladic,
            arguments: self.arguments,
            result_type_mapping: self.result_type_mapping,
            instance_type_mapping: self.instance_type_mapping,
            argument_type_mappings,
            sql_type: self.sql_type,
            nullability: self.nullability,
        })))
    }
}

/// Raw SQL text spliced into the statement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlFragmentExpr {
    pub(crate) sql: String,
    pub(crate) sql_type: SqlType,
}

impl SqlFragmentExpr {
    /// The SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// A subquery producing one value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarSubqueryExpr {
    pub(crate) subquery: Arc<SelectExpression>,
    pub(crate) sql_type: SqlType,
}

impl ScalarSubqueryExpr {
    /// The subquery
    pub fn subquery(&self) -> &SelectExpression {
        &self.subquery
    }
}

/// Relational expression node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlExpr {
    /// Column of a table in scope
    Column(ColumnExpr),
    /// Column of a subquery table
    ColumnReference(ColumnReferenceExpr),
    /// Aliased expression
    Alias(AliasExpr),
    /// Constant
    Literal(LiteralExpr),
    /// Command parameter
    Parameter(ParameterExpr),
    /// Binary operator
    Binary(BinaryExpr),
    /// Unary operator
    Unary(UnaryExpr),
    /// Implicit conversion (not rendered)
    Convert(ConvertExpr),
    /// SQL CAST
    ExplicitCast(ExplicitCastExpr),
    /// IS [NOT] NULL
    IsNull(IsNullExpr),
    /// CASE
    Case(CaseExpr),
    /// IN
    In(InExpr),
    /// LIKE
    Like(LikeExpr),
    /// EXISTS
    Exists(ExistsExpr),
    /// Function call
    SqlFunction(SqlFunctionExpr),
    /// Raw SQL
    SqlFragment(SqlFragmentExpr),
    /// Scalar subquery
    ScalarSubquery(ScalarSubqueryExpr),
}

impl SqlExpr {
    /// Column bound to a model property
    pub fn column(property: &Arc<Property>, table: &TableRef) -> ExprRef {
        Arc::new(SqlExpr::Column(ColumnExpr {
            name: property.column_name.to_string(),
            table: table.clone(),
            property: Some(Arc::clone(property)),
            sql_type: property.sql_type.clone(),
            nullability: property.nullability,
        }))
    }

    /// Column with no backing property
    pub fn column_named(
        name: impl Into<String>,
        table: &TableRef,
        sql_type: SqlType,
        nullability: Nullability,
    ) -> IrResult<ExprRef> {
        let name = name.into();
        require_non_empty(&name, "Column", "name")?;
        Ok(Arc::new(SqlExpr::Column(ColumnExpr {
            name,
            table: table.clone(),
            property: None,
            sql_type,
            nullability,
        })))
    }

    /// `expr AS alias`
    pub fn alias(alias: impl Into<String>, expr: ExprRef) -> IrResult<ExprRef> {
        let alias = alias.into();
        require_non_empty(&alias, "Alias", "alias")?;
        Ok(Self::alias_unchecked(alias, expr))
    }

    /// Aliases produced by unique-name allocation are never empty
    pub(crate) fn alias_unchecked(alias: String, expr: ExprRef) -> ExprRef {
        Arc::new(SqlExpr::Alias(AliasExpr { alias, expr }))
    }

    /// Literal with an inferred type
    pub fn literal(value: LiteralValue) -> ExprRef {
        let sql_type = match &value {
            LiteralValue::Null => SqlType::Any,
            LiteralValue::Boolean(_) => SqlType::Boolean,
            LiteralValue::Integer(i) if i32::try_from(*i).is_ok() => SqlType::int(),
            LiteralValue::Integer(_) => SqlType::bigint(),
            LiteralValue::Float(_) => SqlType::Float {
                bits: relq_core::FloatBitWidth::F64,
            },
            LiteralValue::String(_) => SqlType::varchar(),
        };
        Self::literal_typed(value, sql_type)
    }

    /// Literal with an explicit type
    pub fn literal_typed(value: LiteralValue, sql_type: SqlType) -> ExprRef {
        Arc::new(SqlExpr::Literal(LiteralExpr { value, sql_type }))
    }

    /// Integer literal shorthand
    pub fn int(value: i64) -> ExprRef {
        Self::literal(LiteralValue::Integer(value))
    }

    /// String literal shorthand
    pub fn string(value: impl Into<String>) -> ExprRef {
        Self::literal(LiteralValue::String(value.into()))
    }

    /// Command parameter
    pub fn parameter(
        name: impl Into<String>,
        sql_type: SqlType,
        nullability: Nullability,
    ) -> IrResult<ExprRef> {
        let name = name.into();
        require_non_empty(&name, "Parameter", "name")?;
        Ok(Arc::new(SqlExpr::Parameter(ParameterExpr {
            name,
            sql_type,
            nullability,
        })))
    }

    /// Binary operation; comparisons and logical operators are BOOLEAN,
    /// concatenation is VARCHAR, arithmetic takes the left operand's type.
    pub fn binary(op: BinOp, left: ExprRef, right: ExprRef) -> ExprRef {
        let sql_type = if op.is_comparison() || op.is_logical() {
            SqlType::Boolean
        } else if op == BinOp::StringConcat {
            SqlType::varchar()
        } else {
            left.resolved_type().clone()
        };
        let nullability = left.nullability().combine(right.nullability());
        Arc::new(SqlExpr::Binary(BinaryExpr {
            op,
            left,
            right,
            sql_type,
            nullability,
        }))
    }

    /// `left AND right`
    pub fn and(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinOp::And, left, right)
    }

    /// `left = right`
    pub fn equal(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinOp::Eq, left, right)
    }

    /// Unary operation
    pub fn unary(op: UnOp, operand: ExprRef) -> ExprRef {
        let sql_type = match op {
            UnOp::Not => SqlType::Boolean,
            UnOp::Minus => operand.resolved_type().clone(),
        };
        let nullability = operand.nullability();
        Arc::new(SqlExpr::Unary(UnaryExpr {
            op,
            operand,
            sql_type,
            nullability,
        }))
    }

    /// Implicit conversion
    pub fn convert(operand: ExprRef, sql_type: SqlType) -> ExprRef {
        let nullability = if sql_type == *operand.resolved_type() {
            Nullability::Nullable
        } else {
            operand.nullability()
        };
        Arc::new(SqlExpr::Convert(ConvertExpr {
            operand,
            sql_type,
            nullability,
        }))
    }

    /// Nullable widening of `operand`
    pub fn nullable(operand: ExprRef) -> ExprRef {
        let sql_type = operand.resolved_type().clone();
        Self::convert(operand, sql_type)
    }

    /// Boxing conversion of `operand`
    pub fn boxed(operand: ExprRef) -> ExprRef {
        Self::convert(operand, SqlType::Any)
    }

    /// SQL `CAST(operand AS sql_type)`
    pub fn cast(operand: ExprRef, sql_type: SqlType) -> ExprRef {
        let nullability = operand.nullability();
        Arc::new(SqlExpr::ExplicitCast(ExplicitCastExpr {
            operand,
            sql_type,
            nullability,
        }))
    }

    /// `operand IS NULL`
    pub fn is_null(operand: ExprRef) -> ExprRef {
        Arc::new(SqlExpr::IsNull(IsNullExpr {
            operand,
            negated: false,
        }))
    }

    /// `operand IS NOT NULL`
    pub fn is_not_null(operand: ExprRef) -> ExprRef {
        Arc::new(SqlExpr::IsNull(IsNullExpr {
            operand,
            negated: true,
        }))
    }

    /// CASE expression.
    ///
    /// Every test must have the operand's type (BOOLEAN for a searched CASE),
    /// every result the first result's type, and ELSE that same type.
    /// Nullability and store facets such as string length are ignored by
    /// these checks; the CASE takes the first result's type.
    pub fn case(
        operand: Option<ExprRef>,
        when_clauses: Vec<CaseWhen>,
        else_result: Option<ExprRef>,
    ) -> IrResult<ExprRef> {
        let Some(first) = when_clauses.first() else {
            return Err(IrError::CaseWithoutWhen);
        };

        let test_type = operand
            .as_ref()
            .map_or(&BOOLEAN, |operand| operand.resolved_type());
        let result_type = first.result.resolved_type().clone();

        for (index, clause) in when_clauses.iter().enumerate() {
            let found = clause.test.resolved_type();
            if !found.same_kind(test_type) {
                return Err(IrError::CaseTestTypeMismatch {
                    index,
                    expected: test_type.clone(),
                    found: found.clone(),
                });
            }
            let found = clause.result.resolved_type();
            if !found.same_kind(&result_type) {
                return Err(IrError::CaseResultTypeMismatch {
                    index,
                    expected: result_type,
                    found: found.clone(),
                });
            }
        }

        let nullability = match &else_result {
            Some(else_result) => {
                let found = else_result.resolved_type();
                if !found.same_kind(&result_type) {
                    return Err(IrError::CaseElseTypeMismatch {
                        expected: result_type,
                        found: found.clone(),
                    });
                }
                when_clauses
                    .iter()
                    .fold(else_result.nullability(), |acc, clause| {
                        acc.combine(clause.result.nullability())
                    })
            }
            // No ELSE means unmatched rows yield NULL
            None => Nullability::Nullable,
        };

        Ok(Arc::new(SqlExpr::Case(CaseExpr {
            operand,
            when_clauses,
            else_result,
            sql_type: result_type,
            nullability,
        })))
    }

    /// `operand IN (values..)`
    pub fn in_list(operand: ExprRef, values: Vec<ExprRef>) -> ExprRef {
        Arc::new(SqlExpr::In(InExpr {
            operand,
            values: InValues::List(values),
        }))
    }

    /// `operand IN (SELECT ..)`
    pub fn in_subquery(operand: ExprRef, subquery: SelectExpression) -> ExprRef {
        Arc::new(SqlExpr::In(InExpr {
            operand,
            values: InValues::Subquery(Arc::new(subquery)),
        }))
    }

    /// `match_expr LIKE pattern [ESCAPE escape]`
    pub fn like(match_expr: ExprRef, pattern: ExprRef, escape: Option<ExprRef>) -> ExprRef {
        Arc::new(SqlExpr::Like(LikeExpr {
            match_expr,
            pattern,
            escape,
        }))
    }

    /// `EXISTS (subquery)`
    pub fn exists(subquery: SelectExpression) -> ExprRef {
        Arc::new(SqlExpr::Exists(ExistsExpr {
            subquery: Arc::new(subquery),
        }))
    }

    /// Start building a function call
    pub fn function(name: impl Into<String>, sql_type: SqlType) -> SqlFunctionBuilder {
        SqlFunctionBuilder {
            name: name.into(),
            sql_type,
            nullability: Nullability::Nullable,
            instance: None,
            schema: None,
            niladic: false,
            arguments: Vec::new(),
            result_type_mapping: None,
            instance_type_mapping: None,
            argument_type_mappings: None,
        }
    }

    /// Raw SQL text of a declared type
    pub fn fragment(sql: impl Into<String>, sql_type: SqlType) -> IrResult<ExprRef> {
        let sql = sql.into();
        require_non_empty(&sql, "SqlFragment", "sql")?;
        Ok(Arc::new(SqlExpr::SqlFragment(SqlFragmentExpr { sql, sql_type })))
    }

    /// Scalar subquery typed after its single projected value
    pub fn scalar_subquery(subquery: SelectExpression) -> ExprRef {
        let sql_type = subquery
            .resolved_type()
            .cloned()
            .unwrap_or_else(|| SqlType::Unknown("subquery".to_string()));
        Arc::new(SqlExpr::ScalarSubquery(ScalarSubqueryExpr {
            subquery: Arc::new(subquery),
            sql_type,
        }))
    }

    /// Declared output type
    pub fn resolved_type(&self) -> &SqlType {
        match self {
            SqlExpr::Column(e) => &e.sql_type,
            SqlExpr::ColumnReference(e) => &e.sql_type,
            SqlExpr::Alias(e) => e.expr.resolved_type(),
            SqlExpr::Literal(e) => &e.sql_type,
            SqlExpr::Parameter(e) => &e.sql_type,
            SqlExpr::Binary(e) => &e.sql_type,
            SqlExpr::Unary(e) => &e.sql_type,
            SqlExpr::Convert(e) => &e.sql_type,
            SqlExpr::ExplicitCast(e) => &e.sql_type,
            SqlExpr::Case(e) => &e.sql_type,
            SqlExpr::SqlFunction(e) => &e.sql_type,
            SqlExpr::SqlFragment(e) => &e.sql_type,
            SqlExpr::ScalarSubquery(e) => &e.sql_type,
            SqlExpr::IsNull(_) | SqlExpr::In(_) | SqlExpr::Like(_) | SqlExpr::Exists(_) => {
                &BOOLEAN
            }
        }
    }

    /// Declared nullability
    pub fn nullability(&self) -> Nullability {
        match self {
            SqlExpr::Column(e) => e.nullability,
            SqlExpr::ColumnReference(e) => e.nullability,
            SqlExpr::Alias(e) => e.expr.nullability(),
            SqlExpr::Literal(e) => match e.value {
                LiteralValue::Null => Nullability::Nullable,
                _ => Nullability::NotNull,
            },
            SqlExpr::Parameter(e) => e.nullability,
            SqlExpr::Binary(e) => e.nullability,
            SqlExpr::Unary(e) => e.nullability,
            SqlExpr::Convert(e) => e.nullability,
            SqlExpr::ExplicitCast(e) => e.nullability,
            SqlExpr::Case(e) => e.nullability,
            SqlExpr::SqlFunction(e) => e.nullability,
            SqlExpr::SqlFragment(_) => Nullability::Unknown,
            SqlExpr::ScalarSubquery(_) => Nullability::Nullable,
            SqlExpr::In(e) => e.operand.nullability(),
            SqlExpr::Like(e) => e.match_expr.nullability().combine(e.pattern.nullability()),
            SqlExpr::IsNull(_) | SqlExpr::Exists(_) => Nullability::NotNull,
        }
    }

    /// Short variant name for diagnostics
    pub fn node_name(&self) -> &'static str {
        match self {
            SqlExpr::Column(_) => "Column",
            SqlExpr::ColumnReference(_) => "ColumnReference",
            SqlExpr::Alias(_) => "Alias",
            SqlExpr::Literal(_) => "Literal",
            SqlExpr::Parameter(_) => "Parameter",
            SqlExpr::Binary(_) => "Binary",
            SqlExpr::Unary(_) => "Unary",
            SqlExpr::Convert(_) => "Convert",
            SqlExpr::ExplicitCast(_) => "ExplicitCast",
            SqlExpr::IsNull(_) => "IsNull",
            SqlExpr::Case(_) => "Case",
            SqlExpr::In(_) => "In",
            SqlExpr::Like(_) => "Like",
            SqlExpr::Exists(_) => "Exists",
            SqlExpr::SqlFunction(_) => "SqlFunction",
            SqlExpr::SqlFragment(_) => "SqlFragment",
            SqlExpr::ScalarSubquery(_) => "ScalarSubquery",
        }
    }

    /// Column or column reference
    pub fn is_column_like(&self) -> bool {
        matches!(self, SqlExpr::Column(_) | SqlExpr::ColumnReference(_))
    }

    /// Inner expression of an alias
    pub fn alias_inner(&self) -> Option<&ExprRef> {
        match self {
            SqlExpr::Alias(a) => Some(&a.expr),
            _ => None,
        }
    }

    /// Owning table of a column or column reference
    pub fn table_ref(&self) -> Option<&TableRef> {
        match self {
            SqlExpr::Column(c) => Some(&c.table),
            SqlExpr::ColumnReference(c) => Some(&c.table),
            _ => None,
        }
    }

    /// Name the value is exposed under when projected, looking through
    /// implicit conversions
    pub fn projection_name(&self) -> Option<&str> {
        match self {
            SqlExpr::Alias(a) => Some(&a.alias),
            SqlExpr::Column(c) => Some(&c.name),
            SqlExpr::ColumnReference(c) => Some(&c.name),
            SqlExpr::Convert(c) => c.operand.projection_name(),
            _ => None,
        }
    }

    /// Property the value ultimately reads, through aliases, references and
    /// conversions
    pub fn find_property(&self) -> Option<&Arc<Property>> {
        match self {
            SqlExpr::Column(c) => c.property.as_ref(),
            SqlExpr::ColumnReference(c) => c.referenced.find_property(),
            SqlExpr::Alias(a) => a.expr.find_property(),
            SqlExpr::Convert(c) => c.operand.find_property(),
            _ => None,
        }
    }

    /// Drop one nullable-widening conversion, if present
    pub fn without_nullable_widening(this: &ExprRef) -> ExprRef {
        match this.as_ref() {
            SqlExpr::Convert(c) if c.is_nullable_widening() => Arc::clone(&c.operand),
            _ => Arc::clone(this),
        }
    }

    /// Drop every implicit conversion layer
    pub fn without_convert(this: &ExprRef) -> ExprRef {
        let mut current = this;
        while let SqlExpr::Convert(c) = current.as_ref() {
            current = &c.operand;
        }
        Arc::clone(current)
    }

    /// Re-express a projection entry of the subquery `table` as a reference
    /// against that table from the enclosing statement.
    ///
    /// Columns, column references and aliases (also under a nullable
    /// widening) can be lifted; any other shape yields `None`.
    pub fn lift_from_subquery(this: &ExprRef, table: &TableRef) -> Option<ExprRef> {
        let name = match this.as_ref() {
            SqlExpr::Column(c) => c.name.clone(),
            SqlExpr::ColumnReference(c) => c.name.clone(),
            SqlExpr::Alias(a) => a.alias.clone(),
            SqlExpr::Convert(c) if c.is_nullable_widening() => {
                return Self::lift_from_subquery(&c.operand, table).map(Self::nullable);
            }
            _ => return None,
        };
        Some(Arc::new(SqlExpr::ColumnReference(ColumnReferenceExpr {
            name,
            table: table.clone(),
            referenced: Arc::clone(this),
            sql_type: this.resolved_type().clone(),
            nullability: this.nullability(),
        })))
    }
}

#[cfg(test)]
#[path = "expr_test.rs"]
mod tests;
