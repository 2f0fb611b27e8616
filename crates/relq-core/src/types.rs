//! SQL type system shared by the model catalog and the IR

use serde::{Deserialize, Serialize};

/// Valid bit widths for integer types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntBitWidth {
    /// 8-bit (TINYINT)
    I8,
    /// 16-bit (SMALLINT)
    I16,
    /// 32-bit (INTEGER)
    I32,
    /// 64-bit (BIGINT)
    I64,
}

/// Valid bit widths for floating-point types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FloatBitWidth {
    /// 32-bit (REAL)
    F32,
    /// 64-bit (DOUBLE)
    F64,
}

/// Declared type of a column, parameter or expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// BOOLEAN
    Boolean,
    /// TINYINT / SMALLINT / INTEGER / BIGINT
    Integer { bits: IntBitWidth },
    /// REAL / DOUBLE
    Float { bits: FloatBitWidth },
    /// Exact numeric with optional precision and scale
    Decimal {
        precision: Option<u16>,
        scale: Option<u16>,
    },
    /// Character data with optional max length
    String { max_length: Option<u32> },
    /// DATE
    Date,
    /// TIME
    Time,
    /// TIMESTAMP / DATETIME
    Timestamp,
    /// BINARY / BLOB
    Binary,
    /// UUID / UNIQUEIDENTIFIER
    Uuid,
    /// Array of an element type (`INTEGER[]`)
    Array(Box<SqlType>),
    /// Untyped value slot. A conversion to `Any` is a boxing conversion and
    /// carries no information for result shaping.
    Any,
    /// Type could not be determined; carries the original spelling
    Unknown(String),
}

impl SqlType {
    /// Shorthand for a 32-bit integer
    pub fn int() -> Self {
        SqlType::Integer {
            bits: IntBitWidth::I32,
        }
    }

    /// Shorthand for a 64-bit integer
    pub fn bigint() -> Self {
        SqlType::Integer {
            bits: IntBitWidth::I64,
        }
    }

    /// Shorthand for an unbounded string
    pub fn varchar() -> Self {
        SqlType::String { max_length: None }
    }

    /// Returns true for BOOLEAN
    pub fn is_boolean(&self) -> bool {
        matches!(self, SqlType::Boolean)
    }

    /// Returns true for the boxed `Any` slot
    pub fn is_any(&self) -> bool {
        matches!(self, SqlType::Any)
    }

    /// Returns true if this type is unknown
    pub fn is_unknown(&self) -> bool {
        matches!(self, SqlType::Unknown(_))
    }

    /// True if both types hold the same kind of value. Store facets
    /// (string length, decimal precision and scale) are ignored.
    pub fn same_kind(&self, other: &SqlType) -> bool {
        match (self, other) {
            (SqlType::String { .. }, SqlType::String { .. }) => true,
            (SqlType::Decimal { .. }, SqlType::Decimal { .. }) => true,
            (SqlType::Array(a), SqlType::Array(b)) => a.same_kind(b),
            _ => self == other,
        }
    }

    /// Human-readable display name
    pub fn display_name(&self) -> String {
        match self {
            SqlType::Boolean => "BOOLEAN".into(),
            SqlType::Integer { bits } => match bits {
                IntBitWidth::I8 => "TINYINT".into(),
                IntBitWidth::I16 => "SMALLINT".into(),
                IntBitWidth::I32 => "INTEGER".into(),
                IntBitWidth::I64 => "BIGINT".into(),
            },
            SqlType::Float {
                bits: FloatBitWidth::F32,
            } => "REAL".into(),
            SqlType::Float {
                bits: FloatBitWidth::F64,
            } => "DOUBLE".into(),
            SqlType::Decimal {
                precision: Some(p),
                scale: Some(s),
            } => format!("DECIMAL({p},{s})"),
            SqlType::Decimal {
                precision: Some(p),
                ..
            } => format!("DECIMAL({p})"),
            SqlType::Decimal { .. } => "DECIMAL".into(),
            SqlType::String {
                max_length: Some(n),
            } => format!("VARCHAR({n})"),
            SqlType::String { .. } => "VARCHAR".into(),
            SqlType::Date => "DATE".into(),
            SqlType::Time => "TIME".into(),
            SqlType::Timestamp => "TIMESTAMP".into(),
            SqlType::Binary => "BINARY".into(),
            SqlType::Uuid => "UUID".into(),
            SqlType::Array(inner) => format!("{}[]", inner.display_name()),
            SqlType::Any => "ANY".into(),
            SqlType::Unknown(spelling) => format!("UNKNOWN({spelling})"),
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Nullability state of a column or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nullability {
    /// Guaranteed not null
    NotNull,
    /// May contain nulls
    Nullable,
    /// Nullability could not be determined
    #[default]
    Unknown,
}

impl Nullability {
    /// Map a declared `nullable` flag
    pub fn from_nullable(nullable: bool) -> Self {
        if nullable {
            Nullability::Nullable
        } else {
            Nullability::NotNull
        }
    }

    /// Combine two nullability states: if either is nullable, result is nullable
    pub fn combine(self, other: Nullability) -> Nullability {
        match (self, other) {
            (Nullability::Nullable, _) | (_, Nullability::Nullable) => Nullability::Nullable,
            (Nullability::Unknown, _) | (_, Nullability::Unknown) => Nullability::Unknown,
            _ => Nullability::NotNull,
        }
    }

    /// True unless the value is known to be non-null
    pub fn may_be_null(self) -> bool {
        !matches!(self, Nullability::NotNull)
    }
}

impl std::fmt::Display for Nullability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nullability::NotNull => write!(f, "NOT NULL"),
            Nullability::Nullable => write!(f, "NULL"),
            Nullability::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Parse a declared type name (as written in model YAML) into a [`SqlType`].
///
/// Unrecognized spellings become [`SqlType::Unknown`] rather than an error so a
/// catalog can describe vendor types the IR never needs to reason about.
pub fn parse_sql_type(s: &str) -> SqlType {
    let trimmed = s.trim();
    if let Some(element) = trimmed.strip_suffix("[]") {
        return SqlType::Array(Box::new(parse_sql_type(element)));
    }

    let upper = trimmed.to_uppercase();
    let (base, params) = match (upper.find('('), upper.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            (upper[..open].trim(), Some(&upper[open + 1..close]))
        }
        _ => (upper.as_str(), None),
    };

    let parsed = match (base, params) {
        ("BOOL" | "BOOLEAN" | "BIT", None) => Some(SqlType::Boolean),
        ("TINYINT" | "INT1", None) => Some(SqlType::Integer {
            bits: IntBitWidth::I8,
        }),
        ("SMALLINT" | "INT2", None) => Some(SqlType::Integer {
            bits: IntBitWidth::I16,
        }),
        ("INT" | "INTEGER" | "INT4", None) => Some(SqlType::int()),
        ("BIGINT" | "INT8" | "LONG", None) => Some(SqlType::bigint()),
        ("REAL" | "FLOAT4", None) => Some(SqlType::Float {
            bits: FloatBitWidth::F32,
        }),
        ("FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8", None) => Some(SqlType::Float {
            bits: FloatBitWidth::F64,
        }),
        ("DECIMAL" | "NUMERIC" | "MONEY", params) => parse_decimal(params),
        ("VARCHAR" | "NVARCHAR" | "CHAR" | "NCHAR" | "TEXT" | "STRING", params) => {
            parse_length(params).map(|max_length| SqlType::String { max_length })
        }
        ("DATE", None) => Some(SqlType::Date),
        ("TIME", None) => Some(SqlType::Time),
        ("TIMESTAMP" | "DATETIME" | "DATETIME2" | "TIMESTAMPTZ", _) => Some(SqlType::Timestamp),
        ("BINARY" | "VARBINARY" | "BLOB" | "BYTEA", _) => Some(SqlType::Binary),
        ("UUID" | "UNIQUEIDENTIFIER", None) => Some(SqlType::Uuid),
        _ => None,
    };

    parsed.unwrap_or_else(|| SqlType::Unknown(trimmed.to_string()))
}

/// `VARCHAR(n)` / `VARCHAR(MAX)` / `VARCHAR`
fn parse_length(params: Option<&str>) -> Option<Option<u32>> {
    match params.map(str::trim) {
        None | Some("MAX") => Some(None),
        Some(p) => p.parse().ok().map(Some),
    }
}

/// `DECIMAL`, `DECIMAL(p)` or `DECIMAL(p,s)`
fn parse_decimal(params: Option<&str>) -> Option<SqlType> {
    let Some(params) = params else {
        return Some(SqlType::Decimal {
            precision: None,
            scale: None,
        });
    };
    let mut parts = params.split(',').map(str::trim);
    let precision = parts.next()?.parse().ok()?;
    let scale = match parts.next() {
        Some(s) => Some(s.parse().ok()?),
        None => None,
    };
    Some(SqlType::Decimal {
        precision: Some(precision),
        scale,
    })
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
