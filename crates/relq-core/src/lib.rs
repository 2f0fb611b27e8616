//! relq-core - Core library for relq
//!
//! This crate provides the SQL type system, configuration parsing, the
//! entity metadata catalog and identifier newtypes shared by the relq crates.

pub mod config;
pub mod error;
pub mod identifier;
pub mod model;
pub mod types;

pub use config::CompilerConfig;
pub use error::{CoreError, CoreResult};
pub use identifier::{ColumnName, EntityName, PropertyName, TableName};
pub use model::{EntityType, ModelCatalog, Property};
pub use types::{parse_sql_type, FloatBitWidth, IntBitWidth, Nullability, SqlType};
