//! Entity metadata catalog.
//!
//! The catalog answers the one question the IR asks about the object model:
//! for a property of an entity, which store column backs it, with which type
//! and nullability. It is loaded from YAML:
//!
//! ```yaml
//! entities:
//!   - name: Order
//!     table: Orders
//!     schema: sales
//!     properties:
//!       - name: Id
//!         column: OrderID
//!         data_type: int
//!       - name: ShipRegion
//!         data_type: nvarchar(15)
//!         nullable: true
//! ```

use crate::config::CompilerConfig;
use crate::error::{CoreError, CoreResult};
use crate::identifier::{ColumnName, EntityName, PropertyName, TableName};
use crate::types::{parse_sql_type, Nullability, SqlType};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// A mapped property: the metadata a bound column carries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    /// Owning entity
    pub entity: EntityName,
    /// Property name in the object model
    pub name: PropertyName,
    /// Backing store column
    pub column_name: ColumnName,
    /// Declared store type as written in the catalog
    pub store_type: String,
    /// Parsed store type
    pub sql_type: SqlType,
    /// Declared nullability
    pub nullability: Nullability,
}

/// A mapped entity and the table backing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: EntityName,
    table: TableName,
    schema: Option<String>,
    properties: Vec<Arc<Property>>,
}

impl EntityType {
    /// Entity name
    pub fn name(&self) -> &EntityName {
        &self.name
    }

    /// Backing table name
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Backing table schema, if any
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Properties in declaration order
    pub fn properties(&self) -> &[Arc<Property>] {
        &self.properties
    }

    /// Look up a property by name (case-sensitive)
    pub fn property(&self, name: &str) -> Option<&Arc<Property>> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// All mapped entities of one model
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    entities: BTreeMap<EntityName, Arc<EntityType>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    entities: Vec<EntityDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityDef {
    name: EntityName,
    table: TableName,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    properties: Vec<PropertyDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PropertyDef {
    name: PropertyName,
    /// Defaults to the property name
    #[serde(default)]
    column: Option<ColumnName>,
    data_type: String,
    #[serde(default)]
    nullable: bool,
}

impl ModelCatalog {
    /// Load a catalog from a YAML file
    pub fn load(path: &Path, config: &CompilerConfig) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content, config)
    }

    /// Parse a catalog from YAML text.
    ///
    /// Tables without an explicit schema pick up `config.default_schema`.
    pub fn from_yaml_str(content: &str, config: &CompilerConfig) -> CoreResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        let mut entities = BTreeMap::new();

        for def in file.entities {
            let entity = build_entity(def, config)?;
            if entities.contains_key(&entity.name) {
                return Err(CoreError::DuplicateEntity {
                    name: entity.name.to_string(),
                });
            }
            entities.insert(entity.name.clone(), Arc::new(entity));
        }

        log::debug!("Loaded model catalog with {} entities", entities.len());
        Ok(Self { entities })
    }

    /// Look up an entity by name
    pub fn entity(&self, name: &str) -> Option<&Arc<EntityType>> {
        self.entities.get(name)
    }

    /// Shorthand for `entity(entity)?.property(property)`
    pub fn property(&self, entity: &str, property: &str) -> Option<&Arc<Property>> {
        self.entity(entity)?.property(property)
    }

    /// Iterate entities in name order
    pub fn entities(&self) -> impl Iterator<Item = &Arc<EntityType>> {
        self.entities.values()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if the catalog has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn build_entity(def: EntityDef, config: &CompilerConfig) -> CoreResult<EntityType> {
    let mut properties: Vec<Arc<Property>> = Vec::with_capacity(def.properties.len());
    let mut columns: HashMap<String, PropertyName> = HashMap::new();

    for prop in def.properties {
        if properties.iter().any(|p| p.name == prop.name) {
            return Err(CoreError::DuplicateProperty {
                entity: def.name.to_string(),
                property: prop.name.to_string(),
            });
        }

        let column_name = match prop.column {
            Some(column) => column,
            None => ColumnName::new(prop.name.as_str())?,
        };

        // Store columns fold case, so `Id` and `ID` collide
        let key = column_name.to_ascii_lowercase();
        if let Some(first) = columns.get(&key) {
            return Err(CoreError::DuplicateColumn {
                entity: def.name.to_string(),
                first: first.to_string(),
                second: prop.name.to_string(),
                column: column_name.to_string(),
            });
        }
        columns.insert(key, prop.name.clone());

        let sql_type = parse_sql_type(&prop.data_type);
        if sql_type.is_unknown() {
            log::warn!(
                "Property '{}.{}' has unrecognized type '{}'",
                def.name,
                prop.name,
                prop.data_type
            );
        }

        properties.push(Arc::new(Property {
            entity: def.name.clone(),
            name: prop.name,
            column_name,
            store_type: prop.data_type,
            sql_type,
            nullability: Nullability::from_nullable(prop.nullable),
        }));
    }

    let schema = def.schema.or_else(|| config.default_schema.clone());

    Ok(EntityType {
        name: def.name,
        table: def.table,
        schema,
        properties,
    })
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
