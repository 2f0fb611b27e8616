//! Shared test utilities for relq-ir

use crate::context::CompilationContext;
use crate::ir::select::SelectExpression;
use crate::ir::table::TableExpr;
use crate::source::QuerySource;
use relq_core::{CompilerConfig, ModelCatalog, Property};
use std::sync::Arc;

/// Two-entity model used across the test suites
pub const SHOP_MODEL: &str = r#"
entities:
  - name: Order
    table: Orders
    properties:
      - name: Id
        data_type: int
      - name: CustomerId
        data_type: nchar(5)
        nullable: true
      - name: Freight
        data_type: decimal(18, 2)
  - name: Customer
    table: Customers
    schema: sales
    properties:
      - name: Id
        data_type: nchar(5)
      - name: City
        data_type: nvarchar(15)
        nullable: true
"#;

/// Parse [`SHOP_MODEL`] with the default configuration
pub fn catalog() -> ModelCatalog {
    ModelCatalog::from_yaml_str(SHOP_MODEL, &CompilerConfig::default()).unwrap()
}

/// Fresh compilation context with the default configuration
pub fn make_ctx() -> CompilationContext {
    CompilationContext::default()
}

/// Look up `entity.property` in the catalog
pub fn prop(catalog: &ModelCatalog, entity: &str, property: &str) -> Arc<Property> {
    Arc::clone(catalog.property(entity, property).unwrap())
}

/// `FROM Orders o` for a new source named `o`
pub fn orders_select(
    ctx: &mut CompilationContext,
    catalog: &ModelCatalog,
) -> (SelectExpression, QuerySource) {
    entity_select(ctx, catalog, "Order", "o")
}

/// `FROM <entity table> <item>` for a new source named `item`
pub fn entity_select(
    ctx: &mut CompilationContext,
    catalog: &ModelCatalog,
    entity: &str,
    item: &str,
) -> (SelectExpression, QuerySource) {
    let source = ctx.new_query_source(item);
    let table = entity_table(ctx, catalog, entity, &source);
    let mut select = ctx.create_select();
    select.add_table(table);
    (select, source)
}

/// Table entry for `entity` bound to `source`
pub fn entity_table(
    ctx: &mut CompilationContext,
    catalog: &ModelCatalog,
    entity: &str,
    source: &QuerySource,
) -> TableExpr {
    let entity = catalog.entity(entity).unwrap();
    ctx.create_entity_table(entity, source).unwrap()
}
