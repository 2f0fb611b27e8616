//! Compilation context — per-compilation allocators and configuration

use crate::error::IrResult;
use crate::ir::select::SelectExpression;
use crate::ir::table::TableExpr;
use crate::source::{QuerySource, QuerySourceId, QuerySourceKind};
use relq_core::{CompilerConfig, EntityType};
use std::collections::HashSet;

/// State shared by every statement of one compilation.
///
/// Owns the table-alias allocator and hands out query-source identities.
/// Pass it as `&mut` to the operations that may allocate; compilations never
/// share a context.
#[derive(Debug, Default)]
pub struct CompilationContext {
    config: CompilerConfig,
    /// Lowercased aliases handed out so far
    table_aliases: HashSet<String>,
    next_query_source: u32,
}

impl CompilationContext {
    /// Create a context with the given configuration
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            table_aliases: HashSet::new(),
            next_query_source: 0,
        }
    }

    /// Access the configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Allocate a table alias not yet used in this compilation.
    ///
    /// The candidate is used as-is when free; otherwise `0`, `1`, ... is
    /// appended until the result is free. Comparison ignores ASCII case. An
    /// empty candidate falls back to the subquery alias prefix.
    pub fn create_unique_table_alias(&mut self, candidate: &str) -> String {
        let base = if candidate.trim().is_empty() {
            self.config.subquery_alias_prefix.clone()
        } else {
            candidate.trim().to_string()
        };

        let mut alias = base.clone();
        let mut counter = 0usize;
        while self.table_aliases.contains(&alias.to_ascii_lowercase()) {
            alias = format!("{base}{counter}");
            counter += 1;
        }

        if alias != base {
            log::debug!("Table alias '{base}' taken, using '{alias}'");
        }
        self.table_aliases.insert(alias.to_ascii_lowercase());
        alias
    }

    /// Allocate an alias for a subquery created by push-down (`t`, `t0`, ...)
    pub fn create_subquery_alias(&mut self) -> String {
        let prefix = self.config.subquery_alias_prefix.clone();
        self.create_unique_table_alias(&prefix)
    }

    /// New ordinary query source
    pub fn new_query_source(&mut self, item_name: &str) -> QuerySource {
        self.next_source(item_name, QuerySourceKind::Source, None)
    }

    /// New group-join source standing in for `inner`
    pub fn group_join(&mut self, inner: &QuerySource, item_name: &str) -> QuerySource {
        self.next_source(item_name, QuerySourceKind::GroupJoin, Some(inner.clone()))
    }

    /// New source introduced by flattening `group_join`
    pub fn flatten(&mut self, group_join: &QuerySource, item_name: &str) -> QuerySource {
        self.next_source(
            item_name,
            QuerySourceKind::Flattened,
            Some(group_join.clone()),
        )
    }

    fn next_source(
        &mut self,
        item_name: &str,
        kind: QuerySourceKind,
        origin: Option<QuerySource>,
    ) -> QuerySource {
        let id = QuerySourceId::new(self.next_query_source);
        self.next_query_source += 1;
        QuerySource::new(id, item_name, kind, origin)
    }

    /// New statement without an alias
    pub fn create_select(&self) -> SelectExpression {
        SelectExpression::new(None, self.config.column_alias_prefix.clone())
    }

    /// New statement with a unique alias derived from `candidate`
    pub fn create_select_with_alias(&mut self, candidate: &str) -> SelectExpression {
        let alias = self.create_unique_table_alias(candidate);
        SelectExpression::new(Some(alias), self.config.column_alias_prefix.clone())
    }

    /// Table entry for a mapped entity, aliased after the source's item name.
    ///
    /// Generated item names (`<generated>_0`) and names that are not plain
    /// identifiers fall back to the subquery alias prefix.
    pub fn create_entity_table(
        &mut self,
        entity: &EntityType,
        query_source: &QuerySource,
    ) -> IrResult<TableExpr> {
        let item_name = query_source.item_name();
        let candidate = if is_plain_identifier(item_name) {
            item_name.to_string()
        } else {
            self.config.subquery_alias_prefix.clone()
        };
        let alias = self.create_unique_table_alias(&candidate);
        TableExpr::table(
            entity.table().as_str(),
            entity.schema().map(str::to_string),
            alias,
            query_source.clone(),
        )
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_table_alias_suffixes() {
        let mut ctx = CompilationContext::default();
        assert_eq!(ctx.create_unique_table_alias("t"), "t");
        assert_eq!(ctx.create_unique_table_alias("t"), "t0");
        assert_eq!(ctx.create_unique_table_alias("T"), "T1");
        assert_eq!(ctx.create_unique_table_alias("o"), "o");
        assert_eq!(ctx.create_subquery_alias(), "t2");
    }

    #[test]
    fn test_empty_candidate_uses_prefix() {
        let config = CompilerConfig::from_yaml_str("subquery_alias_prefix: sq").unwrap();
        let mut ctx = CompilationContext::new(config);
        assert_eq!(ctx.create_unique_table_alias(""), "sq");
        assert_eq!(ctx.create_unique_table_alias("  "), "sq0");
    }

    #[test]
    fn test_query_sources_are_distinct_and_normalize() {
        let mut ctx = CompilationContext::default();
        let o = ctx.new_query_source("o");
        let c = ctx.new_query_source("c");
        assert_ne!(o, c);

        let group = ctx.group_join(&c, "cs");
        let flat = ctx.flatten(&group, "c2");
        assert_ne!(flat, c);
        assert_eq!(flat.normalized(), &c);
        assert!(flat.same_origin(&group));
        assert_eq!(group.kind(), QuerySourceKind::GroupJoin);
        assert_eq!(flat.origin(), Some(&group));
    }

    #[test]
    fn test_create_select_with_alias_is_unique() {
        let mut ctx = CompilationContext::default();
        let a = ctx.create_select_with_alias("t");
        let b = ctx.create_select_with_alias("t");
        assert_eq!(a.alias(), Some("t"));
        assert_eq!(b.alias(), Some("t0"));
        assert_eq!(ctx.create_select().alias(), None);
    }
}
