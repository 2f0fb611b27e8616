//! Query-source identities handed out by the compilation context.
//!
//! A query source names one logical data source of the object query (a
//! `from o in Orders` clause, a join, a group join). The IR only compares
//! them. Sources created by rewriting a group join record the source they
//! stand in for, and [`QuerySource::normalized`] walks back to it so that a
//! table bound before the rewrite still answers for the rewritten source.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Numeric identity of a query source, unique within one compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuerySourceId(u32);

impl QuerySourceId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw numeric value
    pub fn value(self) -> u32 {
        self.0
    }
}

/// How a query source came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuerySourceKind {
    /// An ordinary source clause
    Source,
    /// A group join wrapping an inner join source
    GroupJoin,
    /// A source introduced by flattening a group join
    Flattened,
}

#[derive(Debug)]
struct QuerySourceData {
    id: QuerySourceId,
    item_name: String,
    kind: QuerySourceKind,
    origin: Option<QuerySource>,
}

/// Opaque, cheaply cloneable query-source handle.
///
/// Equality and hashing use the id only.
#[derive(Clone)]
pub struct QuerySource(Arc<QuerySourceData>);

impl QuerySource {
    pub(crate) fn new(
        id: QuerySourceId,
        item_name: impl Into<String>,
        kind: QuerySourceKind,
        origin: Option<QuerySource>,
    ) -> Self {
        Self(Arc::new(QuerySourceData {
            id,
            item_name: item_name.into(),
            kind,
            origin,
        }))
    }

    /// Numeric identity
    pub fn id(&self) -> QuerySourceId {
        self.0.id
    }

    /// Range variable name (`o` in `from o in Orders`)
    pub fn item_name(&self) -> &str {
        &self.0.item_name
    }

    /// Origin kind
    pub fn kind(&self) -> QuerySourceKind {
        self.0.kind
    }

    /// The source this one was derived from, if any
    pub fn origin(&self) -> Option<&QuerySource> {
        self.0.origin.as_ref()
    }

    /// Follow the origin chain back to the source that was originally bound
    pub fn normalized(&self) -> &QuerySource {
        let mut current = self;
        while let Some(origin) = current.origin() {
            current = origin;
        }
        current
    }

    /// True if both handles normalize to the same source
    pub fn same_origin(&self, other: &QuerySource) -> bool {
        self.normalized() == other.normalized()
    }
}

impl PartialEq for QuerySource {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for QuerySource {}

impl Hash for QuerySource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuerySource(#{} {})", self.0.id.0, self.0.item_name)
    }
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.item_name)
    }
}
