//! Edge types - relationships between scope graph nodes
//!
//! Every edge points from the contained node to the containing one:
//! - `ScopeToScope`: child scope → parent scope
//! - `DefToScope`: definition → scope declaring it
//! - `ImportToScope`: import → scope declaring it
//! - `RefToDef`: reference → definition it binds to
//! - `RefToImport`: reference → import it binds to
//!
//! The builder only produces the first three; the resolver adds the last two.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Child scope is nested directly inside the parent scope
    ScopeToScope,
    /// Definition is declared directly in the scope
    DefToScope,
    /// Import is declared directly in the scope
    ImportToScope,
    /// Reference resolved to a definition
    RefToDef,
    /// Reference resolved to an import
    RefToImport,
}

impl EdgeKind {
    /// Get the string representation of the edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::ScopeToScope => "scope_to_scope",
            EdgeKind::DefToScope => "def_to_scope",
            EdgeKind::ImportToScope => "import_to_scope",
            EdgeKind::RefToDef => "ref_to_def",
            EdgeKind::RefToImport => "ref_to_import",
        }
    }

    /// Edges added by resolution rather than construction
    pub fn is_resolution(&self) -> bool {
        matches!(self, EdgeKind::RefToDef | EdgeKind::RefToImport)
    }

    /// Edges attaching a binding to the scope that declares it
    pub fn is_declaration(&self) -> bool {
        matches!(self, EdgeKind::DefToScope | EdgeKind::ImportToScope)
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
