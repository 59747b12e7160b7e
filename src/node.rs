//! Node kinds - the vertices of a scope graph
//!
//! Four kinds of node exist:
//! - `Scope`: a lexical region
//! - `Def`: a name bound inside a scope
//! - `Import`: a name bound by an import, resolved outside the unit
//! - `Ref`: a use of a name
//!
//! Nodes never point at each other; every relationship is an edge.

use crate::namespace::SymbolId;
use crate::range::TextRange;
use serde::{Deserialize, Serialize};

/// A lexical scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalScope {
    pub range: TextRange,
}

/// A definition introduced in a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDef {
    pub range: TextRange,
    pub name: String,
    /// Classification, if the capture carried a known one
    pub symbol_id: Option<SymbolId>,
}

/// A binding brought in by an import statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalImport {
    pub range: TextRange,
    pub name: String,
}

/// A use of a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub range: TextRange,
    pub name: String,
    /// Namespace the reference expects to bind into, if known
    pub symbol_id: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    Scope(LocalScope),
    Def(LocalDef),
    Import(LocalImport),
    Ref(Reference),
}

impl NodeKind {
    pub fn scope(range: TextRange) -> Self {
        NodeKind::Scope(LocalScope { range })
    }

    pub fn range(&self) -> TextRange {
        match self {
            NodeKind::Scope(s) => s.range,
            NodeKind::Def(d) => d.range,
            NodeKind::Import(i) => i.range,
            NodeKind::Ref(r) => r.range,
        }
    }

    /// Name text, for every kind except scopes
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeKind::Scope(_) => None,
            NodeKind::Def(d) => Some(&d.name),
            NodeKind::Import(i) => Some(&i.name),
            NodeKind::Ref(r) => Some(&r.name),
        }
    }

    pub fn symbol_id(&self) -> Option<SymbolId> {
        match self {
            NodeKind::Def(d) => d.symbol_id,
            NodeKind::Ref(r) => r.symbol_id,
            NodeKind::Scope(_) | NodeKind::Import(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Scope(_) => "scope",
            NodeKind::Def(_) => "def",
            NodeKind::Import(_) => "import",
            NodeKind::Ref(_) => "ref",
        }
    }

    pub fn is_scope(&self) -> bool {
        matches!(self, NodeKind::Scope(_))
    }

    /// Definitions and imports are the two kinds a reference can bind to
    pub fn is_binding(&self) -> bool {
        matches!(self, NodeKind::Def(_) | NodeKind::Import(_))
    }

    pub fn as_def(&self) -> Option<&LocalDef> {
        match self {
            NodeKind::Def(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_import(&self) -> Option<&LocalImport> {
        match self {
            NodeKind::Import(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            NodeKind::Ref(r) => Some(r),
            _ => None,
        }
    }
}
