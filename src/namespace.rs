//! Namespaces - symbol classifications per language
//!
//! A language declares an ordered list of namespaces, each an ordered list of
//! symbol classifications. Rust, for instance, keeps types and values apart:
//!
//! ```text
//! [["const", "function", "variable", ...], ["struct", "enum", ...], ...]
//! ```
//!
//! A definition captured as `local.definition.struct` gets the `SymbolId`
//! of `struct`; a reference captured as `local.reference.struct` may only
//! bind to definitions from the same namespace.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used when a symbol id cannot be named
pub const UNCLASSIFIED: &str = "unclassified";

/// Label used for definitions captured without a classification
pub const NO_SYMBOL: &str = "none";

/// Position of a symbol classification within a language's namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId {
    pub namespace_idx: usize,
    pub symbol_idx: usize,
}

impl SymbolId {
    pub fn new(namespace_idx: usize, symbol_idx: usize) -> Self {
        Self {
            namespace_idx,
            symbol_idx,
        }
    }

    /// Two symbols are compatible when they live in the same namespace
    pub fn same_namespace(&self, other: &SymbolId) -> bool {
        self.namespace_idx == other.namespace_idx
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace_idx, self.symbol_idx)
    }
}

/// The ordered namespace table of one language.
///
/// Constructed once and shared read-only between builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameSpaces(Vec<Vec<String>>);

impl NameSpaces {
    pub fn new<N, S>(namespaces: impl IntoIterator<Item = N>) -> Self
    where
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            namespaces
                .into_iter()
                .map(|ns| ns.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    /// Build from a static table
    pub fn from_static(table: &[&[&str]]) -> Self {
        Self::new(table.iter().map(|ns| ns.iter().copied()))
    }

    /// Classify a symbol name, returning the first match in declaration order
    pub fn symbol_id_of(&self, symbol: &str) -> Option<SymbolId> {
        self.0.iter().enumerate().find_map(|(namespace_idx, ns)| {
            ns.iter()
                .position(|s| s == symbol)
                .map(|symbol_idx| SymbolId::new(namespace_idx, symbol_idx))
        })
    }

    /// Name of a classified symbol.
    ///
    /// Fails with [`Error::UnknownSymbolId`] if the id falls outside this table.
    pub fn name_of_symbol(&self, id: SymbolId) -> Result<&str> {
        self.0
            .get(id.namespace_idx)
            .and_then(|ns| ns.get(id.symbol_idx))
            .map(String::as_str)
            .ok_or(Error::UnknownSymbolId(id))
    }

    /// Human readable label for an optional symbol id, never failing
    pub fn label_of(&self, id: Option<SymbolId>) -> &str {
        match id {
            None => NO_SYMBOL,
            Some(id) => self.name_of_symbol(id).unwrap_or_else(|err| {
                tracing::warn!("{}, falling back to {}", err, UNCLASSIFIED);
                UNCLASSIFIED
            }),
        }
    }

    /// Stable position of a symbol across all namespaces, flattened
    pub fn ordinal(&self, id: SymbolId) -> Option<usize> {
        let ns = self.0.get(id.namespace_idx)?;
        if id.symbol_idx >= ns.len() {
            return None;
        }
        let before: usize = self.0[..id.namespace_idx].iter().map(Vec::len).sum();
        Some(before + id.symbol_idx)
    }

    /// Number of namespaces
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate namespaces in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.0.iter().map(Vec::as_slice)
    }
}

impl fmt::Display for NameSpaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|ns| format!("[{}]", ns.join(", "))).collect();
        write!(f, "{}", rendered.join(" "))
    }
}
