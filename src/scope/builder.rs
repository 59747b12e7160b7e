//! Scope Graph builder
//!
//! Consumes an ordered stream of capture events (produced by walking a parse
//! tree top-down) and builds a [`ScopeGraph`]:
//!
//! ```text
//! ScopeStart [0,50)            → push scope, nest under the innermost open scope
//!   Definition "x" [10,15)     → DefToScope to the innermost open scope
//!   ScopeStart [18,30)
//!     Reference "x" [20,24)    → stored, bound later by the resolver
//!   ScopeEnd
//! ScopeEnd
//! ```
//!
//! A scope end with nothing open, or scopes still open when the stream ends,
//! aborts the build with `MalformedScopeStream`.

use crate::namespace::{NameSpaces, SymbolId};
use crate::node::{LocalDef, LocalImport, Reference};
use crate::range::TextRange;
use crate::{Error, Result};
use super::graph::ScopeGraph;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which scope a definition is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scoping {
    /// The innermost open scope
    #[default]
    Local,
    /// The parent of the innermost open scope
    Hoisted,
    /// The root scope
    Global,
}

/// Classified capture kinds understood by the builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureKind {
    ScopeStart,
    ScopeEnd,
    Definition {
        scoping: Scoping,
        symbol: Option<String>,
    },
    Import,
    Reference {
        symbol: Option<String>,
    },
}

/// One element of the builder's input stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    pub kind: CaptureKind,
    pub range: TextRange,
    pub text: String,
}

impl CaptureEvent {
    pub fn scope_start(range: TextRange) -> Self {
        Self {
            kind: CaptureKind::ScopeStart,
            range,
            text: String::new(),
        }
    }

    pub fn scope_end(range: TextRange) -> Self {
        Self {
            kind: CaptureKind::ScopeEnd,
            range,
            text: String::new(),
        }
    }

    pub fn definition(range: TextRange, text: impl Into<String>, symbol: Option<&str>) -> Self {
        Self {
            kind: CaptureKind::Definition {
                scoping: Scoping::Local,
                symbol: symbol.map(str::to_string),
            },
            range,
            text: text.into(),
        }
    }

    pub fn import(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            kind: CaptureKind::Import,
            range,
            text: text.into(),
        }
    }

    pub fn reference(range: TextRange, text: impl Into<String>, symbol: Option<&str>) -> Self {
        Self {
            kind: CaptureKind::Reference {
                symbol: symbol.map(str::to_string),
            },
            range,
            text: text.into(),
        }
    }

    /// Change how a definition is scoped; other kinds are left untouched
    pub fn with_scoping(mut self, scoping: Scoping) -> Self {
        if let CaptureKind::Definition { scoping: s, .. } = &mut self.kind {
            *s = scoping;
        }
        self
    }
}

/// Incremental scope graph construction
pub struct ScopeGraphBuilder<'n> {
    graph: ScopeGraph,
    namespaces: &'n NameSpaces,
    /// Scopes opened by the stream and not yet closed
    stack: Vec<NodeIndex>,
    /// Ranges already bound by a definition or import
    bound: HashSet<TextRange>,
    pending_refs: Vec<Reference>,
}

impl<'n> ScopeGraphBuilder<'n> {
    /// Start a graph whose root scope spans `root_range`
    pub fn new(root_range: TextRange, namespaces: &'n NameSpaces) -> Self {
        Self {
            graph: ScopeGraph::new(root_range),
            namespaces,
            stack: Vec::new(),
            bound: HashSet::new(),
            pending_refs: Vec::new(),
        }
    }

    /// Build a graph from a complete event stream
    pub fn build(
        root_range: TextRange,
        events: impl IntoIterator<Item = CaptureEvent>,
        namespaces: &'n NameSpaces,
    ) -> Result<ScopeGraph> {
        let mut builder = Self::new(root_range, namespaces);
        for event in events {
            builder.push(event)?;
        }
        builder.finish()
    }

    /// Scope new bindings attach to
    pub fn current_scope(&self) -> NodeIndex {
        self.stack.last().copied().unwrap_or_else(|| self.graph.root())
    }

    /// Feed one event
    pub fn push(&mut self, event: CaptureEvent) -> Result<()> {
        tracing::trace!("capture {:?} at {}", event.kind, event.range);
        let CaptureEvent { kind, range, text } = event;

        match kind {
            CaptureKind::ScopeStart => {
                let parent = self.innermost_open(&range);
                let same_range = self
                    .graph
                    .node(parent)
                    .is_some_and(|n| n.range() == range);
                // One range is one scope, however often it is opened
                let scope = if same_range {
                    parent
                } else if let Some(existing) = self.graph.child_scope_with_range(parent, &range) {
                    existing
                } else {
                    self.graph.add_scope(range, parent)
                };
                self.stack.push(scope);
            }
            CaptureKind::ScopeEnd => {
                self.stack.pop().ok_or_else(|| {
                    Error::MalformedScopeStream(format!("scope end at {} with no open scope", range))
                })?;
            }
            CaptureKind::Definition { scoping, symbol } => {
                if !self.bound.insert(range) {
                    return Ok(());
                }
                let scope = self.scope_for(&range, scoping);
                let symbol_id = self.classify(symbol.as_deref(), &range);
                self.graph.add_def(
                    LocalDef {
                        range,
                        name: text,
                        symbol_id,
                    },
                    scope,
                );
            }
            CaptureKind::Import => {
                if !self.bound.insert(range) {
                    return Ok(());
                }
                let scope = self.innermost_open(&range);
                self.graph.add_import(LocalImport { range, name: text }, scope);
            }
            CaptureKind::Reference { symbol } => {
                let symbol_id = self.classify(symbol.as_deref(), &range);
                self.pending_refs.push(Reference {
                    range,
                    name: text,
                    symbol_id,
                });
            }
        }
        Ok(())
    }

    /// Close the stream and hand out the graph
    pub fn finish(mut self) -> Result<ScopeGraph> {
        if !self.stack.is_empty() {
            return Err(Error::MalformedScopeStream(format!(
                "{} scope(s) still open at end of stream",
                self.stack.len()
            )));
        }

        let mut dropped = 0;
        for reference in std::mem::take(&mut self.pending_refs) {
            // The name of a definition is not also a use of it
            if self.bound.contains(&reference.range) {
                dropped += 1;
                continue;
            }
            self.graph.add_reference(reference);
        }

        let stats = self.graph.stats();
        tracing::debug!(
            "built scope graph: {} scopes, {} defs, {} imports, {} refs ({} dropped as definitions)",
            stats.scopes,
            stats.definitions,
            stats.imports,
            stats.references,
            dropped
        );
        Ok(self.graph)
    }

    /// Innermost open scope whose range contains `range`
    fn innermost_open(&self, range: &TextRange) -> NodeIndex {
        self.stack
            .iter()
            .rev()
            .copied()
            .find(|&scope| {
                self.graph
                    .node(scope)
                    .is_some_and(|n| n.range().contains(range))
            })
            .unwrap_or_else(|| self.graph.root())
    }

    fn scope_for(&self, range: &TextRange, scoping: Scoping) -> NodeIndex {
        match scoping {
            Scoping::Local => self.innermost_open(range),
            Scoping::Hoisted => {
                let local = self.innermost_open(range);
                self.graph.parent_scope(local).unwrap_or_else(|| self.graph.root())
            }
            Scoping::Global => self.graph.root(),
        }
    }

    fn classify(&self, symbol: Option<&str>, range: &TextRange) -> Option<SymbolId> {
        let symbol = symbol?;
        let id = self.namespaces.symbol_id_of(symbol);
        if id.is_none() {
            tracing::warn!("unknown symbol classification `{}` at {}", symbol, range);
        }
        id
    }
}
