//! Name Resolver - Resolves references to definitions
//!
//! Resolution algorithm:
//! 1. Find the innermost scope enclosing the reference
//! 2. Walk outward through parent scopes up to the root
//! 3. Collect same-name definitions and imports declared in each scope,
//!    dropping definitions from an incompatible namespace
//! 4. The first scope with a candidate wins (inner bindings shadow outer ones)
//! 5. Among candidates of that scope, the latest declaration at or before the
//!    reference wins; if all follow the reference, the earliest one wins;
//!    remaining ties go to capture order
//! 6. No candidate anywhere → unresolved, which is not an error

use crate::edge::EdgeKind;
use crate::node::{NodeKind, Reference};
use crate::{Error, Result};
use super::graph::ScopeGraph;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::fmt;

/// What a reference binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Def(NodeIndex),
    Import(NodeIndex),
}

impl Binding {
    pub fn node(&self) -> NodeIndex {
        match self {
            Binding::Def(idx) | Binding::Import(idx) => *idx,
        }
    }

    /// Edge recorded for this binding
    pub fn edge_kind(&self) -> EdgeKind {
        match self {
            Binding::Def(_) => EdgeKind::RefToDef,
            Binding::Import(_) => EdgeKind::RefToImport,
        }
    }
}

/// Result of resolving a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedBinding {
    pub reference: NodeIndex,
    pub binding: Binding,
}

/// Name resolver over a built scope graph.
///
/// Resolution itself is read-only; `ScopeGraph::apply_bindings` records the
/// outcome.
pub struct NameResolver<'a> {
    scope_graph: &'a ScopeGraph,
}

impl<'a> NameResolver<'a> {
    /// Create a new resolver
    pub fn new(scope_graph: &'a ScopeGraph) -> Self {
        Self { scope_graph }
    }

    /// Resolve every reference of the graph, in insertion order
    pub fn resolve_all(&self) -> Result<Vec<ResolvedBinding>> {
        let mut resolved = Vec::new();
        for reference in self.scope_graph.references() {
            if let Some(binding) = self.resolve_reference(reference)? {
                resolved.push(ResolvedBinding { reference, binding });
            }
        }
        Ok(resolved)
    }

    /// Resolve a single reference node
    pub fn resolve_reference(&self, reference: NodeIndex) -> Result<Option<Binding>> {
        let Some(NodeKind::Ref(target)) = self.scope_graph.node(reference) else {
            return Err(Error::InvariantViolation(format!(
                "node {} is not a reference",
                reference.index()
            )));
        };

        let mut current = Some(self.scope_graph.innermost_scope(&target.range));
        let mut visited = 0;

        while let Some(scope) = current {
            visited += 1;
            if visited > self.scope_graph.node_count() {
                return Err(Error::InvariantViolation(format!(
                    "scope chain of reference `{}` at {} does not reach the root",
                    target.name, target.range
                )));
            }

            let candidates = self.candidates_in(scope, target)?;
            if let Some(winner) = self.pick(&candidates, target) {
                let binding = match self.scope_graph.node(winner) {
                    Some(NodeKind::Import(_)) => Binding::Import(winner),
                    _ => Binding::Def(winner),
                };
                tracing::trace!(
                    "`{}` at {} binds to node {} in scope {}",
                    target.name,
                    target.range,
                    winner.index(),
                    scope.index()
                );
                return Ok(Some(binding));
            }

            current = self.scope_graph.checked_parent(scope)?;
        }

        tracing::trace!("`{}` at {} is unresolved", target.name, target.range);
        Ok(None)
    }

    /// Same-name, namespace-compatible bindings declared directly in `scope`
    fn candidates_in(&self, scope: NodeIndex, reference: &Reference) -> Result<Vec<NodeIndex>> {
        let mut candidates = Vec::new();
        for idx in self.scope_graph.bindings_in_scope(scope) {
            let compatible = match self.scope_graph.node(idx) {
                Some(NodeKind::Def(def)) => {
                    def.name == reference.name
                        && match (reference.symbol_id, def.symbol_id) {
                            (Some(expected), Some(actual)) => expected.same_namespace(&actual),
                            _ => true,
                        }
                }
                Some(NodeKind::Import(import)) => import.name == reference.name,
                Some(other) => {
                    return Err(Error::InvariantViolation(format!(
                        "{} node {} is declared in scope {}",
                        other.as_str(),
                        idx.index(),
                        scope.index()
                    )));
                }
                None => {
                    return Err(Error::InvariantViolation(format!(
                        "scope {} declares missing node {}",
                        scope.index(),
                        idx.index()
                    )));
                }
            };
            if compatible {
                candidates.push(idx);
            }
        }
        Ok(candidates)
    }

    /// Apply the same-scope tie-break policy
    fn pick(&self, candidates: &[NodeIndex], reference: &Reference) -> Option<NodeIndex> {
        let start_of = |idx: NodeIndex| {
            self.scope_graph
                .node(idx)
                .map(|n| n.range().start.byte)
                .unwrap_or(usize::MAX)
        };
        let ref_start = reference.range.start.byte;

        let declared_before = candidates
            .iter()
            .copied()
            .filter(|&c| start_of(c) <= ref_start)
            .max_by(|&a, &b| start_of(a).cmp(&start_of(b)).then_with(|| b.cmp(&a)));

        declared_before.or_else(|| candidates.iter().copied().min_by_key(|&c| (start_of(c), c)))
    }
}

/// Resolve every reference of `graph` and record the bindings
pub fn resolve(graph: &mut ScopeGraph) -> Result<ResolveStats> {
    let bindings = NameResolver::new(graph).resolve_all()?;
    let stats = graph.apply_bindings(&bindings);
    tracing::debug!(
        "resolved {}/{} references ({} unresolved)",
        stats.resolved(),
        stats.references,
        stats.unresolved
    );
    Ok(stats)
}

/// Outcome of resolving one graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
    pub references: usize,
    pub to_definitions: usize,
    pub to_imports: usize,
    pub unresolved: usize,
}

impl ResolveStats {
    pub fn resolved(&self) -> usize {
        self.to_definitions + self.to_imports
    }

    /// Fold another unit's outcome into this one
    pub fn merge(&mut self, other: &ResolveStats) {
        self.references += other.references;
        self.to_definitions += other.to_definitions;
        self.to_imports += other.to_imports;
        self.unresolved += other.unresolved;
    }
}

impl fmt::Display for ResolveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution Stats:")?;
        writeln!(f, "  Total References: {}", self.references)?;
        writeln!(f, "  ✅ To definitions: {}", self.to_definitions)?;
        writeln!(f, "  📦 To imports: {}", self.to_imports)?;
        writeln!(f, "  🌍 Unresolved: {}", self.unresolved)
    }
}
