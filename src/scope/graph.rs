//! Scope Graph data structure for name binding
//!
//! The scope graph owns every node of one source unit:
//! - Scope hierarchy (child → parent `ScopeToScope` edges)
//! - Definitions and imports (`DefToScope` / `ImportToScope` edges)
//! - References, bound by the resolver (`RefToDef` / `RefToImport` edges)
//!
//! Nodes are addressed by `NodeIndex`. Nothing is ever removed, so indices
//! stay valid for the lifetime of the graph.

use crate::edge::EdgeKind;
use crate::node::{LocalDef, LocalImport, NodeKind, Reference};
use crate::range::TextRange;
use crate::scope::resolver::{Binding, ResolveStats, ResolvedBinding};
use crate::{Error, Result};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

/// Scope graph for one source unit
#[derive(Debug, Clone)]
pub struct ScopeGraph {
    graph: DiGraph<NodeKind, EdgeKind>,
    root: NodeIndex,
}

impl ScopeGraph {
    /// Create a graph holding only the root scope
    pub fn new(root_range: TextRange) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(NodeKind::scope(root_range));
        Self { graph, root }
    }

    /// The file-level scope
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&NodeKind> {
        self.graph.node_weight(idx)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &NodeKind)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// All edges as `(source, target, kind)`
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, EdgeKind)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
    }

    pub(crate) fn add_scope(&mut self, range: TextRange, parent: NodeIndex) -> NodeIndex {
        let idx = self.graph.add_node(NodeKind::scope(range));
        self.graph.add_edge(idx, parent, EdgeKind::ScopeToScope);
        idx
    }

    pub(crate) fn add_def(&mut self, def: LocalDef, scope: NodeIndex) -> NodeIndex {
        let idx = self.graph.add_node(NodeKind::Def(def));
        self.graph.add_edge(idx, scope, EdgeKind::DefToScope);
        idx
    }

    pub(crate) fn add_import(&mut self, import: LocalImport, scope: NodeIndex) -> NodeIndex {
        let idx = self.graph.add_node(NodeKind::Import(import));
        self.graph.add_edge(idx, scope, EdgeKind::ImportToScope);
        idx
    }

    pub(crate) fn add_reference(&mut self, reference: Reference) -> NodeIndex {
        self.graph.add_node(NodeKind::Ref(reference))
    }

    /// Record a resolved binding.
    ///
    /// Returns `false` if the reference is already bound, which keeps repeated
    /// resolution from duplicating edges.
    pub fn add_binding(&mut self, reference: NodeIndex, binding: Binding) -> bool {
        if self.binding_of(reference).is_some() {
            return false;
        }
        self.graph
            .add_edge(reference, binding.node(), binding.edge_kind());
        true
    }

    /// Apply a batch of bindings and report the resulting resolution state
    pub fn apply_bindings(&mut self, bindings: &[ResolvedBinding]) -> ResolveStats {
        let added = bindings
            .iter()
            .filter(|b| self.add_binding(b.reference, b.binding))
            .count();
        tracing::trace!("applied {} new bindings", added);
        self.resolve_stats()
    }

    /// Sources of incoming edges of `kind`
    fn incoming(&self, node: NodeIndex, kind: EdgeKind) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .filter(move |e| *e.weight() == kind)
            .map(|e| e.source())
    }

    /// Targets of outgoing edges of `kind`
    fn outgoing(&self, node: NodeIndex, kind: EdgeKind) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .filter(move |e| *e.weight() == kind)
            .map(|e| e.target())
    }

    /// Sort nodes by range, falling back to insertion order
    fn sorted_by_range(&self, mut nodes: Vec<NodeIndex>) -> Vec<NodeIndex> {
        nodes.sort_by_key(|&idx| (self.graph[idx].range(), idx));
        nodes
    }

    /// Definitions declared directly in `scope`, sorted by range
    pub fn definitions_in_scope(&self, scope: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_by_range(self.incoming(scope, EdgeKind::DefToScope).collect())
    }

    /// Imports declared directly in `scope`, sorted by range
    pub fn imports_in_scope(&self, scope: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_by_range(self.incoming(scope, EdgeKind::ImportToScope).collect())
    }

    /// Definitions and imports declared directly in `scope`, in insertion order
    pub(crate) fn bindings_in_scope(&self, scope: NodeIndex) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .graph
            .edges_directed(scope, Direction::Incoming)
            .filter(|e| e.weight().is_declaration())
            .map(|e| e.source())
            .collect();
        nodes.sort();
        nodes
    }

    /// Scopes nested directly in `scope`, sorted by range
    pub fn child_scopes(&self, scope: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_by_range(self.incoming(scope, EdgeKind::ScopeToScope).collect())
    }

    /// Child of `parent` spanning exactly `range`
    pub(crate) fn child_scope_with_range(&self, parent: NodeIndex, range: &TextRange) -> Option<NodeIndex> {
        self.incoming(parent, EdgeKind::ScopeToScope)
            .filter(|&child| self.graph[child].range() == *range)
            .min()
    }

    /// Immediate lexical parent of a scope
    pub fn parent_scope(&self, scope: NodeIndex) -> Option<NodeIndex> {
        self.checked_parent(scope).ok().flatten()
    }

    /// Parent lookup that reports structural damage instead of hiding it
    pub(crate) fn checked_parent(&self, scope: NodeIndex) -> Result<Option<NodeIndex>> {
        match self.graph.node_weight(scope) {
            Some(NodeKind::Scope(_)) => {}
            Some(other) => {
                return Err(Error::InvariantViolation(format!(
                    "node {} is a {}, not a scope",
                    scope.index(),
                    other.as_str()
                )));
            }
            None => {
                return Err(Error::InvariantViolation(format!(
                    "dangling scope reference to node {}",
                    scope.index()
                )));
            }
        }

        let parents: Vec<NodeIndex> = self.outgoing(scope, EdgeKind::ScopeToScope).collect();
        match parents.as_slice() {
            [] if scope == self.root => Ok(None),
            [] => Err(Error::InvariantViolation(format!(
                "scope {} is detached from the root",
                scope.index()
            ))),
            [parent] if self.graph[*parent].is_scope() => Ok(Some(*parent)),
            [parent] => Err(Error::InvariantViolation(format!(
                "scope {} nests inside non-scope node {}",
                scope.index(),
                parent.index()
            ))),
            _ => Err(Error::InvariantViolation(format!(
                "scope {} has {} parents",
                scope.index(),
                parents.len()
            ))),
        }
    }

    /// Smallest scope containing `range`, found by descending from the root
    pub fn innermost_scope(&self, range: &TextRange) -> NodeIndex {
        let mut current = self.root;
        // Each step moves strictly deeper; a tree cannot be deeper than its size
        for _ in 0..self.graph.node_count() {
            let next = self
                .incoming(current, EdgeKind::ScopeToScope)
                .filter(|&child| self.graph[child].range().contains(range))
                .min_by_key(|&child| (self.graph[child].range().size(), child));
            match next {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }

    /// Scope a node lives in.
    ///
    /// Scopes map to themselves, definitions and imports to the scope that
    /// declares them, references to their innermost enclosing scope.
    pub fn scope_of(&self, node: NodeIndex) -> Option<NodeIndex> {
        match self.graph.node_weight(node)? {
            NodeKind::Scope(_) => Some(node),
            NodeKind::Def(_) => self.outgoing(node, EdgeKind::DefToScope).next(),
            NodeKind::Import(_) => self.outgoing(node, EdgeKind::ImportToScope).next(),
            NodeKind::Ref(r) => Some(self.innermost_scope(&r.range)),
        }
    }

    /// Enclosing scope chain of a node, innermost first, ending at the root
    pub fn scope_chain(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut current = self.scope_of(node);
        while let Some(scope) = current {
            if chain.contains(&scope) {
                break;
            }
            chain.push(scope);
            current = self.parent_scope(scope);
        }
        chain
    }

    /// References bound to a definition or import, sorted by range
    pub fn references_of(&self, binding: NodeIndex) -> Vec<NodeIndex> {
        let refs = self
            .graph
            .edges_directed(binding, Direction::Incoming)
            .filter(|e| e.weight().is_resolution())
            .map(|e| e.source())
            .collect();
        self.sorted_by_range(refs)
    }

    /// Definition or import a reference is bound to
    pub fn binding_of(&self, reference: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(reference, Direction::Outgoing)
            .find(|e| e.weight().is_resolution())
            .map(|e| e.target())
    }

    /// All references in insertion order
    pub fn references(&self) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, n)| matches!(n, NodeKind::Ref(_)))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// All definitions in insertion order
    pub fn definitions(&self) -> Vec<NodeIndex> {
        self.nodes()
            .filter(|(_, n)| matches!(n, NodeKind::Def(_)))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// References without a binding
    pub fn unresolved_references(&self) -> Vec<NodeIndex> {
        self.references()
            .into_iter()
            .filter(|&r| self.binding_of(r).is_none())
            .collect()
    }

    /// Smallest definition, import or reference covering `byte`
    pub fn node_at_byte(&self, byte: usize) -> Option<NodeIndex> {
        self.nodes()
            .filter(|(_, n)| !n.is_scope() && n.range().contains_byte(byte))
            .min_by_key(|(idx, n)| (n.range().size(), *idx))
            .map(|(idx, _)| idx)
    }

    pub(crate) fn resolve_stats(&self) -> ResolveStats {
        let mut stats = ResolveStats::default();
        for reference in self.references() {
            stats.references += 1;
            match self.binding_of(reference).map(|b| &self.graph[b]) {
                Some(NodeKind::Def(_)) => stats.to_definitions += 1,
                Some(NodeKind::Import(_)) => stats.to_imports += 1,
                _ => stats.unresolved += 1,
            }
        }
        stats
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();
        for (_, node) in self.nodes() {
            match node {
                NodeKind::Scope(_) => stats.scopes += 1,
                NodeKind::Def(_) => stats.definitions += 1,
                NodeKind::Import(_) => stats.imports += 1,
                NodeKind::Ref(_) => stats.references += 1,
            }
        }
        stats.edges = self.edge_count();
        stats.resolved = self
            .graph
            .edge_references()
            .filter(|e| e.weight().is_resolution())
            .count();
        stats
    }
}

/// Statistics about a scope graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub scopes: usize,
    pub definitions: usize,
    pub imports: usize,
    pub references: usize,
    pub resolved: usize,
    pub edges: usize,
}

impl GraphStats {
    pub fn unresolved(&self) -> usize {
        self.references - self.resolved
    }

    /// Fold another unit's statistics into this one
    pub fn merge(&mut self, other: &GraphStats) {
        self.scopes += other.scopes;
        self.definitions += other.definitions;
        self.imports += other.imports;
        self.references += other.references;
        self.resolved += other.resolved;
        self.edges += other.edges;
    }
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Scope Graph Statistics:")?;
        writeln!(f, "  Scopes: {}", self.scopes)?;
        writeln!(f, "  Definitions: {}  Imports: {}", self.definitions, self.imports)?;
        writeln!(f, "  References: {} (resolved: {}, unresolved: {})",
            self.references, self.resolved, self.unresolved())?;
        writeln!(f, "  Edges: {}", self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "0123456789012345678901234567890123456789012345678901234567890123";

    fn range(start: usize, end: usize) -> TextRange {
        TextRange::from_byte_span(SRC, start, end)
    }

    fn def(name: &str, start: usize, end: usize) -> LocalDef {
        LocalDef {
            range: range(start, end),
            name: name.to_string(),
            symbol_id: None,
        }
    }

    #[test]
    fn test_scope_hierarchy() {
        let mut graph = ScopeGraph::new(range(0, 64));
        let root = graph.root();

        let class_scope = graph.add_scope(range(10, 50), root);
        let method_scope = graph.add_scope(range(20, 40), class_scope);

        assert_eq!(graph.parent_scope(method_scope), Some(class_scope));
        assert_eq!(graph.parent_scope(class_scope), Some(root));
        assert_eq!(graph.parent_scope(root), None);
        assert_eq!(graph.child_scopes(root), vec![class_scope]);
    }

    #[test]
    fn test_scope_chain() {
        let mut graph = ScopeGraph::new(range(0, 64));
        let root = graph.root();
        let s1 = graph.add_scope(range(5, 60), root);
        let s2 = graph.add_scope(range(10, 50), s1);
        let s3 = graph.add_scope(range(20, 30), s2);

        assert_eq!(graph.scope_chain(s3), vec![s3, s2, s1, root]);

        let d = graph.add_def(def("x", 22, 23), s3);
        assert_eq!(graph.scope_chain(d), vec![s3, s2, s1, root]);
    }

    #[test]
    fn test_innermost_scope_picks_smallest() {
        let mut graph = ScopeGraph::new(range(0, 64));
        let root = graph.root();
        let outer = graph.add_scope(range(0, 40), root);
        let inner = graph.add_scope(range(10, 20), outer);
        let sibling = graph.add_scope(range(25, 35), outer);

        assert_eq!(graph.innermost_scope(&range(12, 13)), inner);
        assert_eq!(graph.innermost_scope(&range(30, 31)), sibling);
        assert_eq!(graph.innermost_scope(&range(22, 23)), outer);
        assert_eq!(graph.innermost_scope(&range(50, 51)), root);
    }

    #[test]
    fn test_definitions_sorted_by_range() {
        let mut graph = ScopeGraph::new(range(0, 64));
        let root = graph.root();
        let b = graph.add_def(def("b", 30, 31), root);
        let a = graph.add_def(def("a", 10, 11), root);

        assert_eq!(graph.definitions_in_scope(root), vec![a, b]);
        assert_eq!(graph.definitions(), vec![b, a]);
    }

    #[test]
    fn test_bindings_and_usages() {
        let mut graph = ScopeGraph::new(range(0, 64));
        let root = graph.root();
        let d = graph.add_def(def("x", 0, 1), root);
        let r1 = graph.add_reference(Reference {
            range: range(20, 21),
            name: "x".to_string(),
            symbol_id: None,
        });
        let r2 = graph.add_reference(Reference {
            range: range(10, 11),
            name: "x".to_string(),
            symbol_id: None,
        });

        assert!(graph.add_binding(r1, Binding::Def(d)));
        assert!(graph.add_binding(r2, Binding::Def(d)));
        assert!(!graph.add_binding(r2, Binding::Def(d)));

        assert_eq!(graph.references_of(d), vec![r2, r1]);
        assert_eq!(graph.binding_of(r1), Some(d));
        assert!(graph.unresolved_references().is_empty());
        assert_eq!(graph.stats().resolved, 2);
    }

    #[test]
    fn test_node_at_byte() {
        let mut graph = ScopeGraph::new(range(0, 64));
        let root = graph.root();
        let d = graph.add_def(def("value", 4, 9), root);
        let r = graph.add_reference(Reference {
            range: range(20, 25),
            name: "value".to_string(),
            symbol_id: None,
        });

        assert_eq!(graph.node_at_byte(6), Some(d));
        assert_eq!(graph.node_at_byte(24), Some(r));
        assert_eq!(graph.node_at_byte(12), None);
    }

    #[test]
    fn test_checked_parent_reports_detached_scope() {
        let mut graph = ScopeGraph::new(range(0, 64));
        let stray = graph.graph.add_node(NodeKind::scope(range(5, 6)));

        let err = graph.checked_parent(stray).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));

        let d = graph.add_def(def("x", 0, 1), graph.root());
        assert!(graph.checked_parent(d).is_err());
    }

    #[test]
    fn test_stats() {
        let mut graph = ScopeGraph::new(range(0, 64));
        let root = graph.root();
        let s = graph.add_scope(range(10, 20), root);
        graph.add_def(def("x", 11, 12), s);
        graph.add_import(
            LocalImport {
                range: range(0, 2),
                name: "os".to_string(),
            },
            root,
        );
        graph.add_reference(Reference {
            range: range(15, 16),
            name: "y".to_string(),
            symbol_id: None,
        });

        let stats = graph.stats();
        assert_eq!(stats.scopes, 2);
        assert_eq!(stats.definitions, 1);
        assert_eq!(stats.imports, 1);
        assert_eq!(stats.references, 1);
        assert_eq!(stats.unresolved(), 1);
        assert_eq!(stats.edges, 3);
    }
}
