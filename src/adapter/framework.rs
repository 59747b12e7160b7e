//! Core adapter framework
//!
//! Defines the traits and types that all language adapters must implement.

use crate::config::ScopegraphConfig;
use crate::namespace::NameSpaces;
use crate::range::TextRange;
use crate::scope::{resolve, CaptureEvent, ResolveStats, ScopeGraph, ScopeGraphBuilder};
use crate::{Error, Result};
use super::query_adapter::QueryAdapter;
use std::path::Path;

/// Balanced capture events for one unit, plus the range of its root scope
#[derive(Debug, Clone, Default)]
pub struct CaptureStream {
    pub root: TextRange,
    pub events: Vec<CaptureEvent>,
}

/// A source unit that has been built and resolved
#[derive(Debug)]
pub struct ParsedUnit {
    /// The file path (relative to the analysis root)
    pub path: String,
    pub language: String,
    pub graph: ScopeGraph,
    pub stats: ResolveStats,
}

/// Trait for language adapters
///
/// Each language adapter is responsible for:
/// 1. Identifying files it can parse
/// 2. Turning source text into a balanced capture stream
/// 3. Supplying the namespace table its captures are classified against
pub trait LanguageAdapter: Send + Sync {
    /// Get the language name (for display)
    fn language_name(&self) -> &str;

    /// Get file extensions this adapter handles
    fn file_extensions(&self) -> &[String];

    /// Namespace table for symbol classification
    fn namespaces(&self) -> &NameSpaces;

    /// Check if this adapter can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.file_extensions().iter().any(|e| e == ext)
        } else {
            false
        }
    }

    /// Produce the capture events of `content`
    fn capture_stream(&self, content: &str) -> Result<CaptureStream>;

    /// Build the unresolved scope graph of `content`
    fn build_graph(&self, content: &str) -> Result<ScopeGraph> {
        let stream = self.capture_stream(content)?;
        ScopeGraphBuilder::build(stream.root, stream.events, self.namespaces())
    }

    /// Build and resolve a unit
    fn analyze(&self, path: &str, content: &str) -> Result<ParsedUnit> {
        let mut graph = self.build_graph(content)?;
        let stats = resolve(&mut graph)?;
        tracing::debug!(
            "{}: {} references, {} unresolved",
            path,
            stats.references,
            stats.unresolved
        );
        Ok(ParsedUnit {
            path: path.to_string(),
            language: self.language_name().to_string(),
            graph,
            stats,
        })
    }
}

/// Registry of language adapters
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn LanguageAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter
    pub fn register(&mut self, adapter: impl LanguageAdapter + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    /// Find an adapter for a file
    pub fn find_adapter(&self, path: &Path) -> Option<&dyn LanguageAdapter> {
        self.adapters
            .iter()
            .find(|a| a.can_handle(path))
            .map(|a| a.as_ref())
    }

    /// Find an adapter by language name, ignoring case
    pub fn find_by_name(&self, name: &str) -> Option<&dyn LanguageAdapter> {
        self.adapters
            .iter()
            .find(|a| a.language_name().eq_ignore_ascii_case(name))
            .map(|a| a.as_ref())
    }

    /// Get all registered adapters
    pub fn adapters(&self) -> &[Box<dyn LanguageAdapter>] {
        &self.adapters
    }

    /// Analyze a file using the appropriate adapter
    pub fn analyze_file(&self, path: &Path, content: &str) -> Result<Option<ParsedUnit>> {
        if let Some(adapter) = self.find_adapter(path) {
            let rel_path = path.to_string_lossy();
            let unit = adapter.analyze(&rel_path, content)?;
            Ok(Some(unit))
        } else {
            Ok(None)
        }
    }

    /// Built-in adapters with the query and namespace overrides of `config` applied
    pub fn from_config(config: &ScopegraphConfig) -> Result<Self> {
        for name in config.languages.keys() {
            if !QueryAdapter::BUILTIN.contains(&name.as_str()) {
                tracing::warn!("no built-in adapter for configured language `{}`", name);
            }
        }

        let mut registry = Self::new();
        for adapter in QueryAdapter::all() {
            let mut adapter = adapter?;
            if let Some(overrides) = config.language(adapter.language_name()) {
                if let Some(query) = &overrides.query {
                    let source = std::fs::read_to_string(query).map_err(|e| {
                        Error::Adapter(format!("cannot read query {}: {}", query.display(), e))
                    })?;
                    adapter = adapter.with_query(&source)?;
                }
                if let Some(namespaces) = &overrides.namespaces {
                    adapter = adapter.with_namespaces(namespaces.clone());
                }
            }
            registry.register(adapter);
        }
        Ok(registry)
    }
}

/// Create a default registry with all built-in adapters
pub fn default_registry() -> Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();
    for adapter in QueryAdapter::all() {
        registry.register(adapter?);
    }
    Ok(registry)
}
