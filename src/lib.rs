//! # scopegraph - per-file scope resolution graphs
//!
//! Builds a lexical scope graph for one source unit and binds every
//! reference to the definition or import it denotes.
//!
//! scopegraph provides:
//! - A scope graph of scopes, definitions, imports and references
//! - A builder driven by an ordered stream of capture events
//! - A resolver implementing lexical lookup with shadowing and namespaces
//! - Tree-sitter query adapters that produce capture streams from source text
//! - A deterministic debug rendering of resolved graphs

pub mod range;
pub mod namespace;
pub mod node;
pub mod edge;
pub mod scope;
pub mod debug;
pub mod adapter;
pub mod config;
pub mod ignore;
pub mod ui;

// Re-exports for convenient access
pub use range::{Point, TextRange};
pub use namespace::{NameSpaces, SymbolId};
pub use node::NodeKind;
pub use edge::EdgeKind;
pub use scope::{
    resolve, CaptureEvent, CaptureKind, GraphStats, ResolveStats, ScopeGraph, ScopeGraphBuilder,
    Scoping,
};
pub use debug::ScopeDebug;

/// Result type alias for scopegraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for scopegraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed scope stream: {0}")]
    MalformedScopeStream(String),

    #[error("Unknown symbol id: {0}")]
    UnknownSymbolId(SymbolId),

    #[error("Scope graph invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Message sent from parallel analysis workers to the coordinator
#[derive(Debug)]
pub enum UnitMessage {
    Analyzed {
        relative_path: String,
        language: String,
        graph: GraphStats,
        resolution: ResolveStats,
    },
    Error(String, String),
}
