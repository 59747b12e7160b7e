//! Language Adapter Framework
//!
//! Each language provides a Tree-sitter grammar and a `.scm` query pack
//! whose captures describe scopes, definitions, imports and references.
//! The scope graph core never sees language-specific logic.

pub mod framework;
pub mod query_adapter;

pub use framework::{AdapterRegistry, CaptureStream, LanguageAdapter, ParsedUnit, default_registry};
pub use query_adapter::QueryAdapter;
