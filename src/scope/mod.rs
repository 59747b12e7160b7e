//! Scope Graph - per-file name binding model
//!
//! Adapters emit capture events, the builder turns them into a scope graph
//! and the resolver binds every reference it can.

pub mod builder;
pub mod graph;
pub mod resolver;

pub use builder::{CaptureEvent, CaptureKind, ScopeGraphBuilder, Scoping};
pub use graph::{GraphStats, ScopeGraph};
pub use resolver::{resolve, Binding, NameResolver, ResolveStats, ResolvedBinding};
