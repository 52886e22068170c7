//! # cpgraph - Code Property Graph Core
//!
//! Language-agnostic graph intermediate representation for source
//! programs, plus the machinery to analyze it.
//!
//! cpgraph provides:
//! - A typed graph substrate carrying AST, evaluation-order (EOG) and
//!   data-flow (DFG) edges with per-edge metadata
//! - A scope tree with symbol resolution, namespace merging across
//!   translation units and push-updated imports
//! - A generic complete-lattice algebra (powerset, map, tuple, triple)
//! - A worklist fixpoint engine propagating lattice state along EOG edges
//!
//! Per-language frontends implement [`frontend::Frontend`] and populate
//! one translation unit each, in parallel; the linker merges the units
//! into a single [`linker::Program`] that downstream analyses query.

pub mod analysis;
pub mod builder;
pub mod edge;
pub mod fixpoint;
pub mod frontend;
pub mod graph;
pub mod lattice;
pub mod linker;
pub mod node;
pub mod scope;

// Re-exports for convenient access
pub use builder::{GraphBuilder, TranslationUnit};
pub use edge::{Edge, EdgeId, EdgeKind, Granularity, PropertyKey, PropertyValue};
pub use fixpoint::iterate_eog;
pub use frontend::{Frontend, build_all};
pub use graph::{Graph, GraphStats};
pub use lattice::{Lattice, MapLattice, Order, PowersetLattice, TripleLattice, TupleLattice};
pub use linker::{MergeStats, Merger, Program};
pub use node::{DeclarationKind, Node, NodeId, NodeKind};
pub use scope::{Resolution, Resolver, Scope, ScopeId, ScopeKind, ScopeState, ScopeTree};

/// Result type alias for cpgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cpgraph operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Frontend error: {0}")]
    Frontend(String),

    #[error("No translation units to link")]
    EmptyProgram,

    #[error("Unknown kind: {0}")]
    UnknownKind(String),
}
