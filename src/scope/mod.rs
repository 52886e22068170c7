//! Scope tree and symbol resolution
//!
//! Construction builds one scope tree per translation unit; the linker
//! merges them into a single tree rooted at one global scope.

pub mod resolver;
pub mod tree;

pub use resolver::{Resolution, Resolver};
pub use tree::{Scope, ScopeId, ScopeKind, ScopeState, ScopeTree};
