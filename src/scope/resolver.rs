//! Symbol resolution - turns names into declarations
//!
//! Resolution algorithm:
//! 1. Match against the starting scope (own table, scope-qualified form,
//!    imported view)
//! 2. On miss, walk `parent` until the global scope
//! 3. Fall back to the namespace registry for fully-qualified names
//! 4. Nearest enclosing match wins; shadowing is decided by scope
//!    proximity, never by declaration order

use super::tree::{ScopeId, ScopeTree};
use crate::node::NodeId;

/// Outcome of a lookup. Unresolved symbols are an explicit value, never an
/// error - later inference may synthesize a placeholder declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The nearest enclosing match: the scope it was found in and the
    /// ordered candidate declarations registered under the symbol
    Found {
        scope: ScopeId,
        declarations: Vec<NodeId>,
    },
    /// No declaration visible from the starting scope
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }

    /// The candidate declarations, empty when unresolved
    pub fn declarations(&self) -> &[NodeId] {
        match self {
            Resolution::Found { declarations, .. } => declarations,
            Resolution::NotFound => &[],
        }
    }

    /// The first candidate, if any
    pub fn first(&self) -> Option<NodeId> {
        self.declarations().first().copied()
    }
}

/// Name resolver over a scope tree
pub struct Resolver<'a> {
    tree: &'a ScopeTree,
}

impl<'a> Resolver<'a> {
    /// Create a new resolver
    pub fn new(tree: &'a ScopeTree) -> Self {
        Self { tree }
    }

    /// Resolve a symbol starting from a scope
    pub fn lookup(&self, symbol: &str, from: ScopeId) -> Resolution {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.tree.scope(id);
            if let Some(declarations) = scope.lookup_here(symbol) {
                return Resolution::Found {
                    scope: id,
                    declarations: declarations.to_vec(),
                };
            }
            current = scope.parent;
        }

        // Fully-qualified fallback through the namespace registry
        if let Some((prefix, member)) = symbol.rsplit_once('.') {
            if let Some(ns) = self.tree.namespace(prefix) {
                if let Some(declarations) = self.tree.scope(ns).symbol(member) {
                    return Resolution::Found {
                        scope: ns,
                        declarations: declarations.to_vec(),
                    };
                }
            }
        }

        Resolution::NotFound
    }
}
