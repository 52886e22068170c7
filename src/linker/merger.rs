//! Program merger - links independently constructed translation units
//!
//! Parallel construction leaves each unit with its own arenas and its own
//! temporary global scope. The merger relocates every unit into one
//! program, merges the temporary global scopes into a single survivor and
//! unifies namespace scopes that share a qualified name. This step
//! mutates shared parent/children links and symbol tables and must run
//! single-threaded, after all construction has completed.

use crate::builder::TranslationUnit;
use crate::graph::Graph;
use crate::scope::{Resolver, ScopeId, ScopeState, ScopeTree};
use crate::{Error, Result};
use std::fmt;

/// A fully-linked program: one graph, one scope tree, one global scope.
#[derive(Debug)]
pub struct Program {
    pub graph: Graph,
    pub scopes: ScopeTree,
    pub stats: MergeStats,
}

impl Program {
    /// The single surviving global scope
    pub fn global_scope(&self) -> ScopeId {
        self.scopes.global_scope()
    }

    /// A resolver over the linked scope tree
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.scopes)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MergeStats {
    pub translation_units: usize,
    pub nodes: usize,
    pub edges: usize,
    pub namespaces_unified: usize,
    pub symbols: usize,
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program Merge Stats:")?;
        writeln!(f, "  Translation Units: {}", self.translation_units)?;
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(f, "  Edges: {}", self.edges)?;
        writeln!(f, "  Namespaces Unified: {}", self.namespaces_unified)?;
        writeln!(f, "  Symbols: {}", self.symbols)
    }
}

pub struct Merger {
    units: Vec<TranslationUnit>,
}

impl Merger {
    pub fn new(units: Vec<TranslationUnit>) -> Self {
        Self { units }
    }

    /// Link all units into one program. The first unit's global scope
    /// survives; every later unit is relocated and merged into it in
    /// order, so the surviving global's AST attribution comes from the
    /// last unit (an acknowledged tie-break, not a correctness
    /// requirement).
    pub fn run(self) -> Result<Program> {
        let translation_units = self.units.len();
        let mut units = self.units.into_iter();
        let Some(first) = units.next() else {
            return Err(Error::EmptyProgram);
        };

        let mut graph = first.graph;
        let mut scopes = first.scopes;
        let mut namespaces_unified = 0;

        for unit in units {
            namespaces_unified += merge_unit(&mut graph, &mut scopes, unit);
        }

        if translation_units > 1 {
            let global = scopes.global_scope();
            debug_assert_eq!(scopes.scope(global).state(), ScopeState::Merged);
        }

        let symbols = scopes.scopes().map(|s| s.symbol_count()).sum();
        let stats = MergeStats {
            translation_units,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            namespaces_unified,
            symbols,
        };
        tracing::debug!(
            units = translation_units,
            nodes = stats.nodes,
            unified = namespaces_unified,
            "linked program"
        );

        Ok(Program { graph, scopes, stats })
    }
}

/// Relocate one unit into the program and merge its temporary global
/// scope away. Returns the number of namespace scopes unified.
fn merge_unit(graph: &mut Graph, scopes: &mut ScopeTree, unit: TranslationUnit) -> usize {
    let scope_offset = scopes.len() as u32;
    let (node_offset, _edge_offset) = graph.absorb(unit.graph, scope_offset);
    let other_global = scopes.absorb(unit.scopes, node_offset);

    scopes.merge_global_from(other_global);
    graph.rebind_scope(other_global, scopes.global_scope());

    let mut unified = 0;
    for (qualified, id) in scopes.absorbed_namespaces(scope_offset) {
        if let Some(winner) = scopes.unify_or_register_namespace(&qualified, id) {
            graph.rebind_scope(id, winner);
            unified += 1;
        }
    }
    unified
}
