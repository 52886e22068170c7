//! Reaching definitions - an order-sensitive analysis over the EOG
//!
//! Propagates, per symbol name, the set of value declarations currently
//! reaching each control-flow step, then materializes a whole-value DFG
//! edge from every reaching definition to every use. A value declaration
//! replaces the previous definition set for its name; branch merges union
//! through the map lattice's join. Control-flow steps tagged unreachable
//! contribute no facts.

use crate::edge::{Edge, Granularity};
use crate::fixpoint::iterate_eog;
use crate::lattice::{Lattice, MapLattice, PowersetLattice};
use crate::linker::Program;
use crate::node::{DeclarationKind, NodeId, NodeKind};
use crate::scope::Resolver;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, serde::Serialize)]
pub struct DataflowStats {
    pub definitions: usize,
    pub uses: usize,
    pub flows_added: usize,
}

impl fmt::Display for DataflowStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reaching Definitions Stats:")?;
        writeln!(f, "  Definitions: {}", self.definitions)?;
        writeln!(f, "  Uses: {}", self.uses)?;
        writeln!(f, "  Flows Added: {}", self.flows_added)
    }
}

/// Computes reaching definitions for one function body at a time and
/// records the discovered flows as DFG edges.
pub struct ReachingDefinitionsPass<'a> {
    program: &'a mut Program,
}

impl<'a> ReachingDefinitionsPass<'a> {
    pub fn new(program: &'a mut Program) -> Self {
        Self { program }
    }

    /// Run over the registered EOG starters of one function body
    pub fn run(&mut self, function: NodeId) -> DataflowStats {
        let starters = self.program.graph.eog_starters(function).to_vec();
        let lattice = MapLattice::<String, PowersetLattice<NodeId>>::new(PowersetLattice::new());

        let mut definitions: HashSet<NodeId> = HashSet::new();
        let mut uses: Vec<(NodeId, Vec<NodeId>)> = Vec::new();

        {
            let graph = &self.program.graph;
            let resolver = Resolver::new(&self.program.scopes);
            iterate_eog(
                graph,
                &starters,
                IndexMap::new(),
                &lattice,
                |graph, edge_id, state| {
                    let edge = graph.edge(edge_id);
                    let mut next = lattice.duplicate(state);
                    if edge.is_unreachable() {
                        return next;
                    }
                    let target = graph.node(edge.to);
                    match target.kind {
                        NodeKind::Declaration(DeclarationKind::Value) => {
                            definitions.insert(target.id);
                            let mut generated = IndexSet::new();
                            generated.insert(target.id);
                            next.insert(target.name.clone(), generated);
                        }
                        NodeKind::Expression => {
                            if let Some(reaching) = next.get(&target.name) {
                                let bound = target
                                    .scope
                                    .is_some_and(|s| resolver.lookup(&target.name, s).is_found());
                                if bound && !reaching.is_empty() {
                                    uses.push((target.id, reaching.iter().copied().collect()));
                                }
                            }
                        }
                        _ => {}
                    }
                    next
                },
            );
        }

        let mut flows_added = 0;
        let mut distinct_uses: HashSet<NodeId> = HashSet::new();
        for (use_node, reaching) in uses {
            distinct_uses.insert(use_node);
            for definition in reaching {
                let candidate = Edge::dfg(definition, use_node, Granularity::Full, None);
                if !self.program.graph.has_equal_edge(&candidate) {
                    self.program.graph.insert_edge(candidate);
                    flows_added += 1;
                }
            }
        }

        DataflowStats {
            definitions: definitions.len(),
            uses: distinct_uses.len(),
            flows_added,
        }
    }
}
