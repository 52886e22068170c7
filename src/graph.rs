//! Graph substrate - arena of nodes and typed edges
//!
//! Nodes and edges live in per-translation-unit arenas and are addressed
//! by `NodeId`/`EdgeId` handles. Inserting an edge wires it into both
//! endpoints' per-kind adjacency lists, stamps its position into the
//! `Index` property and, for AST edges, sets the child's owning-parent
//! back-reference.

use crate::edge::{Edge, EdgeId, EdgeKind, PropertyKey, PropertyValue};
use crate::node::{Node, NodeId, NodeKind};
use crate::scope::ScopeId;
use serde::Serialize;
use std::collections::HashMap;

/// In-memory code property graph for one translation unit, or for a whole
/// program after merging.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Entry edges of each analyzable function body
    eog_starters: HashMap<NodeId, Vec<EdgeId>>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node and return its handle
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        language: impl Into<String>,
        kind: NodeKind,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, name, language, kind));
        id
    }

    /// Get a node by its handle
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Get a mutable node by its handle
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Get an edge by its handle
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Get a mutable edge by its handle
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over all nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Iterate over all edges in creation order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Create and insert an edge with an empty property bag
    pub fn create_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> EdgeId {
        self.insert_edge(Edge::new(from, to, kind))
    }

    /// Insert a prepared edge into the graph.
    ///
    /// The edge is appended to the source's outgoing collection for its
    /// kind, stamping its position into the `Index` property. Inserting an
    /// AST edge also sets the child's owning-parent back-reference.
    pub fn insert_edge(&mut self, mut edge: Edge) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        let position = match edge.kind {
            EdgeKind::Ast => self.nodes[edge.from.index()].ast_children.len(),
            EdgeKind::Eog => self.nodes[edge.from.index()].eog_out.len(),
            EdgeKind::Dfg => self.nodes[edge.from.index()].dfg_out.len(),
        };
        edge.add_property(PropertyKey::Index, PropertyValue::Int(position as i64));

        match edge.kind {
            EdgeKind::Ast => {
                self.nodes[edge.from.index()].ast_children.push(id);
                self.nodes[edge.to.index()].ast_parent = Some(edge.from);
            }
            EdgeKind::Eog => {
                self.nodes[edge.from.index()].eog_out.push(id);
                self.nodes[edge.to.index()].eog_in.push(id);
            }
            EdgeKind::Dfg => {
                self.nodes[edge.from.index()].dfg_out.push(id);
                self.nodes[edge.to.index()].dfg_in.push(id);
            }
        }

        self.edges.push(edge);
        id
    }

    /// Whether the source node already carries a structurally equal edge;
    /// used for duplicate suppression when merging edge lists
    pub fn has_equal_edge(&self, candidate: &Edge) -> bool {
        let outgoing = match candidate.kind {
            EdgeKind::Ast => &self.nodes[candidate.from.index()].ast_children,
            EdgeKind::Eog => &self.nodes[candidate.from.index()].eog_out,
            EdgeKind::Dfg => &self.nodes[candidate.from.index()].dfg_out,
        };
        outgoing.iter().any(|id| &self.edges[id.index()] == candidate)
    }

    /// Expose a list of edges as the ordered list of their opposite-side
    /// nodes, for callers that do not care about edge metadata
    pub fn unwrap_edges(&self, edges: &[EdgeId], outgoing: bool) -> Vec<NodeId> {
        edges
            .iter()
            .map(|id| {
                let edge = &self.edges[id.index()];
                if outgoing { edge.to } else { edge.from }
            })
            .collect()
    }

    /// Successor control-flow steps of an edge: the outgoing EOG edges of
    /// its target node
    pub fn eog_successors(&self, edge: EdgeId) -> &[EdgeId] {
        let target = self.edges[edge.index()].to;
        &self.nodes[target.index()].eog_out
    }

    /// Register an entry edge of an analyzable function body
    pub fn register_eog_starter(&mut self, function: NodeId, edge: EdgeId) {
        self.eog_starters.entry(function).or_default().push(edge);
    }

    /// Entry edges of a function body, in registration order
    pub fn eog_starters(&self, function: NodeId) -> &[EdgeId] {
        self.eog_starters
            .get(&function)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Rebind every node referencing one scope to another; used when a
    /// temporary scope is merged away
    pub(crate) fn rebind_scope(&mut self, from: ScopeId, to: ScopeId) {
        for node in &mut self.nodes {
            if node.scope == Some(from) {
                node.scope = Some(to);
            }
        }
    }

    /// Relocate another graph's arenas into this one, offsetting every
    /// handle. Scope references shift by `scope_offset`, matching the
    /// relocation performed on the corresponding scope tree. Returns the
    /// node and edge offsets applied.
    pub(crate) fn absorb(&mut self, other: Graph, scope_offset: u32) -> (u32, u32) {
        let node_offset = self.nodes.len() as u32;
        let edge_offset = self.edges.len() as u32;

        for mut node in other.nodes {
            node.id = NodeId(node.id.0 + node_offset);
            node.ast_parent = node.ast_parent.map(|p| NodeId(p.0 + node_offset));
            node.scope = node.scope.map(|s| ScopeId(s.0 + scope_offset));
            for edge in node
                .ast_children
                .iter_mut()
                .chain(node.eog_out.iter_mut())
                .chain(node.eog_in.iter_mut())
                .chain(node.dfg_out.iter_mut())
                .chain(node.dfg_in.iter_mut())
            {
                *edge = EdgeId(edge.0 + edge_offset);
            }
            self.nodes.push(node);
        }

        for mut edge in other.edges {
            edge.from = NodeId(edge.from.0 + node_offset);
            edge.to = NodeId(edge.to.0 + node_offset);
            self.edges.push(edge);
        }

        for (function, starters) in other.eog_starters {
            let function = NodeId(function.0 + node_offset);
            let starters = starters.into_iter().map(|e| EdgeId(e.0 + edge_offset));
            self.eog_starters.entry(function).or_default().extend(starters);
        }

        (node_offset, edge_offset)
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let mut ast_edges = 0;
        let mut eog_edges = 0;
        let mut dfg_edges = 0;
        for edge in &self.edges {
            match edge.kind {
                EdgeKind::Ast => ast_edges += 1,
                EdgeKind::Eog => eog_edges += 1,
                EdgeKind::Dfg => dfg_edges += 1,
            }
        }

        GraphStats {
            nodes: self.nodes.len(),
            ast_edges,
            eog_edges,
            dfg_edges,
            functions: self.eog_starters.len(),
        }
    }
}

/// Statistics about a code property graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub ast_edges: usize,
    pub eog_edges: usize,
    pub dfg_edges: usize,
    pub functions: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph Statistics:")?;
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(
            f,
            "  Edges: {} (ast: {}, eog: {}, dfg: {})",
            self.ast_edges + self.eog_edges + self.dfg_edges,
            self.ast_edges,
            self.eog_edges,
            self.dfg_edges
        )?;
        writeln!(f, "  Analyzable functions: {}", self.functions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Granularity;

    fn sample_graph() -> Graph {
        Graph::new()
    }

    #[test]
    fn test_ast_edge_sets_parent() {
        let mut graph = sample_graph();
        let parent = graph.add_node("block", "python", NodeKind::Statement);
        let child = graph.add_node("x", "python", NodeKind::Expression);

        graph.create_edge(parent, child, EdgeKind::Ast);

        assert_eq!(graph.node(child).ast_parent, Some(parent));
        assert_eq!(graph.node(parent).ast_children().len(), 1);
    }

    #[test]
    fn test_index_stamping_is_monotonic() {
        let mut graph = sample_graph();
        let a = graph.add_node("a", "python", NodeKind::Statement);
        let b = graph.add_node("b", "python", NodeKind::Statement);
        let c = graph.add_node("c", "python", NodeKind::Statement);
        let d = graph.add_node("d", "python", NodeKind::Statement);

        let e1 = graph.create_edge(a, b, EdgeKind::Eog);
        let e2 = graph.create_edge(a, c, EdgeKind::Eog);
        let e3 = graph.create_edge(a, d, EdgeKind::Eog);

        assert_eq!(graph.edge(e1).index(), Some(0));
        assert_eq!(graph.edge(e2).index(), Some(1));
        assert_eq!(graph.edge(e3).index(), Some(2));
    }

    #[test]
    fn test_unwrap_preserves_order() {
        let mut graph = sample_graph();
        let a = graph.add_node("a", "python", NodeKind::Statement);
        let b = graph.add_node("b", "python", NodeKind::Statement);
        let c = graph.add_node("c", "python", NodeKind::Statement);

        graph.create_edge(a, b, EdgeKind::Eog);
        graph.create_edge(a, c, EdgeKind::Eog);

        let successors = graph.unwrap_edges(graph.node(a).eog_outgoing(), true);
        assert_eq!(successors, vec![b, c]);

        let predecessors = graph.unwrap_edges(graph.node(c).eog_incoming(), false);
        assert_eq!(predecessors, vec![a]);
    }

    #[test]
    fn test_duplicate_edge_detection() {
        let mut graph = sample_graph();
        let def = graph.add_node("x", "python", NodeKind::Expression);
        let usage = graph.add_node("x", "python", NodeKind::Expression);

        graph.insert_edge(Edge::dfg(def, usage, Granularity::Full, None));

        assert!(graph.has_equal_edge(&Edge::dfg(def, usage, Granularity::Full, None)));
        assert!(!graph.has_equal_edge(&Edge::dfg(def, usage, Granularity::Partial, Some("len"))));
        assert!(!graph.has_equal_edge(&Edge::dfg(usage, def, Granularity::Full, None)));
    }

    #[test]
    fn test_eog_successors_follow_target() {
        let mut graph = sample_graph();
        let a = graph.add_node("a", "python", NodeKind::Statement);
        let b = graph.add_node("b", "python", NodeKind::Statement);
        let c = graph.add_node("c", "python", NodeKind::Statement);

        let e1 = graph.create_edge(a, b, EdgeKind::Eog);
        let e2 = graph.create_edge(b, c, EdgeKind::Eog);

        assert_eq!(graph.eog_successors(e1), &[e2]);
        assert!(graph.eog_successors(e2).is_empty());
    }

    #[test]
    fn test_eog_starter_registration() {
        let mut graph = sample_graph();
        let f = graph.add_node("f", "python", NodeKind::Declaration(crate::node::DeclarationKind::Function));
        let a = graph.add_node("entry", "python", NodeKind::ScopeMarker);
        let b = graph.add_node("body", "python", NodeKind::Statement);

        let e = graph.create_edge(a, b, EdgeKind::Eog);
        graph.register_eog_starter(f, e);

        assert_eq!(graph.eog_starters(f), &[e]);
        assert!(graph.eog_starters(a).is_empty());
    }

    #[test]
    fn test_stats_count_by_kind() {
        let mut graph = sample_graph();
        let a = graph.add_node("a", "python", NodeKind::Statement);
        let b = graph.add_node("b", "python", NodeKind::Expression);

        graph.create_edge(a, b, EdgeKind::Ast);
        graph.create_edge(a, b, EdgeKind::Eog);
        graph.insert_edge(Edge::dfg(a, b, Granularity::Full, None));

        let stats = graph.stats();
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.ast_edges, 1);
        assert_eq!(stats.eog_edges, 1);
        assert_eq!(stats.dfg_edges, 1);
    }
}
