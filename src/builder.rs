//! Construction context for one translation unit
//!
//! Frontends drive a `GraphBuilder` instead of a runtime singleton: it
//! owns the unit's graph and scope tree and threads the current scope
//! through every node and declaration it creates. `finish()` seals the
//! unit; the linker later merges units into one program.

use crate::edge::{Edge, EdgeId, EdgeKind, Granularity};
use crate::graph::Graph;
use crate::node::{NodeId, NodeKind};
use crate::scope::{ScopeId, ScopeKind, ScopeTree};

/// One independently constructed compilation unit: its own graph arena
/// and its own scope tree rooted at a temporary global scope.
#[derive(Debug)]
pub struct TranslationUnit {
    pub graph: Graph,
    pub scopes: ScopeTree,
}

/// Builder threading scope context through graph construction.
pub struct GraphBuilder {
    graph: Graph,
    scopes: ScopeTree,
    current: ScopeId,
    language: String,
}

impl GraphBuilder {
    /// Create a builder for one translation unit in the given language
    pub fn new(language: impl Into<String>) -> Self {
        let scopes = ScopeTree::new();
        let current = scopes.global_scope();
        Self {
            graph: Graph::new(),
            scopes,
            current,
            language: language.into(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    /// The scope new nodes and declarations are currently bound to
    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    /// Create a node bound to the current scope
    pub fn node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let id = self.graph.add_node(name, self.language.clone(), kind);
        self.graph.node_mut(id).scope = Some(self.current);
        id
    }

    /// Enter a lexical boundary. Namespace scopes are reused by qualified
    /// name, so re-entering `app` from another construction site
    /// contributes to the same scope.
    pub fn enter_scope(
        &mut self,
        kind: ScopeKind,
        node: Option<NodeId>,
        name: Option<&str>,
    ) -> ScopeId {
        let id = self.scopes.new_scope(self.current, kind, node, name);
        self.current = id;
        id
    }

    /// Leave the current lexical boundary, closing its scope
    pub fn leave_scope(&mut self) {
        match self.scopes.parent(self.current) {
            Some(parent) => {
                self.scopes.close(self.current);
                self.current = parent;
            }
            None => {
                tracing::warn!("leave_scope at the global scope; ignoring");
            }
        }
    }

    /// Register a declaration under a symbol in the current scope.
    ///
    /// With `attach_to_holder` set, value-like declarations are also
    /// attached to the current scope's AST node via an ownership edge, so
    /// the declaration appears in its holder's AST children. Structural
    /// misuse (a non-declaration node, or a structural declaration in a
    /// value-only scope) is logged and ignored.
    pub fn declare(&mut self, symbol: &str, declaration: NodeId, attach_to_holder: bool) -> bool {
        let kind = match self.graph.node(declaration).kind {
            NodeKind::Declaration(kind) => kind,
            other => {
                tracing::error!(
                    "cannot declare {:?}: node {} is a {}, not a declaration",
                    symbol,
                    declaration,
                    other
                );
                return false;
            }
        };

        let added = self.scopes.add_symbol(self.current, symbol, declaration, kind);
        if added && attach_to_holder && !kind.is_structural() {
            if let Some(holder) = self.scopes.scope(self.current).node {
                if self.graph.node(declaration).ast_parent.is_none() {
                    self.graph.create_edge(holder, declaration, EdgeKind::Ast);
                }
            }
        }
        added
    }

    /// Record that the current scope imports the symbols of a namespace
    pub fn import(&mut self, namespace: ScopeId) {
        self.scopes.add_import(self.current, namespace);
    }

    /// Register a type alias on the unit's global scope
    pub fn typedef(&mut self, alias: &str, declaration: NodeId) {
        self.scopes.add_typedef(alias, declaration);
    }

    /// Attribute the unit's global scope to an AST node (typically the
    /// translation-unit node)
    pub fn attribute_global(&mut self, node: NodeId) {
        let global = self.scopes.global_scope();
        self.scopes.scope_mut(global).node = Some(node);
    }

    /// Create an AST ownership edge; sets the child's owning parent
    pub fn ast_edge(&mut self, parent: NodeId, child: NodeId) -> EdgeId {
        self.graph.create_edge(parent, child, EdgeKind::Ast)
    }

    /// Create an evaluation-order edge
    pub fn eog_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        self.graph.create_edge(from, to, EdgeKind::Eog)
    }

    /// Create an evaluation-order edge carrying a branch tag
    pub fn eog_branch_edge(&mut self, from: NodeId, to: NodeId, branch: bool) -> EdgeId {
        self.graph.insert_edge(Edge::eog_branch(from, to, branch))
    }

    /// Create a data-flow edge
    pub fn dfg_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        granularity: Granularity,
        member: Option<&str>,
    ) -> EdgeId {
        self.graph.insert_edge(Edge::dfg(from, to, granularity, member))
    }

    /// Register the entry edges of an analyzable function body
    pub fn register_eog_starters(&mut self, function: NodeId, starters: &[EdgeId]) {
        for &starter in starters {
            self.graph.register_eog_starter(function, starter);
        }
    }

    /// Seal the unit. Scopes left open are closed with a warning; the
    /// global scope is closed last.
    pub fn finish(mut self) -> TranslationUnit {
        while self.current != self.scopes.global_scope() {
            tracing::warn!(
                "scope {} left open at end of construction; closing",
                self.current
            );
            self.leave_scope();
        }
        let global = self.scopes.global_scope();
        self.scopes.close(global);
        TranslationUnit {
            graph: self.graph,
            scopes: self.scopes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::DeclarationKind;
    use crate::scope::ScopeState;

    #[test]
    fn test_nodes_bind_to_current_scope() {
        let mut builder = GraphBuilder::new("python");
        let global = builder.current_scope();
        let outer = builder.node("module", NodeKind::ScopeMarker);

        let function = builder.enter_scope(ScopeKind::Function, None, None);
        let inner = builder.node("x", NodeKind::Expression);
        builder.leave_scope();

        assert_eq!(builder.graph().node(outer).scope, Some(global));
        assert_eq!(builder.graph().node(inner).scope, Some(function));
        assert_eq!(builder.current_scope(), global);
    }

    #[test]
    fn test_declare_attaches_to_holder() {
        let mut builder = GraphBuilder::new("python");
        let holder = builder.node("f", NodeKind::Declaration(DeclarationKind::Function));
        builder.enter_scope(ScopeKind::Function, Some(holder), None);
        let param = builder.node("arg", NodeKind::Declaration(DeclarationKind::Value));

        assert!(builder.declare("arg", param, true));

        assert_eq!(builder.graph().node(param).ast_parent, Some(holder));
        assert_eq!(
            builder.scopes().scope(builder.current_scope()).symbol("arg"),
            Some(&[param][..])
        );
    }

    #[test]
    fn test_declare_without_attachment() {
        let mut builder = GraphBuilder::new("python");
        let holder = builder.node("f", NodeKind::Declaration(DeclarationKind::Function));
        builder.enter_scope(ScopeKind::Function, Some(holder), None);
        let local = builder.node("tmp", NodeKind::Declaration(DeclarationKind::Value));

        assert!(builder.declare("tmp", local, false));
        assert_eq!(builder.graph().node(local).ast_parent, None);
    }

    #[test]
    fn test_declare_rejects_non_declaration_node() {
        let mut builder = GraphBuilder::new("python");
        let expr = builder.node("x + y", NodeKind::Expression);

        assert!(!builder.declare("x", expr, false));
        let global = builder.current_scope();
        assert_eq!(builder.scopes().scope(global).symbol_count(), 0);
    }

    #[test]
    fn test_finish_closes_dangling_scopes() {
        let mut builder = GraphBuilder::new("python");
        builder.enter_scope(ScopeKind::Function, None, None);
        let block = builder.enter_scope(ScopeKind::Block, None, None);

        let unit = builder.finish();
        assert_eq!(unit.scopes.scope(block).state(), ScopeState::Closed);
        assert_eq!(
            unit.scopes.scope(unit.scopes.global_scope()).state(),
            ScopeState::Closed
        );
    }

    #[test]
    fn test_dfg_helper_records_member_flows() {
        let mut builder = GraphBuilder::new("python");
        let object = builder.node("point", NodeKind::Declaration(DeclarationKind::Value));
        let access = builder.node("point.x", NodeKind::Expression);

        let edge = builder.dfg_edge(object, access, Granularity::Partial, Some("x"));

        assert_eq!(builder.graph().edge(edge).granularity(), Granularity::Partial);
        assert_eq!(builder.graph().edge(edge).member(), Some("x"));
        assert_eq!(
            builder.graph().unwrap_edges(builder.graph().node(access).dfg_incoming(), false),
            vec![object]
        );
    }

    #[test]
    fn test_eog_helpers_stamp_properties() {
        let mut builder = GraphBuilder::new("python");
        let cond = builder.node("cond", NodeKind::Expression);
        let then = builder.node("then", NodeKind::Statement);
        let alt = builder.node("else", NodeKind::Statement);

        let t = builder.eog_branch_edge(cond, then, true);
        let f = builder.eog_branch_edge(cond, alt, false);

        assert_eq!(builder.graph().edge(t).branch(), Some(true));
        assert_eq!(builder.graph().edge(f).branch(), Some(false));
        assert_eq!(builder.graph().edge(f).index(), Some(1));
    }
}
