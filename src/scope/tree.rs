//! Scope tree - hierarchical name-binding structure
//!
//! The scope tree tracks:
//! - Scope hierarchy (parent/child relationships, owned as indices)
//! - Symbol tables per scope (insertion order preserved for
//!   overload/shadowing tie-breaks)
//! - Namespace registry keyed by qualified name
//! - Import relationships with push-updated imported-symbol views
//!
//! Scopes move through `Open` → `Closed` → (`Global`/unified `Namespace`
//! only) `Merged`; no scope re-opens after closing except via merge.

use crate::node::{DeclarationKind, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a scope within its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// The kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Root of a translation unit; exactly one per fully-linked program
    Global,
    /// Named structural scope, keyed by qualified name; may receive
    /// contributions from many files
    Namespace,
    /// Class/struct scope
    Record,
    /// Function/method scope
    Function,
    /// Block scope (if, try, plain braces)
    Block,
    /// Loop body scope
    Loop,
}

impl ScopeKind {
    /// Get the string representation of the scope kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Global => "global",
            ScopeKind::Namespace => "namespace",
            ScopeKind::Record => "record",
            ScopeKind::Function => "function",
            ScopeKind::Block => "block",
            ScopeKind::Loop => "loop",
        }
    }

    /// Structure-holding scopes accept structural declarations (records,
    /// namespaces, typedefs); the rest hold values only.
    pub fn is_structural(&self) -> bool {
        matches!(self, ScopeKind::Global | ScopeKind::Namespace | ScopeKind::Record)
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Receiving declarations and children
    Open,
    /// Construction has left the lexical boundary
    Closed,
    /// Absorbed into (or survived) a merge; tree shape is final, though
    /// symbol tables may still grow
    Merged,
}

/// A single scope: symbol table, structural position and import state.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    /// Simple name of a named structural scope
    pub name: Option<String>,
    /// Dot-separated path of namespace/record names from the root
    pub qualified_name: Option<String>,
    /// The AST node this scope wraps, if any
    pub node: Option<NodeId>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub(crate) state: ScopeState,
    /// Symbol name → declarations, insertion order preserved
    pub(crate) symbols: IndexMap<String, Vec<NodeId>>,
    /// Type aliases; populated on the global scope only
    pub(crate) typedefs: IndexMap<String, NodeId>,
    /// Scopes importing this namespace
    pub(crate) importers: Vec<ScopeId>,
    /// Cached view of symbols made visible here by imports, kept current
    /// by push-updates from the imported namespaces
    pub(crate) imported: IndexMap<String, Vec<NodeId>>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            kind,
            name: None,
            qualified_name: None,
            node: None,
            parent,
            children: Vec::new(),
            state: ScopeState::Open,
            symbols: IndexMap::new(),
            typedefs: IndexMap::new(),
            importers: Vec::new(),
            imported: IndexMap::new(),
        }
    }

    /// Lifecycle state of this scope
    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Declarations registered under a symbol in this scope's own table
    pub fn symbol(&self, name: &str) -> Option<&[NodeId]> {
        self.symbols.get(name).map(|v| v.as_slice())
    }

    /// Symbol names in this scope's own table, in insertion order
    pub fn symbol_names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(|s| s.as_str())
    }

    /// Number of (symbol, declaration) entries in this scope's own table
    pub fn symbol_count(&self) -> usize {
        self.symbols.values().map(|v| v.len()).sum()
    }

    /// Declarations visible here through imports
    pub fn imported_symbol(&self, name: &str) -> Option<&[NodeId]> {
        self.imported.get(name).map(|v| v.as_slice())
    }

    /// Resolve a type alias registered on this scope
    pub fn typedef(&self, alias: &str) -> Option<NodeId> {
        self.typedefs.get(alias).copied()
    }

    /// Match a symbol against this scope alone: the own table first, then
    /// the scope-qualified form for structural scopes, then the cached
    /// imported view.
    pub(crate) fn lookup_here(&self, symbol: &str) -> Option<&[NodeId]> {
        if let Some(declarations) = self.symbol(symbol) {
            return Some(declarations);
        }
        if self.kind.is_structural() {
            if let Some(qualified) = &self.qualified_name {
                if let Some(rest) = symbol.strip_prefix(qualified.as_str()) {
                    if let Some(rest) = rest.strip_prefix('.') {
                        if let Some(declarations) = self.symbol(rest) {
                            return Some(declarations);
                        }
                    }
                }
            }
        }
        self.imported_symbol(symbol)
    }
}

/// Scope tree for one translation unit, or for a whole program after
/// merging. Rooted at a single global scope.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    global: ScopeId,
    /// Namespace scopes by qualified name
    namespaces: HashMap<String, ScopeId>,
}

impl ScopeTree {
    /// Create a new tree with an open global scope at the root
    pub fn new() -> Self {
        let global = ScopeId(0);
        Self {
            scopes: vec![Scope::new(global, ScopeKind::Global, None)],
            global,
            namespaces: HashMap::new(),
        }
    }

    /// The root global scope
    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    /// Get a scope by its handle
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Number of scope slots in the tree, merged-away slots included
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Get the parent of a scope
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.index()].parent
    }

    /// Get the children of a scope
    pub fn children(&self, id: ScopeId) -> &[ScopeId] {
        &self.scopes[id.index()].children
    }

    /// Get the scope chain from a scope up to the root
    pub fn scope_chain(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Find a namespace scope by its qualified name
    pub fn namespace(&self, qualified: &str) -> Option<ScopeId> {
        self.namespaces.get(qualified).copied()
    }

    /// Iterate over live scopes (merged-away slots skipped)
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes
            .iter()
            .filter(|s| s.state != ScopeState::Merged || s.id == self.global)
    }

    /// Create a child scope, or reuse an existing namespace scope with the
    /// same qualified name: namespaces accumulate contributions from every
    /// construction site that enters them.
    pub(crate) fn new_scope(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        node: Option<NodeId>,
        name: Option<&str>,
    ) -> ScopeId {
        let qualified = if kind.is_structural() && kind != ScopeKind::Global {
            name.map(|n| match self.enclosing_qualified(parent) {
                Some(prefix) => format!("{}.{}", prefix, n),
                None => n.to_string(),
            })
        } else {
            None
        };

        if kind == ScopeKind::Namespace {
            if let Some(qualified) = &qualified {
                if let Some(existing) = self.namespaces.get(qualified).copied() {
                    self.scopes[existing.index()].state = ScopeState::Open;
                    return existing;
                }
            }
        }

        let id = ScopeId(self.scopes.len() as u32);
        let mut scope = Scope::new(id, kind, Some(parent));
        scope.name = name.map(str::to_string);
        scope.qualified_name = qualified.clone();
        scope.node = node;
        self.scopes.push(scope);
        self.scopes[parent.index()].children.push(id);

        if kind == ScopeKind::Namespace {
            if let Some(qualified) = qualified {
                self.namespaces.insert(qualified, id);
            }
        }
        id
    }

    fn enclosing_qualified(&self, from: ScopeId) -> Option<&str> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = &self.scopes[id.index()];
            if let Some(qualified) = &scope.qualified_name {
                return Some(qualified);
            }
            current = scope.parent;
        }
        None
    }

    /// Mark a scope as closed; construction has left its boundary
    pub(crate) fn close(&mut self, id: ScopeId) {
        let scope = &mut self.scopes[id.index()];
        if scope.state == ScopeState::Open {
            scope.state = ScopeState::Closed;
        }
    }

    /// Insert a declaration into a scope's symbol table.
    ///
    /// Structural declarations are rejected from value-only scopes with a
    /// logged error; the operation is then a no-op and resolution
    /// continues with a degraded table. Adding to a namespace scope
    /// push-updates the imported view of every importing scope.
    pub fn add_symbol(
        &mut self,
        scope: ScopeId,
        symbol: &str,
        declaration: NodeId,
        kind: DeclarationKind,
    ) -> bool {
        let target = &self.scopes[scope.index()];
        if kind.is_structural() && !target.kind.is_structural() {
            tracing::error!(
                "cannot add {} declaration {:?} to {} scope {}; declaration dropped",
                kind,
                symbol,
                target.kind,
                scope
            );
            return false;
        }
        self.push_symbol(scope, symbol, declaration);
        true
    }

    /// Table insertion plus importer push-update, without the kind check;
    /// merge paths use this directly because their entries were validated
    /// at original insertion.
    pub(crate) fn push_symbol(&mut self, scope: ScopeId, symbol: &str, declaration: NodeId) {
        self.scopes[scope.index()]
            .symbols
            .entry(symbol.to_string())
            .or_default()
            .push(declaration);

        if self.scopes[scope.index()].kind == ScopeKind::Namespace {
            let importers = self.scopes[scope.index()].importers.clone();
            for importer in importers {
                let view = self.scopes[importer.index()]
                    .imported
                    .entry(symbol.to_string())
                    .or_default();
                if !view.contains(&declaration) {
                    view.push(declaration);
                }
            }
        }
    }

    /// Register a type alias on the global scope
    pub fn add_typedef(&mut self, alias: &str, declaration: NodeId) {
        let global = self.global;
        self.scopes[global.index()]
            .typedefs
            .insert(alias.to_string(), declaration);
    }

    /// Record that `importer` imports the symbols of `namespace`. The
    /// importer's cached view is seeded with the namespace's current table
    /// and kept current by push-updates as the namespace grows - the
    /// import may well precede the imported symbols' existence.
    pub fn add_import(&mut self, importer: ScopeId, namespace: ScopeId) {
        if self.scopes[namespace.index()].kind != ScopeKind::Namespace {
            tracing::warn!(
                "import target {} is a {} scope, not a namespace; import ignored",
                namespace,
                self.scopes[namespace.index()].kind
            );
            return;
        }
        if !self.scopes[namespace.index()].importers.contains(&importer) {
            self.scopes[namespace.index()].importers.push(importer);
        }

        let table = self.scopes[namespace.index()].symbols.clone();
        let view = &mut self.scopes[importer.index()].imported;
        for (name, declarations) in table {
            let entry = view.entry(name).or_default();
            for declaration in declarations {
                if !entry.contains(&declaration) {
                    entry.push(declaration);
                }
            }
        }
    }

    /// Relocate another tree's scopes into this one, offsetting scope
    /// handles by the current length and node handles by `node_offset`.
    /// Returns the relocated handle of the other tree's global scope; the
    /// caller is expected to merge it away.
    pub(crate) fn absorb(&mut self, other: ScopeTree, node_offset: u32) -> ScopeId {
        let offset = self.scopes.len() as u32;
        let other_global = ScopeId(other.global.0 + offset);

        for mut scope in other.scopes {
            scope.id = ScopeId(scope.id.0 + offset);
            scope.parent = scope.parent.map(|p| ScopeId(p.0 + offset));
            for child in &mut scope.children {
                *child = ScopeId(child.0 + offset);
            }
            for importer in &mut scope.importers {
                *importer = ScopeId(importer.0 + offset);
            }
            scope.node = scope.node.map(|n| NodeId(n.0 + node_offset));
            for declarations in scope.symbols.values_mut() {
                for declaration in declarations {
                    *declaration = NodeId(declaration.0 + node_offset);
                }
            }
            for declaration in scope.typedefs.values_mut() {
                *declaration = NodeId(declaration.0 + node_offset);
            }
            for declarations in scope.imported.values_mut() {
                for declaration in declarations {
                    *declaration = NodeId(declaration.0 + node_offset);
                }
            }
            self.scopes.push(scope);
        }

        other_global
    }

    /// Merge a relocated temporary global scope into the surviving root:
    /// typedefs unioned, children reparented, symbol tables unioned with
    /// no declaration dropped, AST attribution taken from the source
    /// (last caller wins).
    pub(crate) fn merge_global_from(&mut self, source: ScopeId) {
        let survivor = self.global;
        if source == survivor {
            return;
        }

        let (typedefs, symbols, children, node) = {
            let scope = &mut self.scopes[source.index()];
            scope.state = ScopeState::Merged;
            scope.parent = None;
            (
                std::mem::take(&mut scope.typedefs),
                std::mem::take(&mut scope.symbols),
                std::mem::take(&mut scope.children),
                scope.node.take(),
            )
        };

        for &child in &children {
            self.scopes[child.index()].parent = Some(survivor);
        }

        let root = &mut self.scopes[survivor.index()];
        root.children.extend(children);
        for (alias, declaration) in typedefs {
            root.typedefs.insert(alias, declaration);
        }
        for (name, declarations) in symbols {
            root.symbols.entry(name).or_default().extend(declarations);
        }
        root.node = node;
        root.state = ScopeState::Merged;
    }

    /// Namespace scopes relocated at or after `from`, in creation order
    /// (parents precede children)
    pub(crate) fn absorbed_namespaces(&self, from: u32) -> Vec<(String, ScopeId)> {
        self.scopes[from as usize..]
            .iter()
            .filter(|s| s.kind == ScopeKind::Namespace && s.state != ScopeState::Merged)
            .filter_map(|s| s.qualified_name.clone().map(|q| (q, s.id)))
            .collect()
    }

    /// Unify a relocated namespace scope with the registered scope of the
    /// same qualified name, or register it if the name is new. On
    /// unification the duplicate's table is unioned into the survivor,
    /// children are reparented, importer lists merge, and every importer's
    /// cached view is push-updated with the unified table. Returns the
    /// surviving scope when a unification happened.
    pub(crate) fn unify_or_register_namespace(
        &mut self,
        qualified: &str,
        id: ScopeId,
    ) -> Option<ScopeId> {
        let Some(winner) = self.namespaces.get(qualified).copied() else {
            self.namespaces.insert(qualified.to_string(), id);
            return None;
        };
        if winner == id {
            return None;
        }

        if let Some(parent) = self.scopes[id.index()].parent {
            self.scopes[parent.index()].children.retain(|c| *c != id);
        }

        let (symbols, children, importers, node) = {
            let loser = &mut self.scopes[id.index()];
            loser.state = ScopeState::Merged;
            loser.parent = None;
            loser.imported.clear();
            (
                std::mem::take(&mut loser.symbols),
                std::mem::take(&mut loser.children),
                std::mem::take(&mut loser.importers),
                loser.node.take(),
            )
        };

        for &child in &children {
            self.scopes[child.index()].parent = Some(winner);
        }

        {
            let survivor = &mut self.scopes[winner.index()];
            survivor.children.extend(children);
            for importer in importers {
                if !survivor.importers.contains(&importer) {
                    survivor.importers.push(importer);
                }
            }
            if survivor.node.is_none() {
                survivor.node = node;
            }
            for (name, declarations) in symbols {
                survivor.symbols.entry(name).or_default().extend(declarations);
            }
        }

        // The unified table must be visible through every import of either
        // contribution, including imports recorded before the other side's
        // symbols existed.
        let importers = self.scopes[winner.index()].importers.clone();
        let table = self.scopes[winner.index()].symbols.clone();
        for importer in importers {
            let view = &mut self.scopes[importer.index()].imported;
            for (name, declarations) in &table {
                let entry = view.entry(name.clone()).or_default();
                for declaration in declarations {
                    if !entry.contains(declaration) {
                        entry.push(*declaration);
                    }
                }
            }
        }

        Some(winner)
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
