//! Node types - the vertices of the code property graph
//!
//! Every program element is represented by a single `Node` carrying a
//! capability tag:
//! - `Statement`: an executable statement
//! - `Expression`: an evaluable expression
//! - `Declaration`: a named entity introduced into a scope
//! - `ScopeMarker`: a pure lexical boundary with no runtime behavior

use crate::edge::EdgeId;
use crate::scope::ScopeId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::str::FromStr;

/// Stable identity of a node: an index into the owning graph's arena.
///
/// Handles are the basis for comparison everywhere graph traversal occurs;
/// two nodes are the same node exactly when their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The kind of entity a declaration node introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    /// Field, variable, parameter, constant
    Value,
    /// Function, method, constructor
    Function,
    /// Class, struct, trait, interface
    Record,
    /// Namespace, module, package
    Namespace,
    /// Type alias
    Typedef,
}

impl DeclarationKind {
    /// Get the string representation of the declaration kind
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Value => "value",
            DeclarationKind::Function => "function",
            DeclarationKind::Record => "record",
            DeclarationKind::Namespace => "namespace",
            DeclarationKind::Typedef => "typedef",
        }
    }

    /// Get all declaration kinds
    pub fn all() -> &'static [DeclarationKind] {
        &[
            DeclarationKind::Value,
            DeclarationKind::Function,
            DeclarationKind::Record,
            DeclarationKind::Namespace,
            DeclarationKind::Typedef,
        ]
    }

    /// Structural declarations may only live in structure-holding scopes
    /// (global, namespace, record); value-like declarations live anywhere.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Record | DeclarationKind::Namespace | DeclarationKind::Typedef
        )
    }
}

impl FromStr for DeclarationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "value" | "field" | "variable" | "var" | "const" | "let" => Ok(DeclarationKind::Value),
            "function" | "method" | "fn" | "def" => Ok(DeclarationKind::Function),
            "record" | "class" | "struct" | "trait" | "interface" => Ok(DeclarationKind::Record),
            "namespace" | "ns" | "module" | "package" => Ok(DeclarationKind::Namespace),
            "typedef" | "alias" => Ok(DeclarationKind::Typedef),
            _ => Err(Error::UnknownKind(format!("declaration kind: {}", s))),
        }
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capability tag of a node, dispatched by pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// An executable statement
    Statement,
    /// An evaluable expression
    Expression,
    /// A named entity introduced into a scope
    Declaration(DeclarationKind),
    /// A pure lexical boundary carrying no behavior of its own
    ScopeMarker,
}

impl NodeKind {
    /// Get the string representation of the node kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Statement => "statement",
            NodeKind::Expression => "expression",
            NodeKind::Declaration(kind) => kind.as_str(),
            NodeKind::ScopeMarker => "scope-marker",
        }
    }

    /// The declaration capability of this node, if it has one
    pub fn declaration(&self) -> Option<DeclarationKind> {
        match self {
            NodeKind::Declaration(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node in the code property graph.
///
/// Nodes are created by frontends during graph construction and never
/// change identity afterwards. Every non-root node has exactly one
/// AST-owning parent, set as a side effect of inserting an `Ast` edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable identity within the owning graph
    pub id: NodeId,
    /// Display name (identifier, operator, or synthetic label)
    pub name: String,
    /// Source-language tag (e.g. "python", "java")
    pub language: String,
    /// Capability tag
    pub kind: NodeKind,
    /// The single AST-owning parent, if any
    pub ast_parent: Option<NodeId>,
    /// The scope this node was declared in
    pub scope: Option<ScopeId>,
    pub(crate) ast_children: SmallVec<[EdgeId; 2]>,
    pub(crate) eog_out: SmallVec<[EdgeId; 2]>,
    pub(crate) eog_in: SmallVec<[EdgeId; 2]>,
    pub(crate) dfg_out: SmallVec<[EdgeId; 2]>,
    pub(crate) dfg_in: SmallVec<[EdgeId; 2]>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        name: impl Into<String>,
        language: impl Into<String>,
        kind: NodeKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            language: language.into(),
            kind,
            ast_parent: None,
            scope: None,
            ast_children: SmallVec::new(),
            eog_out: SmallVec::new(),
            eog_in: SmallVec::new(),
            dfg_out: SmallVec::new(),
            dfg_in: SmallVec::new(),
        }
    }

    /// AST-ownership edges to this node's children, in insertion order
    pub fn ast_children(&self) -> &[EdgeId] {
        &self.ast_children
    }

    /// Outgoing evaluation-order edges
    pub fn eog_outgoing(&self) -> &[EdgeId] {
        &self.eog_out
    }

    /// Incoming evaluation-order edges
    pub fn eog_incoming(&self) -> &[EdgeId] {
        &self.eog_in
    }

    /// Outgoing data-flow edges
    pub fn dfg_outgoing(&self) -> &[EdgeId] {
        &self.dfg_out
    }

    /// Incoming data-flow edges
    pub fn dfg_incoming(&self) -> &[EdgeId] {
        &self.dfg_in
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
