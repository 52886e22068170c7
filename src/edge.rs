//! Edge types - typed relationships with per-edge metadata
//!
//! All graph relations reduce to three edge kinds:
//! - `Ast`: ownership, parent → child
//! - `Eog`: evaluation order, one edge per possible control-flow step
//! - `Dfg`: data flow, definition → use
//!
//! Every edge carries an ordered property bag. Appending an edge to a
//! node's outgoing collection stamps a monotonically increasing `Index`
//! property; the remaining properties are semantic (branch tags,
//! reachability, data-flow granularity).

use crate::node::NodeId;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Stable identity of an edge: an index into the owning graph's arena.
///
/// Traversal algorithms key their state maps by `EdgeId`, never by edge
/// value - edges are mutable during construction and only their handles
/// are safely comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// The three relation kinds of the code property graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// AST ownership (parent owns child)
    Ast,
    /// Evaluation order (control-flow step)
    Eog,
    /// Data flow (value reaches use)
    Dfg,
}

impl EdgeKind {
    /// Get the string representation of the edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Ast => "ast",
            EdgeKind::Eog => "eog",
            EdgeKind::Dfg => "dfg",
        }
    }

    /// Get all edge kinds
    pub fn all() -> &'static [EdgeKind] {
        &[EdgeKind::Ast, EdgeKind::Eog, EdgeKind::Dfg]
    }
}

impl FromStr for EdgeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ast" => Ok(EdgeKind::Ast),
            "eog" | "cfg" | "control" => Ok(EdgeKind::Eog),
            "dfg" | "dataflow" => Ok(EdgeKind::Dfg),
            _ => Err(Error::UnknownKind(format!("edge kind: {}", s))),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keys of the per-edge property bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKey {
    /// Position within the source node's outgoing edge collection,
    /// stamped on insertion
    Index,
    /// Branch tag of a conditional control-flow step
    Branch,
    /// Marks a control-flow step proven never taken
    Unreachable,
    /// Whole-value vs. partial data flow
    Granularity,
    /// Referenced member of a partial data flow
    Member,
}

/// Values of the per-edge property bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Granularity(Granularity),
}

/// Granularity of a data-flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// The whole value flows
    Full,
    /// Only a member of the value flows; the `Member` property names it
    Partial,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Full => write!(f, "full"),
            Granularity::Partial => write!(f, "partial"),
        }
    }
}

/// A directed, typed edge between two nodes.
///
/// Edges compare by (endpoints, kind, property bag) structural equality,
/// the predicate used for edge-list deduplication. The `Index` property is
/// positional bookkeeping reapplied on every insertion and is excluded
/// from the comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Source node
    pub from: NodeId,
    /// Target node
    pub to: NodeId,
    /// Relation kind
    pub kind: EdgeKind,
    /// Ordered property bag
    pub properties: IndexMap<PropertyKey, PropertyValue>,
}

impl Edge {
    /// Create a new edge with an empty property bag
    pub fn new(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            properties: IndexMap::new(),
        }
    }

    /// Create an evaluation-order edge carrying a branch tag
    pub fn eog_branch(from: NodeId, to: NodeId, branch: bool) -> Self {
        Self::new(from, to, EdgeKind::Eog).with_property(PropertyKey::Branch, PropertyValue::Bool(branch))
    }

    /// Create a data-flow edge with the given granularity; partial flows
    /// name the referenced member
    pub fn dfg(from: NodeId, to: NodeId, granularity: Granularity, member: Option<&str>) -> Self {
        let edge = Self::new(from, to, EdgeKind::Dfg)
            .with_property(PropertyKey::Granularity, PropertyValue::Granularity(granularity));
        match member {
            Some(member) => edge.with_property(PropertyKey::Member, PropertyValue::Text(member.to_string())),
            None => edge,
        }
    }

    /// Attach a property, replacing any previous value for the key
    pub fn with_property(mut self, key: PropertyKey, value: PropertyValue) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// Set a property, replacing any previous value for the key
    pub fn add_property(&mut self, key: PropertyKey, value: PropertyValue) {
        self.properties.insert(key, value);
    }

    /// Read a property; absent keys yield `None`, never an error
    pub fn get_property(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.properties.get(&key)
    }

    /// Position within the source node's outgoing collection at insertion
    pub fn index(&self) -> Option<usize> {
        match self.get_property(PropertyKey::Index) {
            Some(PropertyValue::Int(i)) => usize::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Branch tag of a conditional control-flow step
    pub fn branch(&self) -> Option<bool> {
        match self.get_property(PropertyKey::Branch) {
            Some(PropertyValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Set the branch tag
    pub fn set_branch(&mut self, branch: bool) {
        self.add_property(PropertyKey::Branch, PropertyValue::Bool(branch));
    }

    /// Whether this control-flow step is proven never taken
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self.get_property(PropertyKey::Unreachable),
            Some(PropertyValue::Bool(true))
        )
    }

    /// Mark this control-flow step as never taken
    pub fn mark_unreachable(&mut self) {
        self.add_property(PropertyKey::Unreachable, PropertyValue::Bool(true));
    }

    /// Granularity of a data-flow edge; defaults to whole-value
    pub fn granularity(&self) -> Granularity {
        match self.get_property(PropertyKey::Granularity) {
            Some(PropertyValue::Granularity(g)) => *g,
            _ => Granularity::Full,
        }
    }

    /// Referenced member of a partial data flow
    pub fn member(&self) -> Option<&str> {
        match self.get_property(PropertyKey::Member) {
            Some(PropertyValue::Text(member)) => Some(member),
            _ => None,
        }
    }

    fn semantic_property_count(&self) -> usize {
        self.properties.len() - usize::from(self.properties.contains_key(&PropertyKey::Index))
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.kind == other.kind
            && self.semantic_property_count() == other.semantic_property_count()
            && self.properties.iter().all(|(key, value)| {
                *key == PropertyKey::Index || other.properties.get(key) == Some(value)
            })
    }
}

impl Eq for Edge {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_kind_roundtrip() {
        for kind in EdgeKind::all() {
            let s = kind.as_str();
            let parsed: EdgeKind = s.parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_edge_kind_serialization() {
        assert_eq!(serde_json::to_string(&EdgeKind::Eog).unwrap(), "\"eog\"");
        assert_eq!(serde_json::from_str::<EdgeKind>("\"dfg\"").unwrap(), EdgeKind::Dfg);
    }

    #[test]
    fn test_branch_and_unreachable_tags() {
        let mut edge = Edge::eog_branch(NodeId(0), NodeId(1), true);
        assert_eq!(edge.branch(), Some(true));
        assert!(!edge.is_unreachable());

        edge.mark_unreachable();
        assert!(edge.is_unreachable());
    }

    #[test]
    fn test_dfg_granularity() {
        let full = Edge::dfg(NodeId(0), NodeId(1), Granularity::Full, None);
        assert_eq!(full.granularity(), Granularity::Full);
        assert_eq!(full.member(), None);

        let partial = Edge::dfg(NodeId(0), NodeId(1), Granularity::Partial, Some("len"));
        assert_eq!(partial.granularity(), Granularity::Partial);
        assert_eq!(partial.member(), Some("len"));
    }

    #[test]
    fn test_absent_property_is_none() {
        let edge = Edge::new(NodeId(0), NodeId(1), EdgeKind::Eog);
        assert!(edge.get_property(PropertyKey::Member).is_none());
        assert_eq!(edge.branch(), None);
    }

    #[test]
    fn test_structural_equality_ignores_index() {
        let a = Edge::dfg(NodeId(0), NodeId(1), Granularity::Full, None)
            .with_property(PropertyKey::Index, PropertyValue::Int(0));
        let b = Edge::dfg(NodeId(0), NodeId(1), Granularity::Full, None)
            .with_property(PropertyKey::Index, PropertyValue::Int(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_structural_equality_compares_properties() {
        let a = Edge::dfg(NodeId(0), NodeId(1), Granularity::Full, None);
        let b = Edge::dfg(NodeId(0), NodeId(1), Granularity::Partial, Some("len"));
        let c = Edge::new(NodeId(0), NodeId(2), EdgeKind::Dfg);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
