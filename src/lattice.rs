//! Lattice algebra - partial orders for abstract analysis facts
//!
//! A `Lattice` is an algebra over a carried element type, not a value
//! itself: it defines the bottom element, join (`lub`), meet (`glb`), a
//! four-valued comparison, and deep duplication. Analyses pick a concrete
//! instance (powerset, map, tuple, triple) and hand it to the fixpoint
//! engine together with a transformation.
//!
//! Every instance supplied to the engine must have no infinite ascending
//! chains for the finite inputs a single program produces. This is a
//! documented precondition, not something the engine verifies.

use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;
use std::marker::PhantomData;

/// Result of comparing two lattice elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// `a` is strictly above `b`; `lub(a, b) == a` and `glb(a, b) == b`
    Greater,
    Equal,
    /// `a` is strictly below `b`; `lub(a, b) == b` and `glb(a, b) == a`
    Lesser,
    /// Genuinely incomparable
    Unequal,
}

/// A complete lattice over an element type.
pub trait Lattice {
    type Element;

    /// The identity element of `lub`: `lub(bottom, x) == x`
    fn bottom(&self) -> Self::Element;

    /// Least upper bound (join); monotone and idempotent on equal inputs
    fn lub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Greatest lower bound (meet)
    fn glb(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Partial-order comparison of two elements
    fn compare(&self, a: &Self::Element, b: &Self::Element) -> Order;

    /// Deep copy, safe for the caller to mutate independently
    fn duplicate(&self, a: &Self::Element) -> Self::Element;
}

/// Powerset lattice: sets ordered by inclusion.
///
/// Elements are `IndexSet`s so joins keep a deterministic iteration order;
/// membership is by equality of the carried handle type (`NodeId`/`EdgeId`
/// handles give identity semantics for graph elements).
pub struct PowersetLattice<T> {
    _element: PhantomData<T>,
}

impl<T> PowersetLattice<T> {
    pub fn new() -> Self {
        Self { _element: PhantomData }
    }
}

impl<T> Default for PowersetLattice<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> Lattice for PowersetLattice<T> {
    type Element = IndexSet<T>;

    fn bottom(&self) -> Self::Element {
        IndexSet::new()
    }

    fn lub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        let mut union = a.clone();
        for element in b {
            union.insert(element.clone());
        }
        union
    }

    fn glb(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.iter().filter(|e| b.contains(*e)).cloned().collect()
    }

    fn compare(&self, a: &Self::Element, b: &Self::Element) -> Order {
        let a_subset = a.iter().all(|e| b.contains(e));
        let b_subset = b.iter().all(|e| a.contains(e));
        match (a_subset, b_subset) {
            (true, true) => Order::Equal,
            (false, true) => Order::Greater,
            (true, false) => Order::Lesser,
            (false, false) => Order::Unequal,
        }
    }

    fn duplicate(&self, a: &Self::Element) -> Self::Element {
        a.clone()
    }
}

/// Map lattice: keyed elements combined key-wise with an inner lattice.
///
/// `lub` passes keys present in only one operand through unchanged; `glb`
/// drops them.
pub struct MapLattice<K, L> {
    values: L,
    _key: PhantomData<K>,
}

impl<K, L> MapLattice<K, L> {
    pub fn new(values: L) -> Self {
        Self { values, _key: PhantomData }
    }

    /// The lattice combining the values of shared keys
    pub fn value_lattice(&self) -> &L {
        &self.values
    }
}

impl<K: Clone + Eq + Hash, L: Lattice> Lattice for MapLattice<K, L> {
    type Element = IndexMap<K, L::Element>;

    fn bottom(&self) -> Self::Element {
        IndexMap::new()
    }

    fn lub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        let mut joined = self.duplicate(a);
        for (key, value) in b {
            match joined.get_mut(key) {
                Some(existing) => *existing = self.values.lub(existing, value),
                None => {
                    joined.insert(key.clone(), self.values.duplicate(value));
                }
            }
        }
        joined
    }

    fn glb(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.iter()
            .filter_map(|(key, value)| {
                b.get(key).map(|other| (key.clone(), self.values.glb(value, other)))
            })
            .collect()
    }

    fn compare(&self, a: &Self::Element, b: &Self::Element) -> Order {
        let shared: Vec<Order> = a
            .iter()
            .filter_map(|(key, value)| b.get(key).map(|other| self.values.compare(value, other)))
            .collect();
        let a_superset = b.keys().all(|key| a.contains_key(key));
        let b_superset = a.keys().all(|key| b.contains_key(key));

        if a_superset && b_superset && shared.iter().all(|o| *o == Order::Equal) {
            return Order::Equal;
        }
        if a_superset && shared.iter().all(|o| matches!(*o, Order::Greater | Order::Equal)) {
            return Order::Greater;
        }
        if b_superset && shared.iter().all(|o| matches!(*o, Order::Lesser | Order::Equal)) {
            return Order::Lesser;
        }
        Order::Unequal
    }

    fn duplicate(&self, a: &Self::Element) -> Self::Element {
        a.iter()
            .map(|(key, value)| (key.clone(), self.values.duplicate(value)))
            .collect()
    }
}

/// Pair of independent lattices, combined component-wise.
pub struct TupleLattice<A, B> {
    first: A,
    second: B,
}

impl<A, B> TupleLattice<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: Lattice, B: Lattice> Lattice for TupleLattice<A, B> {
    type Element = (A::Element, B::Element);

    fn bottom(&self) -> Self::Element {
        (self.first.bottom(), self.second.bottom())
    }

    fn lub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        (self.first.lub(&a.0, &b.0), self.second.lub(&a.1, &b.1))
    }

    fn glb(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        (self.first.glb(&a.0, &b.0), self.second.glb(&a.1, &b.1))
    }

    fn compare(&self, a: &Self::Element, b: &Self::Element) -> Order {
        combine_orders(&[
            self.first.compare(&a.0, &b.0),
            self.second.compare(&a.1, &b.1),
        ])
    }

    fn duplicate(&self, a: &Self::Element) -> Self::Element {
        (self.first.duplicate(&a.0), self.second.duplicate(&a.1))
    }
}

/// Triple of independent lattices, combined component-wise.
pub struct TripleLattice<A, B, C> {
    first: A,
    second: B,
    third: C,
}

impl<A, B, C> TripleLattice<A, B, C> {
    pub fn new(first: A, second: B, third: C) -> Self {
        Self { first, second, third }
    }
}

impl<A: Lattice, B: Lattice, C: Lattice> Lattice for TripleLattice<A, B, C> {
    type Element = (A::Element, B::Element, C::Element);

    fn bottom(&self) -> Self::Element {
        (self.first.bottom(), self.second.bottom(), self.third.bottom())
    }

    fn lub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        (
            self.first.lub(&a.0, &b.0),
            self.second.lub(&a.1, &b.1),
            self.third.lub(&a.2, &b.2),
        )
    }

    fn glb(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        (
            self.first.glb(&a.0, &b.0),
            self.second.glb(&a.1, &b.1),
            self.third.glb(&a.2, &b.2),
        )
    }

    fn compare(&self, a: &Self::Element, b: &Self::Element) -> Order {
        combine_orders(&[
            self.first.compare(&a.0, &b.0),
            self.second.compare(&a.1, &b.1),
            self.third.compare(&a.2, &b.2),
        ])
    }

    fn duplicate(&self, a: &Self::Element) -> Self::Element {
        (
            self.first.duplicate(&a.0),
            self.second.duplicate(&a.1),
            self.third.duplicate(&a.2),
        )
    }
}

/// Component-wise orders combine conservatively: a direction is asserted
/// only when every component agrees with it (Equal may mix with one
/// consistent direction); any other mix is Unequal.
fn combine_orders(orders: &[Order]) -> Order {
    if orders.iter().all(|o| *o == Order::Equal) {
        return Order::Equal;
    }
    if orders.iter().any(|o| *o == Order::Unequal) {
        return Order::Unequal;
    }
    let greater = orders.iter().any(|o| *o == Order::Greater);
    let lesser = orders.iter().any(|o| *o == Order::Lesser);
    match (greater, lesser) {
        (true, false) => Order::Greater,
        (false, true) => Order::Lesser,
        _ => Order::Unequal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use proptest::prelude::*;

    fn set(ids: &[u32]) -> IndexSet<NodeId> {
        ids.iter().map(|&i| NodeId(i)).collect()
    }

    #[test]
    fn test_powerset_bottom_is_identity() {
        let lattice = PowersetLattice::<NodeId>::new();
        let a = set(&[1, 2]);
        assert_eq!(lattice.lub(&lattice.bottom(), &a), a);
        assert_eq!(lattice.lub(&a, &lattice.bottom()), a);
    }

    #[test]
    fn test_powerset_compare() {
        let lattice = PowersetLattice::<NodeId>::new();
        assert_eq!(lattice.compare(&set(&[1, 2]), &set(&[1, 2])), Order::Equal);
        assert_eq!(lattice.compare(&set(&[1, 2]), &set(&[1])), Order::Greater);
        assert_eq!(lattice.compare(&set(&[1]), &set(&[1, 2])), Order::Lesser);
        assert_eq!(lattice.compare(&set(&[1]), &set(&[2])), Order::Unequal);
    }

    #[test]
    fn test_powerset_glb_is_intersection() {
        let lattice = PowersetLattice::<NodeId>::new();
        assert_eq!(lattice.glb(&set(&[1, 2, 3]), &set(&[2, 3, 4])), set(&[2, 3]));
    }

    proptest! {
        #[test]
        fn powerset_lub_is_commutative(
            a in proptest::collection::hash_set(0u32..64, 0..12),
            b in proptest::collection::hash_set(0u32..64, 0..12),
        ) {
            let lattice = PowersetLattice::<NodeId>::new();
            let a: IndexSet<NodeId> = a.into_iter().map(NodeId).collect();
            let b: IndexSet<NodeId> = b.into_iter().map(NodeId).collect();
            prop_assert_eq!(lattice.lub(&a, &b), lattice.lub(&b, &a));
        }

        #[test]
        fn powerset_lub_is_idempotent(a in proptest::collection::hash_set(0u32..64, 0..12)) {
            let lattice = PowersetLattice::<NodeId>::new();
            let a: IndexSet<NodeId> = a.into_iter().map(NodeId).collect();
            prop_assert_eq!(lattice.lub(&a, &a), a);
        }

        #[test]
        fn powerset_glb_is_within_lub(
            a in proptest::collection::hash_set(0u32..64, 0..12),
            b in proptest::collection::hash_set(0u32..64, 0..12),
        ) {
            let lattice = PowersetLattice::<NodeId>::new();
            let a: IndexSet<NodeId> = a.into_iter().map(NodeId).collect();
            let b: IndexSet<NodeId> = b.into_iter().map(NodeId).collect();
            let meet = lattice.glb(&a, &b);
            let join = lattice.lub(&a, &b);
            prop_assert!(meet.iter().all(|e| join.contains(e)));
        }
    }

    #[test]
    fn test_map_compare_equal_and_extra_key() {
        let lattice = MapLattice::<&str, PowersetLattice<NodeId>>::new(PowersetLattice::new());
        let mut m1 = IndexMap::new();
        m1.insert("x", set(&[1]));

        assert_eq!(lattice.compare(&m1, &m1), Order::Equal);

        let mut m2 = m1.clone();
        m2.insert("y", set(&[2]));
        assert_eq!(lattice.compare(&m2, &m1), Order::Greater);
        assert_eq!(lattice.compare(&m1, &m2), Order::Lesser);
    }

    #[test]
    fn test_map_lub_passes_lone_keys_through() {
        let lattice = MapLattice::<&str, PowersetLattice<NodeId>>::new(PowersetLattice::new());
        let mut a = IndexMap::new();
        a.insert("x", set(&[1]));
        a.insert("shared", set(&[2]));
        let mut b = IndexMap::new();
        b.insert("y", set(&[3]));
        b.insert("shared", set(&[4]));

        let joined = lattice.lub(&a, &b);
        assert_eq!(joined.get("x"), Some(&set(&[1])));
        assert_eq!(joined.get("y"), Some(&set(&[3])));
        assert_eq!(joined.get("shared"), Some(&set(&[2, 4])));
    }

    #[test]
    fn test_map_glb_drops_lone_keys() {
        let lattice = MapLattice::<&str, PowersetLattice<NodeId>>::new(PowersetLattice::new());
        let mut a = IndexMap::new();
        a.insert("x", set(&[1]));
        a.insert("shared", set(&[2, 3]));
        let mut b = IndexMap::new();
        b.insert("y", set(&[4]));
        b.insert("shared", set(&[3, 5]));

        let met = lattice.glb(&a, &b);
        assert_eq!(met.len(), 1);
        assert_eq!(met.get("shared"), Some(&set(&[3])));
    }

    #[test]
    fn test_map_mixed_inner_directions_are_unequal() {
        let lattice = MapLattice::<&str, PowersetLattice<NodeId>>::new(PowersetLattice::new());
        let mut a = IndexMap::new();
        a.insert("x", set(&[1, 2]));
        a.insert("y", set(&[3]));
        let mut b = IndexMap::new();
        b.insert("x", set(&[1]));
        b.insert("y", set(&[3, 4]));

        assert_eq!(lattice.compare(&a, &b), Order::Unequal);
    }

    #[test]
    fn test_tuple_compare_is_conservative() {
        let lattice = TupleLattice::new(
            PowersetLattice::<NodeId>::new(),
            PowersetLattice::<NodeId>::new(),
        );

        let equal = (set(&[1]), set(&[2]));
        assert_eq!(lattice.compare(&equal, &equal), Order::Equal);

        // one component greater, the other equal: direction holds
        let above = (set(&[1, 3]), set(&[2]));
        assert_eq!(lattice.compare(&above, &equal), Order::Greater);
        assert_eq!(lattice.compare(&equal, &above), Order::Lesser);

        // components disagree: incomparable, even though each side is
        // ordered on its own
        let mixed = (set(&[1, 3]), set(&[]));
        let other = (set(&[1]), set(&[2]));
        assert_eq!(lattice.compare(&mixed, &other), Order::Unequal);
    }

    #[test]
    fn test_triple_componentwise_lub() {
        let lattice = TripleLattice::new(
            PowersetLattice::<NodeId>::new(),
            PowersetLattice::<NodeId>::new(),
            PowersetLattice::<NodeId>::new(),
        );
        let a = (set(&[1]), set(&[]), set(&[5]));
        let b = (set(&[2]), set(&[3]), set(&[5]));

        let joined = lattice.lub(&a, &b);
        assert_eq!(joined, (set(&[1, 2]), set(&[3]), set(&[5])));
        assert_eq!(lattice.glb(&a, &b), (set(&[]), set(&[]), set(&[5])));
    }

    #[test]
    fn test_duplicate_is_independent() {
        let lattice = MapLattice::<&str, PowersetLattice<NodeId>>::new(PowersetLattice::new());
        let mut original = IndexMap::new();
        original.insert("x", set(&[1]));

        let mut copy = lattice.duplicate(&original);
        copy.get_mut("x").unwrap().insert(NodeId(9));

        assert_eq!(original.get("x"), Some(&set(&[1])));
    }
}
