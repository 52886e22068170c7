//! Worklist fixpoint engine over evaluation-order edges
//!
//! Propagates a lattice state along EOG edges until no state changes,
//! then joins the states recorded at every exit path. The engine is
//! synchronous and holds no state across invocations, so distinct
//! analyses may run their own fixpoints in parallel as long as they do
//! not share a lattice's mutable internals.

use crate::edge::EdgeId;
use crate::graph::Graph;
use crate::lattice::{Lattice, Order};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// Compute the stable state of every EOG edge reachable from
/// `start_edges` and return the join over all exit paths.
///
/// The transformation maps the state recorded at an edge to the state
/// after taking that control-flow step. Each successor's recorded state
/// is joined with the incoming one; a successor is re-queued - at the
/// front of the worklist, which converges faster on typical loop-bearing
/// control graphs - only when its recorded state is new or changed, which
/// is what guarantees termination for monotone transformations. A
/// non-monotone transformation is an undetected precondition violation
/// and manifests as non-termination; the engine has no iteration cap or
/// cancellation.
///
/// Multiple disjoint start edges share one worklist and state map, so
/// overlapping reachable subgraphs join. Edges whose target has no
/// outgoing EOG edge are sinks; the result is the `lub` of all sink
/// states, or the start state when none were reached.
pub fn iterate_eog<L, F>(
    graph: &Graph,
    start_edges: &[EdgeId],
    start_state: L::Element,
    lattice: &L,
    mut transformation: F,
) -> L::Element
where
    L: Lattice,
    F: FnMut(&Graph, EdgeId, &L::Element) -> L::Element,
{
    let mut global_state: HashMap<EdgeId, L::Element> = HashMap::new();
    let mut final_state: IndexMap<EdgeId, L::Element> = IndexMap::new();
    let mut worklist: VecDeque<EdgeId> = VecDeque::new();
    let mut pending: HashSet<EdgeId> = HashSet::new();

    for &edge in start_edges {
        global_state.insert(edge, lattice.duplicate(&start_state));
        if pending.insert(edge) {
            worklist.push_back(edge);
        }
    }

    while let Some(edge) = worklist.pop_front() {
        pending.remove(&edge);
        let Some(state) = global_state.get(&edge) else {
            continue;
        };
        let new_state = transformation(graph, edge, state);

        let successors = graph.eog_successors(edge);
        if successors.is_empty() {
            final_state.insert(edge, new_state);
            continue;
        }

        for &successor in successors {
            let changed = match global_state.get(&successor) {
                Some(previous) => {
                    let joined = lattice.lub(&new_state, previous);
                    if lattice.compare(&joined, previous) == Order::Equal {
                        false
                    } else {
                        global_state.insert(successor, joined);
                        true
                    }
                }
                None => {
                    global_state.insert(successor, lattice.duplicate(&new_state));
                    true
                }
            };
            if changed && pending.insert(successor) {
                worklist.push_front(successor);
            }
        }
    }

    let mut result: Option<L::Element> = None;
    for (_, state) in final_state {
        result = Some(match result {
            Some(accumulated) => lattice.lub(&accumulated, &state),
            None => state,
        });
    }
    result.unwrap_or(start_state)
}
