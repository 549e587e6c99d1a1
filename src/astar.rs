//! Generic best-first search engine shared by the grid-level A* and the
//! Dijkstra pass over the abstract graph (which is just this engine with a
//! zero heuristic).
//!
//! Frontier entries are never removed when a better route to a node is
//! found; stale entries are skipped on pop instead (lazy deletion). The
//! best known cost per node lives in the indexed parents map, which doubles
//! as the structure the final path is reconstructed from.

use fxhash::FxBuildHasher;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use num_traits::Zero;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Frontier entry referring to a node by its index in the parents map.
struct FrontierEntry<C> {
    estimated_cost: C,
    cost: C,
    index: usize,
}

impl<C: PartialEq> Eq for FrontierEntry<C> {}

impl<C: PartialEq> PartialEq for FrontierEntry<C> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost.eq(&other.estimated_cost) && self.cost.eq(&other.cost)
    }
}

impl<C: Ord> PartialOrd for FrontierEntry<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Ord> Ord for FrontierEntry<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on estimated cost; on ties prefer the entry with the
        // larger accumulated cost, which tends to sit closer to the goal.
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => self.cost.cmp(&other.cost),
            s => s,
        }
    }
}

/// Runs a best-first search from `start` until `success` pops from the
/// frontier or the frontier runs dry. Returns the start-to-goal node
/// sequence and its cost, or [None] if no goal node was reachable.
pub(crate) fn best_first_search<N, C, FN, IN, FH, FS>(
    start: &N,
    mut successors: FN,
    mut heuristic: FH,
    mut success: FS,
) -> Option<(Vec<N>, C)>
where
    N: Eq + Hash + Clone,
    C: Zero + Ord + Copy,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = (N, C)>,
    FH: FnMut(&N) -> C,
    FS: FnMut(&N) -> bool,
{
    let mut frontier = BinaryHeap::new();
    frontier.push(FrontierEntry {
        estimated_cost: Zero::zero(),
        cost: Zero::zero(),
        index: 0,
    });
    // Node -> (index of parent, best known cost). usize::MAX marks the root.
    let mut parents: FxIndexMap<N, (usize, C)> = FxIndexMap::default();
    parents.insert(start.clone(), (usize::MAX, Zero::zero()));
    while let Some(FrontierEntry { cost, index, .. }) = frontier.pop() {
        let successors = {
            let (node, &(_, best_cost)) = parents.get_index(index).unwrap();
            if success(node) {
                return Some((reconstruct_path(&parents, index), cost));
            }
            // A node may sit in the frontier multiple times with different
            // priorities; only the entry matching the best known cost is
            // still worth expanding.
            if cost > best_cost {
                continue;
            }
            successors(node)
        };
        for (successor, move_cost) in successors {
            let new_cost = cost + move_cost;
            let h;
            let successor_index;
            match parents.entry(successor) {
                Vacant(e) => {
                    h = heuristic(e.key());
                    successor_index = e.index();
                    e.insert((index, new_cost));
                }
                Occupied(mut e) => {
                    if e.get().1 > new_cost {
                        h = heuristic(e.key());
                        successor_index = e.index();
                        e.insert((index, new_cost));
                    } else {
                        continue;
                    }
                }
            }
            frontier.push(FrontierEntry {
                estimated_cost: new_cost + h,
                cost: new_cost,
                index: successor_index,
            });
        }
    }
    None
}

/// Walks the parents map backwards from the goal entry at `index` and
/// returns the forward node sequence.
fn reconstruct_path<N, C>(parents: &FxIndexMap<N, (usize, C)>, index: usize) -> Vec<N>
where
    N: Eq + Hash + Clone,
{
    let mut path = Vec::new();
    let mut i = index;
    while let Some((node, &(parent, _))) = parents.get_index(i) {
        path.push(node.clone());
        i = parent;
    }
    path.reverse();
    path
}
