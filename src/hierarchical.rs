//! Query layer over the abstract graph: maps arbitrary start/goal cells to
//! their nearest entrance nodes and runs Dijkstra between them. The
//! reported cost is the abstract-graph cost only; the legs from start and
//! goal to their entrances are not added, a deliberate approximation kept
//! for comparability with the grid-level baseline.

use crate::abstract_graph::AbstractGraph;
use crate::astar::best_first_search;
use crate::cluster::ClusterStrategy;
use crate::PathingGrid;
use grid_util::point::Point;

/// Searches the abstract graph between the entrance nodes nearest (by
/// Manhattan distance) to `start` and `goal`. Returns the abstract cost
/// ([None] when the goal entrance is unreachable in the abstraction) and
/// the total number of abstract nodes, or `(None, 0)` for a degenerate
/// clustering without any entrances.
pub fn hierarchical_search(
    graph: &AbstractGraph,
    start: Point,
    goal: Point,
) -> (Option<i32>, usize) {
    let (Some(start_node), Some(goal_node)) =
        (graph.nearest_entrance(&start), graph.nearest_entrance(&goal))
    else {
        return (None, 0);
    };
    // Dijkstra is the shared engine with a zero heuristic; it stops as soon
    // as the goal node is popped.
    let cost = best_first_search(
        &start_node,
        |&id: &usize| graph.neighbours(id).iter().copied(),
        |_| 0,
        |&id| id == goal_node,
    )
    .map(|(_, cost)| cost);
    (cost, graph.node_count())
}

/// Builds the clustering and abstract graph for a grid once and answers
/// many start/goal queries against the immutable graph, which is where the
/// hierarchical approach amortizes its build cost.
#[derive(Clone, Debug)]
pub struct HierarchicalPathfinder {
    label: &'static str,
    graph: AbstractGraph,
}

impl HierarchicalPathfinder {
    pub fn new<S: ClusterStrategy + ?Sized>(grid: &PathingGrid, strategy: &S) -> Self {
        let clusters = strategy.clusters(grid);
        HierarchicalPathfinder {
            label: strategy.label(),
            graph: AbstractGraph::build(grid, &clusters),
        }
    }

    /// Name of the algorithm variant this pathfinder implements.
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn graph(&self) -> &AbstractGraph {
        &self.graph
    }

    pub fn search(&self, start: Point, goal: Point) -> (Option<i32>, usize) {
        hierarchical_search(&self.graph, start, goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{RegionGrow, UniformClusters};
    use grid_util::grid::Grid;

    /// A 5x5 grid under a single 5x5 cluster has no entrances at all, which
    /// must surface as the degenerate `(None, 0)` result.
    #[test]
    fn degenerate_abstraction() {
        let grid: PathingGrid = PathingGrid::new(5, 5, true);
        let pathfinder = HierarchicalPathfinder::new(&grid, &UniformClusters::new(5));
        assert_eq!(
            pathfinder.search(Point::new(0, 0), Point::new(4, 4)),
            (None, 0)
        );
    }

    /// Open 3x10 grid split into two blocks: the nearest entrances to
    /// (0,0) and (2,9) are (0,4) and (2,5), three abstract steps apart.
    /// Together with the two 4-step approach legs this matches the true
    /// grid cost of 11.
    #[test]
    fn two_block_corridor() {
        let grid: PathingGrid = PathingGrid::new(3, 10, true);
        let pathfinder = HierarchicalPathfinder::new(&grid, &UniformClusters::new(5));
        let (cost, nodes) = pathfinder.search(Point::new(0, 0), Point::new(2, 9));
        assert_eq!(cost, Some(3));
        assert_eq!(nodes, 6);
        let (_, grid_cost) = grid
            .astar_path(Point::new(0, 0), Point::new(2, 9))
            .unwrap()
            .unwrap();
        assert_eq!(grid_cost, 11);
        assert_eq!(cost.unwrap() + 4 + 4, grid_cost);
    }

    /// The node count reported for a non-degenerate abstraction is the
    /// total abstract node count, even when the goal entrance cannot be
    /// reached within the abstraction.
    #[test]
    fn unreachable_within_abstraction_keeps_node_count() {
        // A full-width wall at y = 2 leaves entrance nodes above and below
        // it with no abstract edges across.
        let mut grid: PathingGrid = PathingGrid::new(4, 5, true);
        for x in 0..4 {
            grid.set(x, 2, false);
        }
        grid.generate_components();
        let pathfinder = HierarchicalPathfinder::new(&grid, &UniformClusters::new(2));
        let graph = pathfinder.graph();
        assert!(graph.node_count() > 0);
        let (cost, nodes) = pathfinder.search(Point::new(0, 0), Point::new(3, 4));
        assert_eq!(cost, None);
        assert_eq!(nodes, graph.node_count());
    }

    #[test]
    fn region_grow_variant_is_degenerate() {
        let grid: PathingGrid = PathingGrid::new(8, 8, true);
        let pathfinder = HierarchicalPathfinder::new(&grid, &RegionGrow);
        assert_eq!(pathfinder.label(), "AHPA*");
        assert_eq!(
            pathfinder.search(Point::new(0, 0), Point::new(7, 7)),
            (None, 0)
        );
    }
}
