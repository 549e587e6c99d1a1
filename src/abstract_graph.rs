//! The abstract graph of the hierarchical pathfinder: a directed weighted
//! graph whose nodes are entrance cells of clusters, stored as an explicit
//! adjacency list. Entrances of the same cluster are connected by edges
//! weighted with the true grid distance between them; 4-adjacent entrances
//! of different clusters are glued together with unit-weight edges.

use crate::cluster::Cluster;
use crate::{cardinal_neighbours, manhattan, PathingGrid};
use fxhash::FxHashMap;
use grid_util::point::Point;
use itertools::Itertools;
use log::info;

/// An entrance cell promoted to a node, retaining its originating
/// coordinate and cluster index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AbstractNode {
    pub cell: Point,
    pub cluster: usize,
}

/// Directed weighted graph over entrance nodes. Built once per grid and
/// clustering, then shared read-only across any number of queries.
#[derive(Clone, Debug, Default)]
pub struct AbstractGraph {
    nodes: Vec<AbstractNode>,
    adjacency: Vec<Vec<(usize, i32)>>,
    node_ids: FxHashMap<Point, usize>,
}

impl AbstractGraph {
    /// Builds the abstract graph for a clustering of `grid`. Intra-cluster
    /// edge weights are computed with A* over the whole grid, so they
    /// reflect actual reachability rather than paths confined to the
    /// cluster; entrance pairs with no connecting path contribute no edge.
    pub fn build(grid: &PathingGrid, clusters: &[Cluster]) -> AbstractGraph {
        let mut cluster_of: FxHashMap<Point, usize> = FxHashMap::default();
        for (idx, cluster) in clusters.iter().enumerate() {
            for &cell in cluster {
                cluster_of.insert(cell, idx);
            }
        }
        let mut graph = AbstractGraph::default();
        // A cell is an entrance iff some walkable cardinal neighbour lies
        // outside its own cluster.
        let mut cluster_entrances: Vec<Vec<usize>> = Vec::with_capacity(clusters.len());
        for (idx, cluster) in clusters.iter().enumerate() {
            let mut entrance_ids = Vec::new();
            for &cell in cluster {
                let is_entrance = cardinal_neighbours(&cell)
                    .into_iter()
                    .any(|n| grid.walkable(n) && cluster_of.get(&n) != Some(&idx));
                if is_entrance {
                    entrance_ids.push(graph.add_node(cell, idx));
                }
            }
            cluster_entrances.push(entrance_ids);
        }
        for entrance_ids in &cluster_entrances {
            for (a, b) in entrance_ids.iter().copied().tuple_combinations() {
                let from = graph.nodes[a].cell;
                let to = graph.nodes[b].cell;
                if let Some((_, cost)) = grid.astar_raw(from, to, manhattan) {
                    graph.add_edge(a, b, cost);
                    graph.add_edge(b, a, cost);
                }
            }
        }
        // Inter-cluster edges come out symmetric because both endpoints of
        // an adjacent pair pass through this loop.
        for id in 0..graph.nodes.len() {
            let AbstractNode { cell, cluster } = graph.nodes[id];
            for neighbour in cardinal_neighbours(&cell) {
                if let Some(other) = graph.node_ids.get(&neighbour).copied() {
                    if graph.nodes[other].cluster != cluster {
                        graph.add_edge(id, other, 1);
                    }
                }
            }
        }
        info!(
            "Built abstract graph over {} clusters: {} entrance nodes",
            clusters.len(),
            graph.node_count()
        );
        graph
    }

    fn add_node(&mut self, cell: Point, cluster: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(AbstractNode { cell, cluster });
        self.adjacency.push(Vec::new());
        self.node_ids.insert(cell, id);
        id
    }

    fn add_edge(&mut self, from: usize, to: usize, weight: i32) {
        self.adjacency[from].push((to, weight));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: usize) -> &AbstractNode {
        &self.nodes[id]
    }

    /// The node id of an entrance cell, if the cell is one.
    pub fn node_id(&self, cell: &Point) -> Option<usize> {
        self.node_ids.get(cell).copied()
    }

    /// Outgoing edges of a node as (neighbour id, weight) pairs.
    pub fn neighbours(&self, id: usize) -> &[(usize, i32)] {
        &self.adjacency[id]
    }

    /// The entrance node closest to `cell` by Manhattan distance, which
    /// approximates (and may differ from) the closest by grid distance.
    /// Ties are broken arbitrarily but deterministically.
    pub fn nearest_entrance(&self, cell: &Point) -> Option<usize> {
        (0..self.nodes.len()).min_by_key(|&id| manhattan(&self.nodes[id].cell, cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterStrategy, RegionGrow, UniformClusters};
    use grid_util::grid::Grid;

    fn build_with(grid: &PathingGrid, strategy: &dyn ClusterStrategy) -> AbstractGraph {
        AbstractGraph::build(grid, &strategy.clusters(grid))
    }

    /// Every edge must have a reverse edge of equal weight.
    fn assert_symmetric(graph: &AbstractGraph) {
        for from in 0..graph.node_count() {
            for &(to, weight) in graph.neighbours(from) {
                assert!(
                    graph
                        .neighbours(to)
                        .iter()
                        .any(|&(back, back_weight)| back == from && back_weight == weight),
                    "edge {} -> {} (weight {}) has no equal reverse",
                    from,
                    to,
                    weight
                );
            }
        }
    }

    /// A single cluster covering the whole grid has no cell with a walkable
    /// neighbour outside it, so no entrances exist at all.
    #[test]
    fn single_cluster_has_no_entrances() {
        let grid: PathingGrid = PathingGrid::new(5, 5, true);
        let graph = build_with(&grid, &UniformClusters::new(5));
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
    }

    /// On an open 3x10 grid split into two 5-row blocks, the entrances are
    /// exactly the six cells on either side of the block boundary.
    #[test]
    fn two_block_boundary_entrances() {
        let grid: PathingGrid = PathingGrid::new(3, 10, true);
        let graph = build_with(&grid, &UniformClusters::new(5));
        assert_eq!(graph.node_count(), 6);
        for x in 0..3 {
            let near = graph.node_id(&Point::new(x, 4)).unwrap();
            let far = graph.node_id(&Point::new(x, 5)).unwrap();
            assert_ne!(graph.node(near).cluster, graph.node(far).cluster);
            // The boundary pair is glued together with a unit-weight edge.
            assert!(graph.neighbours(near).contains(&(far, 1)));
        }
        // Intra-cluster edges carry true grid distances.
        let left = graph.node_id(&Point::new(0, 4)).unwrap();
        let right = graph.node_id(&Point::new(2, 4)).unwrap();
        assert!(graph.neighbours(left).contains(&(right, 2)));
        assert_symmetric(&graph);
    }

    #[test]
    fn edges_are_symmetric_on_obstructed_grid() {
        let mut grid: PathingGrid = PathingGrid::new(8, 8, true);
        grid.set(1, 1, false);
        grid.set(2, 1, false);
        grid.set(5, 4, false);
        grid.set(5, 5, false);
        grid.set(6, 5, false);
        grid.generate_components();
        let graph = build_with(&grid, &UniformClusters::new(4));
        assert!(!graph.is_empty());
        assert_symmetric(&graph);
    }

    /// Region-grown clusters are maximal components, so no walkable cell
    /// ever borders another cluster and the abstraction stays empty.
    #[test]
    fn region_grown_clusters_yield_empty_graph() {
        let mut grid: PathingGrid = PathingGrid::new(6, 6, true);
        grid.set(3, 0, false);
        grid.set(3, 1, false);
        grid.set(3, 2, false);
        grid.generate_components();
        let graph = build_with(&grid, &RegionGrow);
        assert!(graph.is_empty());
    }

    #[test]
    fn nearest_entrance_by_manhattan_distance() {
        let grid: PathingGrid = PathingGrid::new(3, 10, true);
        let graph = build_with(&grid, &UniformClusters::new(5));
        let id = graph.nearest_entrance(&Point::new(0, 0)).unwrap();
        assert_eq!(graph.node(id).cell, Point::new(0, 4));
        let id = graph.nearest_entrance(&Point::new(2, 9)).unwrap();
        assert_eq!(graph.node(id).cell, Point::new(2, 5));
        assert!(AbstractGraph::default()
            .nearest_entrance(&Point::new(0, 0))
            .is_none());
    }
}
