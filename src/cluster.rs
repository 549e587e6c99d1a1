//! Clustering strategies that partition the walkable cells of a grid into
//! the clusters the hierarchical abstraction is built from. Both strategies
//! assign every walkable cell to exactly one non-empty cluster and never
//! include blocked cells.

use crate::{PathingGrid, DEFAULT_CLUSTER_SIZE};
use fxhash::FxBuildHasher;
use grid_util::grid::Grid;
use grid_util::point::Point;
use indexmap::IndexMap;
use petgraph::unionfind::UnionFind;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// A set of walkable cells assigned to one cluster. Order is irrelevant.
pub type Cluster = Vec<Point>;

/// A total, deterministic partition of the walkable cells of a grid.
pub trait ClusterStrategy {
    /// Name of the hierarchical algorithm variant this strategy backs.
    fn label(&self) -> &'static str;
    fn clusters(&self, grid: &PathingGrid) -> Vec<Cluster>;
}

/// Tiles the grid into non-overlapping axis-aligned `size` x `size` blocks,
/// truncated at the right and bottom edges. The walkable cells of each
/// block form one cluster, independent of grid topology.
#[derive(Clone, Copy, Debug)]
pub struct UniformClusters {
    size: usize,
}

impl UniformClusters {
    pub fn new(size: usize) -> UniformClusters {
        assert!(size > 0, "cluster size must be positive");
        UniformClusters { size }
    }
}

impl Default for UniformClusters {
    fn default() -> UniformClusters {
        UniformClusters::new(DEFAULT_CLUSTER_SIZE)
    }
}

impl ClusterStrategy for UniformClusters {
    fn label(&self) -> &'static str {
        "HPA*"
    }
    fn clusters(&self, grid: &PathingGrid) -> Vec<Cluster> {
        let w = grid.width();
        let h = grid.height();
        let mut clusters = Vec::new();
        for y0 in (0..h).step_by(self.size) {
            for x0 in (0..w).step_by(self.size) {
                let mut cells: Cluster = Vec::new();
                for y in y0..(y0 + self.size).min(h) {
                    for x in x0..(x0 + self.size).min(w) {
                        let p = Point::new(x as i32, y as i32);
                        if grid.walkable(p) {
                            cells.push(p);
                        }
                    }
                }
                if !cells.is_empty() {
                    clusters.push(cells);
                }
            }
        }
        clusters
    }
}

/// Grows every maximal 4-connected component of walkable cells into one
/// cluster, using a [UnionFind] pass over the grid. Clusters are emitted in
/// order of first discovery.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegionGrow;

impl ClusterStrategy for RegionGrow {
    fn label(&self) -> &'static str {
        "AHPA*"
    }
    fn clusters(&self, grid: &PathingGrid) -> Vec<Cluster> {
        let w = grid.width();
        let h = grid.height();
        let mut components: UnionFind<usize> = UnionFind::new(w * h);
        for y in 0..h {
            for x in 0..w {
                let p = Point::new(x as i32, y as i32);
                if grid.walkable(p) {
                    for neighbour in [Point::new(p.x + 1, p.y), Point::new(p.x, p.y + 1)] {
                        if grid.walkable(neighbour) {
                            components.union(
                                y * w + x,
                                neighbour.y as usize * w + neighbour.x as usize,
                            );
                        }
                    }
                }
            }
        }
        let mut by_root: FxIndexMap<usize, Cluster> = FxIndexMap::default();
        for y in 0..h {
            for x in 0..w {
                let p = Point::new(x as i32, y as i32);
                if grid.walkable(p) {
                    by_root.entry(components.find(y * w + x)).or_default().push(p);
                }
            }
        }
        by_root.into_values().collect()
    }
}
