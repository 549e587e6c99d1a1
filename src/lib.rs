//! # grid_hpa
//!
//! Shortest paths over boolean occupancy grids, either directly with
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) or through a
//! two-level [hierarchical abstraction](https://webdocs.cs.ualberta.ca/~mmueller/ps/hpastar.pdf)
//! (HPA*): the grid is partitioned into clusters, entrance cells on cluster
//! boundaries are promoted to nodes of a sparse weighted graph, and queries
//! run Dijkstra over that graph instead of the raw grid. Movement is
//! 4-directional with unit step cost. Pre-computed
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! avoid flood-filling behaviour when no path exists.

mod astar;

pub mod abstract_graph;
pub mod cluster;
pub mod hierarchical;

use core::fmt;
use grid_util::grid::{BoolGrid, Grid};
use grid_util::point::Point;
use log::info;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;
use thiserror::Error;

pub use abstract_graph::{AbstractGraph, AbstractNode};
pub use cluster::{Cluster, ClusterStrategy, RegionGrow, UniformClusters};
pub use hierarchical::{hierarchical_search, HierarchicalPathfinder};

/// Default edge length of the square blocks produced by [UniformClusters].
pub const DEFAULT_CLUSTER_SIZE: usize = 15;

/// Manhattan distance between two points. Admissible and consistent for
/// 4-directional movement with unit step cost.
pub fn manhattan(a: &Point, b: &Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// The four cardinal neighbours of a point, bounds not checked.
pub(crate) fn cardinal_neighbours(p: &Point) -> [Point; 4] {
    [
        Point::new(p.x, p.y + 1),
        Point::new(p.x + 1, p.y),
        Point::new(p.x, p.y - 1),
        Point::new(p.x - 1, p.y),
    ]
}

/// Precondition violation on a search endpoint. Note that an unreachable
/// goal is not an error: searches report it as an absent result.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PathingError {
    #[error("coordinate {0} lies outside the grid")]
    OutOfBounds(Point),
    #[error("coordinate {0} is not walkable")]
    NotWalkable(Point),
}

/// [PathingGrid] holds the raw walkability values in a [BoolGrid] ([true]
/// means walkable) and maintains information about connected components
/// using a [UnionFind] structure for fast unreachability checks.
/// Implements [Grid] by building on [BoolGrid].
#[derive(Clone, Debug)]
pub struct PathingGrid {
    pub grid: BoolGrid,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl Default for PathingGrid {
    fn default() -> PathingGrid {
        PathingGrid {
            grid: BoolGrid::default(),
            components: UnionFind::new(0),
            components_dirty: false,
        }
    }
}

impl PathingGrid {
    /// Whether `pos` is within bounds and walkable.
    pub fn walkable(&self, pos: Point) -> bool {
        self.in_bounds(pos.x, pos.y) && self.grid.get(pos.x as usize, pos.y as usize)
    }
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && self.grid.index_in_bounds(x as usize, y as usize)
    }
    fn cell_ix(&self, point: &Point) -> usize {
        self.grid.get_ix(point.x as usize, point.y as usize)
    }
    fn validate(&self, point: Point) -> Result<(), PathingError> {
        if !self.in_bounds(point.x, point.y) {
            Err(PathingError::OutOfBounds(point))
        } else if !self.grid.get(point.x as usize, point.y as usize) {
            Err(PathingError::NotWalkable(point))
        } else {
            Ok(())
        }
    }
    /// Walkable cardinal neighbours with their unit step cost.
    fn successors(&self, node: &Point) -> SmallVec<[(Point, i32); 4]> {
        cardinal_neighbours(node)
            .into_iter()
            .filter(|p| self.walkable(*p))
            .map(|p| (p, 1))
            .collect()
    }
    /// Checks if start and goal are on different components. Only meaningful
    /// while the components are not dirty.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.in_bounds(start.x, start.y) && self.in_bounds(goal.x, goal.y) {
            let start_ix = self.cell_ix(start);
            let goal_ix = self.cell_ix(goal);
            if self.components.equiv(start_ix, goal_ix) {
                false
            } else {
                info!("{} and {} are in different components", start, goal);
                true
            }
        } else {
            true
        }
    }
    /// Computes a shortest path from start to goal with the Manhattan
    /// distance as heuristic. Returns [Ok]\([None]) when the goal is
    /// unreachable and an error when an endpoint is out of bounds or
    /// blocked. On success the path runs from start to goal inclusive and
    /// the cost equals the number of steps taken.
    pub fn astar_path(
        &self,
        start: Point,
        goal: Point,
    ) -> Result<Option<(Vec<Point>, i32)>, PathingError> {
        self.astar_path_with_heuristic(start, goal, manhattan)
    }
    /// Like [astar_path](Self::astar_path) with a caller-supplied heuristic.
    /// The heuristic must be admissible for the returned cost to be optimal.
    pub fn astar_path_with_heuristic<H>(
        &self,
        start: Point,
        goal: Point,
        heuristic: H,
    ) -> Result<Option<(Vec<Point>, i32)>, PathingError>
    where
        H: Fn(&Point, &Point) -> i32,
    {
        self.validate(start)?;
        self.validate(goal)?;
        // The component precheck is only sound while components are current.
        if !self.components_dirty && self.unreachable(&start, &goal) {
            return Ok(None);
        }
        Ok(self.astar_raw(start, goal, heuristic))
    }
    /// Unvalidated search used internally where endpoints are walkable by
    /// construction (abstract graph edge weighting).
    pub(crate) fn astar_raw<H>(
        &self,
        start: Point,
        goal: Point,
        heuristic: H,
    ) -> Option<(Vec<Point>, i32)>
    where
        H: Fn(&Point, &Point) -> i32,
    {
        astar::best_first_search(
            &start,
            |node| self.successors(node),
            |point| heuristic(point, &goal),
            |point| *point == goal,
        )
    }
    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }
    /// Generates a new [UnionFind] structure and links up walkable grid
    /// neighbours to the same components.
    pub fn generate_components(&mut self) {
        info!("Generating connected components");
        let w = self.grid.width;
        let h = self.grid.height;
        self.components = UnionFind::new(w * h);
        self.components_dirty = false;
        for x in 0..w {
            for y in 0..h {
                if self.grid.get(x, y) {
                    let ix = self.grid.get_ix(x, y);
                    let point = Point::new(x as i32, y as i32);
                    // Linking east and south neighbours covers every
                    // walkable 4-adjacency exactly once.
                    for neighbour in [
                        Point::new(point.x + 1, point.y),
                        Point::new(point.x, point.y + 1),
                    ] {
                        if self.walkable(neighbour) {
                            let neighbour_ix = self
                                .grid
                                .get_ix(neighbour.x as usize, neighbour.y as usize);
                            self.components.union(ix, neighbour_ix);
                        }
                    }
                }
            }
        }
    }
}

impl fmt::Display for PathingGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Grid:")?;
        for y in 0..self.grid.height {
            let values = (0..self.grid.width)
                .map(|x| self.grid.get(x, y) as i32)
                .collect::<Vec<i32>>();
            writeln!(f, "{:?}", values)?;
        }
        Ok(())
    }
}

impl Grid<bool> for PathingGrid {
    fn new(width: usize, height: usize, walkable: bool) -> Self {
        let mut base_grid = PathingGrid {
            grid: BoolGrid::new(width, height, walkable),
            components: UnionFind::new(width * height),
            components_dirty: false,
        };
        base_grid.generate_components();
        base_grid
    }
    fn get(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y)
    }
    /// Updates a position on the grid. Joins newly connected components and
    /// flags the components as dirty if components are (potentially) broken
    /// apart into multiple.
    fn set(&mut self, x: usize, y: usize, walkable: bool) {
        let p = Point::new(x as i32, y as i32);
        if self.grid.get(x, y) != walkable && !walkable {
            self.components_dirty = true;
        } else if walkable {
            for neighbour in cardinal_neighbours(&p) {
                if self.walkable(neighbour) {
                    self.components
                        .union(self.grid.get_ix(x, y), self.cell_ix(&neighbour));
                }
            }
        }
        self.grid.set(x, y, walkable);
    }
    fn width(&self) -> usize {
        self.grid.width()
    }
    fn height(&self) -> usize {
        self.grid.height()
    }
}
