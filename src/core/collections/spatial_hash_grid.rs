//! Spatial hash grid used to snap arrangement nodes.
//!
//! Intersection points computed independently for different segment pairs rarely
//! agree to the last bit. Nodes are therefore merged when they fall within a
//! tolerance of each other; the grid keeps that lookup close to constant time.

use crate::core::collections::{FastHashMap, SmallBuffer};
use geo::Coord;

/// Inline bucket capacity; most cells hold at most a couple of nodes.
const BUCKET_INLINE_CAPACITY: usize = 4;

/// Integer cell coordinates.
type GridKey = (i64, i64);

/// Grid of node identifiers keyed by `floor(coord / cell_size)`.
#[derive(Clone, Debug)]
pub(crate) struct HashGridIndex {
    cell_size: f64,
    cells: FastHashMap<GridKey, SmallBuffer<usize, BUCKET_INLINE_CAPACITY>>,
}

impl HashGridIndex {
    /// Creates an empty grid; `cell_size` must be finite and positive.
    pub(crate) fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size.is_finite() && cell_size > 0.0 {
                cell_size
            } else {
                f64::EPSILON
            },
            cells: FastHashMap::default(),
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "float to int casts saturate; neighbour keys are offset with saturating adds"
    )]
    fn key_for(&self, c: Coord<f64>) -> GridKey {
        (
            (c.x / self.cell_size).floor() as i64,
            (c.y / self.cell_size).floor() as i64,
        )
    }

    /// Adds node `id` at `c`.
    pub(crate) fn insert(&mut self, id: usize, c: Coord<f64>) {
        self.cells.entry(self.key_for(c)).or_default().push(id);
    }

    /// Visits the nodes in the 3x3 cell neighbourhood of `c` until `f` returns
    /// `Some`.
    pub(crate) fn find_candidate<F, R>(&self, c: Coord<f64>, mut f: F) -> Option<R>
    where
        F: FnMut(usize) -> Option<R>,
    {
        let (kx, ky) = self.key_for(c);
        for dx in -1..=1 {
            for dy in -1..=1 {
                // Keys saturate far from the origin when cells are tiny.
                let key = (kx.saturating_add(dx), ky.saturating_add(dy));
                let Some(bucket) = self.cells.get(&key) else {
                    continue;
                };
                if let Some(found) = bucket.iter().find_map(|id| f(*id)) {
                    return Some(found);
                }
            }
        }
        None
    }
}

/// Deduplicated node positions.
#[derive(Clone, Debug)]
pub(crate) struct NodeSnapper {
    tolerance: f64,
    grid: HashGridIndex,
    nodes: Vec<Coord<f64>>,
}

impl NodeSnapper {
    pub(crate) fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            grid: HashGridIndex::new(tolerance),
            nodes: Vec::new(),
        }
    }

    /// Identifier of the node within tolerance of `c`, creating one if needed.
    pub(crate) fn snap(&mut self, c: Coord<f64>) -> usize {
        let tol = self.tolerance;
        let nodes = &self.nodes;
        if let Some(id) = self.grid.find_candidate(c, |id| {
            let n = nodes[id];
            ((n.x - c.x).hypot(n.y - c.y) <= tol).then_some(id)
        }) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(c);
        self.grid.insert(id, c);
        id
    }

    pub(crate) fn into_nodes(self) -> Vec<Coord<f64>> {
        self.nodes
    }
}
