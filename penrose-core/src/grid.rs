//! Uniform spatial hash over nodes of one or more [`LinkedLine`]s.
//!
//! The grid only stores [`NodeRef`]s. Moving a node after it was inserted
//! leaves its bucket stale until the grid is cleared and the line is
//! inserted again, so treat a grid as a snapshot of the positions at
//! insertion time. It is not safe for concurrent mutation.

use crate::{
    error::LineError,
    line::LinkedLine,
    types::{NodeId, NodeRef},
};
use glam::DVec2;
use std::{collections::HashMap, fmt};
use tracing::trace;

/// Integer cell coordinates.
pub type Cell = (i64, i64);

#[derive(Clone, Debug)]
pub struct Grid {
    cell_size: f64,
    cells: HashMap<Cell, Vec<NodeRef>>,
}

/// Floor division with the remainder convention `x = d * q + r`,
/// `0 <= r < d` for positive `d`.
///
/// Computing `(x / d).floor()` directly can land one cell off when the
/// quotient rounds up to an integer, e.g. `1.0 / 0.1 == 10.0` even though
/// `0.1 * 10.0 > 1.0`.
fn floor_div(x: f64, d: f64) -> f64 {
    let m = x % d;
    let mut div = (x - m) / d;
    if m != 0.0 && (d < 0.0) != (m < 0.0) {
        div -= 1.0;
    }
    if div == 0.0 {
        return 0.0;
    }
    let q = div.floor();
    if div - q > 0.5 { q + 1.0 } else { q }
}

impl Grid {
    /// ### Panics
    /// Panics unless `cell_size` is positive and finite.
    pub fn new(cell_size: f64) -> Self {
        assert!(
            cell_size > 0.0 && cell_size.is_finite(),
            "grid cell size must be positive, got {cell_size}"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing `pos`, flooring toward negative infinity.
    #[allow(clippy::cast_possible_truncation)]
    pub fn hash(&self, pos: DVec2) -> Cell {
        (
            floor_div(pos.x, self.cell_size) as i64,
            floor_div(pos.y, self.cell_size) as i64,
        )
    }

    pub fn hash_node(&self, line: &LinkedLine, id: NodeId) -> Option<Cell> {
        line.node(id).map(|n| self.hash(n.pos))
    }

    /// Appends every node of `line` to its cell bucket. Inserting the same
    /// line twice indexes its nodes twice.
    ///
    /// ### Returns
    /// The number of entries added.
    pub fn insert_line(&mut self, line: &LinkedLine) -> usize {
        let mut added = 0;
        for (id, node) in line {
            let cell = self.hash(node.pos);
            self.cells.entry(cell).or_default().push(NodeRef {
                line: line.id(),
                node: id,
            });
            added += 1;
        }
        trace!(line = ?line.id(), added, cells = self.cells.len(), "grid insert");
        added
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn bucket(&self, cell: Cell) -> &[NodeRef] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every entry in the 3x3 block of cells around `pos`, except those
    /// that are `at` itself.
    ///
    /// Cells are scanned with the x offset in the outer loop, then bucket
    /// contents in insertion order.
    pub fn neighbourhood_at(&self, at: NodeRef, pos: DVec2) -> Vec<NodeRef> {
        let (cx, cy) = self.hash(pos);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend(bucket.iter().copied().filter(|r| *r != at));
                }
            }
        }
        out
    }

    /// Neighbours of node `id` of `line`, excluding the node itself.
    ///
    /// ### Errors
    /// [`LineError::UnknownNode`] if `line` has no node `id`.
    pub fn get_neighbourhood(
        &self,
        line: &LinkedLine,
        id: NodeId,
    ) -> Result<Vec<NodeRef>, LineError> {
        let node = line.node(id).ok_or(LineError::UnknownNode(id))?;
        let at = NodeRef {
            line: line.id(),
            node: id,
        };
        Ok(self.neighbourhood_at(at, node.pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &[NodeRef])> + '_ {
        self.cells.iter().map(|(c, b)| (*c, b.as_slice()))
    }

    /// Total number of indexed entries, duplicates included.
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// One `cell: bucket` line per occupied cell, in cell order.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cells: Vec<_> = self.iter().collect();
        cells.sort_unstable_by_key(|(cell, _)| *cell);
        for (cell, bucket) in cells {
            writeln!(f, "{cell:?}: {bucket:?}")?;
        }
        Ok(())
    }
}
