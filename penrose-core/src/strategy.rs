//! Extension points supplied by the relaxation driver.
//!
//! The core decides *when* these run and what they see; the force law and
//! the growth rule themselves live outside the crate. [`NoForce`] and
//! [`NoGrowth`] are the null implementations.

use crate::{line::LinkedLine, phases::Frame, tiling::TileInstance, tiling::TilingModel};
use glam::DVec2;

/// World-frame forces for one tile, indexed `[edge slot][placement][position]`.
///
/// Placements follow the order of the views handed to the law, and
/// positions follow the head-to-tail order of each view.
pub type TileForces = [Vec<Vec<DVec2>>; 3];

/// Computes per-vertex forces for the three boundary edges of one tile.
///
/// Each `lN` holds one materialized view per placement of edge `eN` in
/// that tile, in world coordinates. `frame` gives access to every other
/// view and to the [`crate::grid::Grid`] built over them.
pub trait ForceLaw {
    fn kite_forces(
        &self,
        l1: &[LinkedLine],
        l2: &[LinkedLine],
        l3: &[LinkedLine],
        frame: &Frame,
    ) -> TileForces;

    fn dart_forces(
        &self,
        l1: &[LinkedLine],
        l2: &[LinkedLine],
        l3: &[LinkedLine],
        frame: &Frame,
    ) -> TileForces;
}

/// Proposes tiles that would extend the current tiling.
///
/// Honouring the Penrose matching rules is the rule's job; the model only
/// decides which candidates are accepted.
pub trait GrowthRule {
    fn candidates(&mut self, model: &TilingModel) -> Vec<TileInstance>;
}

/// Zero forces shaped to match the given views.
pub fn zero_forces(l1: &[LinkedLine], l2: &[LinkedLine], l3: &[LinkedLine]) -> TileForces {
    let shape = |views: &[LinkedLine]| -> Vec<Vec<DVec2>> {
        views.iter().map(|v| vec![DVec2::ZERO; v.len()]).collect()
    };
    [shape(l1), shape(l2), shape(l3)]
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoForce;

impl ForceLaw for NoForce {
    fn kite_forces(
        &self,
        l1: &[LinkedLine],
        l2: &[LinkedLine],
        l3: &[LinkedLine],
        _frame: &Frame,
    ) -> TileForces {
        zero_forces(l1, l2, l3)
    }

    fn dart_forces(
        &self,
        l1: &[LinkedLine],
        l2: &[LinkedLine],
        l3: &[LinkedLine],
        _frame: &Frame,
    ) -> TileForces {
        zero_forces(l1, l2, l3)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoGrowth;

impl GrowthRule for NoGrowth {
    fn candidates(&mut self, _model: &TilingModel) -> Vec<TileInstance> {
        Vec::new()
    }
}
