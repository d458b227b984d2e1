//! Phases of one relaxation step over the placed tiles.
//!
//! The typical step looks like:
//! 1. [`materialize_phase`]: every placed tile's edge placements are
//!    copied into world coordinates and indexed in a [`Grid`].
//! 2. [`force_phase`]: the driver's [`ForceLaw`] computes world-frame
//!    forces per tile, which are rotated back into each canonical edge's
//!    frame and accumulated in a [`ForceBuffer`] per edge.
//! 3. [`apply_phase`]: every canonical node moves by its averaged force.
//!
//! [`growth_phase`] runs independently and decides which proposed tiles
//! are added.

use crate::{
    config::Config,
    edge_identity::EdgeIdentity,
    error::{LineError, TilingError},
    force_buffer::ForceBuffer,
    grid::Grid,
    line::{LinkedLine, Node},
    orientation::Orientation,
    strategy::{ForceLaw, GrowthRule},
    tiling::{Prototile, TileInstance, TilingModel},
    types::{LineId, NodeId, NodeRef},
};
use rand::Rng;
use std::collections::HashMap;
use tracing::trace;

/// The world-frame edges of one placed tile.
#[derive(Debug)]
pub struct TileEdges {
    pub tile: TileInstance,
    /// Placements per edge slot, already composed with the tile placement.
    pub orientations: [Vec<Orientation>; 3],
    /// One view per entry of `orientations`.
    pub views: [Vec<LinkedLine>; 3],
}

/// Location of a materialized view inside a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewSlot {
    pub tile: usize,
    pub slot: usize,
    pub placement: usize,
}

/// Snapshot of every placed edge for one relaxation step.
#[derive(Debug)]
pub struct Frame {
    tiles: Vec<TileEdges>,
    lookup: HashMap<LineId, ViewSlot>,
    grid: Grid,
}

impl Frame {
    pub fn tiles(&self) -> &[TileEdges] {
        &self.tiles
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn locate(&self, line: LineId) -> Option<ViewSlot> {
        self.lookup.get(&line).copied()
    }

    pub fn view(&self, line: LineId) -> Option<&LinkedLine> {
        let at = self.locate(line)?;
        self.tiles[at.tile].views[at.slot].get(at.placement)
    }

    pub fn node(&self, at: NodeRef) -> Option<&Node> {
        self.view(at.line)?.node(at.node)
    }

    /// Grid neighbours of `at`; empty if `at` is not part of this frame.
    pub fn neighbourhood(&self, at: NodeRef) -> Vec<NodeRef> {
        match self.node(at) {
            Some(node) => self.grid.neighbourhood_at(at, node.pos),
            None => Vec::new(),
        }
    }
}

/// Copies every placed tile's edges into world coordinates.
///
/// The views come from [`EdgeIdentity::views`] over the model's canonical
/// edges, so they reflect the canonical geometry at the time of the call.
///
/// ### Errors
/// [`TilingError::InvalidCellSize`] unless `cfg.cell_size` is positive and
/// finite.
pub fn materialize_phase(model: &TilingModel, cfg: &Config) -> Result<Frame, TilingError> {
    if !(cfg.cell_size > 0.0 && cfg.cell_size.is_finite()) {
        return Err(TilingError::InvalidCellSize(cfg.cell_size));
    }
    let mut grid = Grid::new(cfg.cell_size);
    let mut tiles = Vec::with_capacity(model.tiles().len());
    let mut lookup = HashMap::new();

    for (t, tile) in model.tiles().iter().enumerate() {
        let orientations: [Vec<Orientation>; 3] =
            std::array::from_fn(|s| model.placements(tile, s));

        let mut views: [Vec<LinkedLine>; 3] = Default::default();
        for (s, slot_views) in views.iter_mut().enumerate() {
            *slot_views = EdgeIdentity::new(model.edge(s), &orientations[s])?.views();
            for (j, view) in slot_views.iter().enumerate() {
                grid.insert_line(view);
                lookup.insert(
                    view.id(),
                    ViewSlot {
                        tile: t,
                        slot: s,
                        placement: j,
                    },
                );
            }
        }

        tiles.push(TileEdges {
            tile: *tile,
            orientations,
            views,
        });
    }

    trace!(tiles = tiles.len(), entries = grid.len(), "materialized frame");
    Ok(Frame {
        tiles,
        lookup,
        grid,
    })
}

/// Runs the force law on every tile of `frame` and accumulates the forces
/// into `acc`, one buffer per canonical edge.
///
/// Each buffer is resized to its edge and cleared first. A force computed
/// on a view is rotated back by that view's placement before it is added,
/// so all contributions to a canonical node share one frame.
pub fn force_phase(
    model: &TilingModel,
    frame: &Frame,
    law: &dyn ForceLaw,
    acc: &mut [ForceBuffer; 3],
) -> Result<(), TilingError> {
    let ids: [Vec<NodeId>; 3] =
        std::array::from_fn(|s| model.edge(s).iter().map(|(id, _)| id).collect());
    for (buf, edge_ids) in acc.iter_mut().zip(&ids) {
        buf.ensure_len(edge_ids.len());
    }

    for (t, tile) in frame.tiles().iter().enumerate() {
        let forces = model.tile_forces(law, frame, t)?;
        for (s, per_slot) in forces.iter().enumerate() {
            for (j, per_placement) in per_slot.iter().enumerate() {
                let o = &tile.orientations[s][j];
                for (&id, f) in ids[s].iter().zip(per_placement) {
                    acc[s].add(id, o.inverse_rotate_vector(*f));
                }
            }
        }
    }
    Ok(())
}

/// Moves every canonical node by `cfg.step_len` times its averaged force.
///
/// With `cfg.pin_endpoints`, the head and tail of each edge stay put.
///
/// ### Returns
/// The largest displacement applied to any node.
pub fn apply_phase(
    edges: &mut [LinkedLine; 3],
    acc: &[ForceBuffer; 3],
    cfg: &Config,
) -> Result<f64, TilingError> {
    let mut max_step: f64 = 0.0;

    for (line, buf) in edges.iter_mut().zip(acc) {
        let head = line.head();
        let tail = line.tail();
        let pinned = |id: NodeId| cfg.pin_endpoints && (Some(id) == head || Some(id) == tail);

        let moves: Vec<_> = buf
            .touched_indices()
            .filter(|&id| !pinned(id))
            .map(|id| (id, buf.avg(id) * cfg.step_len))
            .collect();

        for (id, delta) in moves {
            let pos = line.node(id).ok_or(LineError::UnknownNode(id))?.pos;
            line.set_pos(id, pos + delta)?;
            max_step = max_step.max(delta.length());
        }
    }

    Ok(max_step)
}

/// Picks the accepted tiles among the rule's candidates, each one
/// independently with the given probability.
///
/// ### Errors
/// [`TilingError::InvalidProbability`] unless `probability` is in `[0, 1]`.
pub fn growth_phase(
    model: &TilingModel,
    rule: &mut dyn GrowthRule,
    probability: f64,
    rng: &mut impl Rng,
) -> Result<Vec<TileInstance>, TilingError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(TilingError::InvalidProbability(probability));
    }

    let accepted: Vec<TileInstance> = rule
        .candidates(model)
        .into_iter()
        .filter(|_| rng.random_bool(probability))
        .collect();
    trace!(accepted = accepted.len(), "growth candidates");
    Ok(accepted)
}

/// Which prototile a frame tile is, for dispatching to the force law.
pub(crate) fn prototile_of(frame: &Frame, tile: usize) -> Result<Prototile, TilingError> {
    frame
        .tiles()
        .get(tile)
        .map(|t| t.tile.prototile)
        .ok_or(TilingError::UnknownTile(tile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{NoForce, NoGrowth, TileForces};
    use glam::DVec2;
    use rand::{SeedableRng, rngs::StdRng};

    struct Everything(Vec<TileInstance>);

    impl GrowthRule for Everything {
        fn candidates(&mut self, _model: &TilingModel) -> Vec<TileInstance> {
            self.0.clone()
        }
    }

    /// Pushes each node along its view's world direction; rotated back,
    /// that is `+x` on every canonical edge.
    struct AlongEdge;

    fn along(views: &[LinkedLine]) -> Vec<Vec<DVec2>> {
        views
            .iter()
            .map(|v| {
                let pts: Vec<DVec2> = v.positions().collect();
                let dir = (pts[pts.len() - 1] - pts[0]).normalize_or_zero();
                vec![dir; pts.len()]
            })
            .collect()
    }

    impl ForceLaw for AlongEdge {
        fn kite_forces(
            &self,
            l1: &[LinkedLine],
            l2: &[LinkedLine],
            l3: &[LinkedLine],
            _frame: &Frame,
        ) -> TileForces {
            [along(l1), along(l2), along(l3)]
        }

        fn dart_forces(
            &self,
            l1: &[LinkedLine],
            l2: &[LinkedLine],
            l3: &[LinkedLine],
            frame: &Frame,
        ) -> TileForces {
            self.kite_forces(l1, l2, l3, frame)
        }
    }

    fn kite_model() -> TilingModel {
        let mut model = TilingModel::new(Config::default());
        model.place(TileInstance::new(Prototile::Kite, Orientation::IDENTITY));
        model
    }

    #[test]
    fn materialize_indexes_every_placement() {
        let model = kite_model();
        let frame = materialize_phase(&model, &Config::default()).unwrap();

        assert_eq!(frame.tiles().len(), 1);
        let tile = &frame.tiles()[0];
        let counts: Vec<usize> = tile.views.iter().map(Vec::len).collect();
        assert_eq!(counts, vec![2, 1, 1]);
        // Four two-node views.
        assert_eq!(frame.grid().len(), 8);

        let view = &tile.views[1][0];
        assert_eq!(
            frame.locate(view.id()),
            Some(ViewSlot {
                tile: 0,
                slot: 1,
                placement: 0
            })
        );
    }

    #[test]
    fn shared_vertex_is_a_neighbour() {
        let model = kite_model();
        let frame = materialize_phase(&model, &Config::default()).unwrap();
        let tile = &frame.tiles()[0];

        // e2's far end meets the far end of the first e1 placement.
        let e2 = &tile.views[1][0];
        let tip = NodeRef {
            line: e2.id(),
            node: e2.tail().unwrap(),
        };
        let e1 = &tile.views[0][0];
        let partner = NodeRef {
            line: e1.id(),
            node: e1.tail().unwrap(),
        };

        let near = frame.neighbourhood(tip);
        assert!(near.contains(&partner));
        assert!(!near.contains(&tip));
        let a = frame.node(tip).unwrap().pos;
        let b = frame.node(partner).unwrap().pos;
        assert!((a - b).length() < 1e-12);
    }

    #[test]
    fn force_phase_maps_back_to_canonical_frame() {
        let mut model = kite_model();
        model.subdivide(0.5).unwrap();
        let frame = materialize_phase(&model, &Config::default()).unwrap();

        let mut acc: [ForceBuffer; 3] = Default::default();
        force_phase(&model, &frame, &AlongEdge, &mut acc).unwrap();

        for (s, buf) in acc.iter().enumerate() {
            assert_eq!(buf.len(), model.edge(s).len());
            for (id, _) in model.edge(s) {
                assert!((buf.avg(id) - DVec2::X).length() < 1e-9);
            }
        }
        // e1 is placed twice in a kite.
        let head = model.edge(0).head().unwrap();
        assert_eq!(acc[0].count(head), 2);
    }

    #[test]
    fn apply_phase_respects_pinned_endpoints() {
        let mut model = kite_model();
        model.subdivide(0.5).unwrap();
        let frame = materialize_phase(&model, &Config::default()).unwrap();
        let mut acc: [ForceBuffer; 3] = Default::default();
        force_phase(&model, &frame, &AlongEdge, &mut acc).unwrap();

        let mut edges = model.edges().clone();
        let before: Vec<DVec2> = edges[0].positions().collect();
        let cfg = Config {
            step_len: 0.1,
            ..Config::default()
        };
        let max_step = apply_phase(&mut edges, &acc, &cfg).unwrap();
        let after: Vec<DVec2> = edges[0].positions().collect();

        assert!((max_step - 0.1).abs() < 1e-9);
        assert_eq!(before[0], after[0]);
        assert_eq!(before[before.len() - 1], after[after.len() - 1]);
        assert!((after[1] - before[1] - DVec2::new(0.1, 0.0)).length() < 1e-9);
    }

    #[test]
    fn no_force_moves_nothing() {
        let model = kite_model();
        let frame = materialize_phase(&model, &Config::default()).unwrap();
        let mut acc: [ForceBuffer; 3] = Default::default();
        force_phase(&model, &frame, &NoForce, &mut acc).unwrap();

        let cfg = Config {
            pin_endpoints: false,
            ..Config::default()
        };
        let mut edges = model.edges().clone();
        assert_eq!(apply_phase(&mut edges, &acc, &cfg).unwrap(), 0.0);
    }

    #[test]
    fn bad_cell_size_is_reported() {
        let model = kite_model();
        for cell_size in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let cfg = Config {
                cell_size,
                ..Config::default()
            };
            assert!(matches!(
                materialize_phase(&model, &cfg),
                Err(TilingError::InvalidCellSize(_))
            ));
        }

        let mut model = TilingModel::new(Config {
            cell_size: 0.0,
            ..Config::default()
        });
        model.place(TileInstance::new(Prototile::Kite, Orientation::IDENTITY));
        assert_eq!(
            model.differentiate(&NoForce).err(),
            Some(TilingError::InvalidCellSize(0.0))
        );
    }

    #[test]
    fn growth_phase_honours_probability_bounds() {
        let model = kite_model();
        let mut rng = StdRng::seed_from_u64(7);
        let proposal = vec![TileInstance::new(Prototile::Dart, Orientation::IDENTITY); 4];

        let all = growth_phase(&model, &mut Everything(proposal.clone()), 1.0, &mut rng).unwrap();
        assert_eq!(all.len(), 4);

        let none = growth_phase(&model, &mut Everything(proposal.clone()), 0.0, &mut rng).unwrap();
        assert!(none.is_empty());

        assert!(matches!(
            growth_phase(&model, &mut Everything(proposal), 1.5, &mut rng),
            Err(TilingError::InvalidProbability(_))
        ));
        assert!(
            growth_phase(&model, &mut NoGrowth, 0.5, &mut rng)
                .unwrap()
                .is_empty()
        );
    }
}
