//! The organic Penrose model: three canonical edges shared by kites and
//! darts, the tiles placed so far, and the relaxation lifecycle.
//!
//! Both prototiles are built from the same three edges. `e1` has length 1
//! and is the long side, `e2` and `e3` have length `1/φ`. Each prototile
//! lists where it puts every edge in its own frame; a placed tile composes
//! those placements with its own [`Orientation`].

use crate::{
    config::Config,
    edge_identity::EdgeIdentity,
    error::TilingError,
    force_buffer::ForceBuffer,
    line::LinkedLine,
    orientation::Orientation,
    phases::{self, Frame},
    strategy::{ForceLaw, GrowthRule, TileForces},
};
use glam::DVec2;
use rand::Rng;
use tracing::debug;

/// The golden ratio `(1 + √5) / 2`.
pub fn phi() -> f64 {
    (1.0 + 5f64.sqrt()) / 2.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prototile {
    Kite,
    Dart,
}

/// A prototile placed in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileInstance {
    pub prototile: Prototile,
    pub placement: Orientation,
}

impl TileInstance {
    pub fn new(prototile: Prototile, placement: Orientation) -> Self {
        Self {
            prototile,
            placement,
        }
    }
}

/// Kite in its own frame: vertices `(0,0)`, `(1,0)` and
/// `(cos 72°, ±sin 72°) / φ`.
fn kite_placements() -> [Vec<Orientation>; 3] {
    let apex = DVec2::new(1.0, 0.0);
    [
        vec![
            Orientation::from_degrees(180.0 - 36.0, apex),
            Orientation::from_degrees(-(180.0 - 36.0), apex),
        ],
        vec![Orientation::from_degrees(72.0, DVec2::ZERO)],
        vec![Orientation::from_degrees(-72.0, DVec2::ZERO)],
    ]
}

/// Upper wing of the dart, `(cos 72°, sin 36°)`. The lower wing mirrors it.
fn dart_wing() -> DVec2 {
    DVec2::new(72f64.to_radians().cos(), 36f64.to_radians().sin())
}

/// Dart in its own frame: every edge starts at a wing `(cos 72°, ±sin 36°)`.
/// The `e1` copies meet at the tip `(cos 72° + cos 36°, 0)` and the short
/// edges meet at the reflex vertex `(1/2, 0)`.
fn dart_placements() -> [Vec<Orientation>; 3] {
    let upper = dart_wing();
    let lower = DVec2::new(upper.x, -upper.y);
    [
        vec![
            Orientation::from_degrees(-36.0, upper),
            Orientation::from_degrees(36.0, lower),
        ],
        vec![Orientation::from_degrees(-72.0, upper)],
        vec![Orientation::from_degrees(72.0, lower)],
    ]
}

/// Organic kite/dart tiling over three shared, deformable edges.
///
/// Canonical edges are the only stored geometry. Every placed tile sees
/// them through [`EdgeIdentity`] views, so a correction written to an edge
/// shows up in every tile that uses it.
#[derive(Debug)]
pub struct TilingModel {
    cfg: Config,
    edges: [LinkedLine; 3],
    kite: [Vec<Orientation>; 3],
    dart: [Vec<Orientation>; 3],
    tiles: Vec<TileInstance>,
    forces: [ForceBuffer; 3],
}

impl TilingModel {
    pub fn new(cfg: Config) -> Self {
        let short = 1.0 / phi();
        let edges = [1.0, short, short]
            .map(|len| LinkedLine::from_points([DVec2::ZERO, DVec2::new(len, 0.0)]));
        let forces = std::array::from_fn(|s| ForceBuffer::with_len(edges[s].len()));

        Self {
            cfg,
            edges,
            kite: kite_placements(),
            dart: dart_placements(),
            tiles: Vec::new(),
            forces,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Canonical edge `e{slot + 1}`.
    ///
    /// ### Panics
    /// Panics if `slot >= 3`.
    pub fn edge(&self, slot: usize) -> &LinkedLine {
        &self.edges[slot]
    }

    pub fn edges(&self) -> &[LinkedLine; 3] {
        &self.edges
    }

    /// Mutable access for drivers that write corrections directly.
    pub fn edges_mut(&mut self) -> &mut [LinkedLine; 3] {
        &mut self.edges
    }

    /// Where `prototile` puts each edge in its own frame.
    pub fn prototile_placements(&self, prototile: Prototile) -> &[Vec<Orientation>; 3] {
        match prototile {
            Prototile::Kite => &self.kite,
            Prototile::Dart => &self.dart,
        }
    }

    /// The three edge identities of `prototile`, in its own frame.
    pub fn identities(&self, prototile: Prototile) -> [EdgeIdentity<'_>; 3] {
        let placements = self.prototile_placements(prototile);
        std::array::from_fn(|s| EdgeIdentity::from_parts(&self.edges[s], &placements[s]))
    }

    pub fn kite(&self) -> [EdgeIdentity<'_>; 3] {
        self.identities(Prototile::Kite)
    }

    pub fn dart(&self) -> [EdgeIdentity<'_>; 3] {
        self.identities(Prototile::Dart)
    }

    pub fn tiles(&self) -> &[TileInstance] {
        &self.tiles
    }

    /// Adds a tile and returns its index.
    pub fn place(&mut self, tile: TileInstance) -> usize {
        self.tiles.push(tile);
        self.tiles.len() - 1
    }

    /// World placements of edge `slot` for `tile`.
    pub fn placements(&self, tile: &TileInstance, slot: usize) -> Vec<Orientation> {
        self.prototile_placements(tile.prototile)[slot]
            .iter()
            .map(|o| o.then(&tile.placement))
            .collect()
    }

    /// Asks `rule` for candidate tiles and keeps each with `probability`.
    ///
    /// ### Returns
    /// The number of tiles added.
    pub fn grow(
        &mut self,
        probability: f64,
        rule: &mut dyn GrowthRule,
        rng: &mut impl Rng,
    ) -> Result<usize, TilingError> {
        let accepted = phases::growth_phase(self, rule, probability, rng)?;
        let added = accepted.len();
        self.tiles.extend(accepted);
        debug!(probability, added, tiles = self.tiles.len(), "grow");
        Ok(added)
    }

    /// Refines every canonical edge so no segment exceeds `max_dist`.
    ///
    /// Forces accumulated since the last [`TilingModel::update`] are
    /// dropped, as they no longer line up with the refined edges.
    ///
    /// ### Returns
    /// The number of inserted nodes over all edges.
    pub fn subdivide(&mut self, max_dist: f64) -> Result<usize, TilingError> {
        let mut inserted = 0;
        for (edge, buf) in self.edges.iter_mut().zip(&mut self.forces) {
            inserted += edge.adaptive_subdivision(max_dist)?;
            buf.ensure_len(edge.len());
        }
        debug!(max_dist, inserted, "subdivide");
        Ok(inserted)
    }

    /// [`TilingModel::subdivide`] with `Config::max_segment`.
    pub fn subdivide_default(&mut self) -> Result<usize, TilingError> {
        self.subdivide(self.cfg.max_segment)
    }

    /// Forces on kite `tile` of `frame`, checked against the tile's views.
    pub fn kite_forces(
        &self,
        law: &dyn ForceLaw,
        frame: &Frame,
        tile: usize,
    ) -> Result<TileForces, TilingError> {
        self.forces_for(law, frame, tile, Prototile::Kite)
    }

    /// Forces on dart `tile` of `frame`, checked against the tile's views.
    pub fn dart_forces(
        &self,
        law: &dyn ForceLaw,
        frame: &Frame,
        tile: usize,
    ) -> Result<TileForces, TilingError> {
        self.forces_for(law, frame, tile, Prototile::Dart)
    }

    /// Dispatches to [`TilingModel::kite_forces`] or
    /// [`TilingModel::dart_forces`] by the tile's prototile.
    pub fn tile_forces(
        &self,
        law: &dyn ForceLaw,
        frame: &Frame,
        tile: usize,
    ) -> Result<TileForces, TilingError> {
        match phases::prototile_of(frame, tile)? {
            Prototile::Kite => self.kite_forces(law, frame, tile),
            Prototile::Dart => self.dart_forces(law, frame, tile),
        }
    }

    fn forces_for(
        &self,
        law: &dyn ForceLaw,
        frame: &Frame,
        tile: usize,
        expected: Prototile,
    ) -> Result<TileForces, TilingError> {
        let edges = frame.tiles().get(tile).ok_or(TilingError::UnknownTile(tile))?;
        if edges.tile.prototile != expected {
            return Err(TilingError::PrototileMismatch { tile, expected });
        }

        let [l1, l2, l3] = &edges.views;
        let forces = match expected {
            Prototile::Kite => law.kite_forces(l1, l2, l3, frame),
            Prototile::Dart => law.dart_forces(l1, l2, l3, frame),
        };

        for (slot, (per_slot, views)) in forces.iter().zip(&edges.views).enumerate() {
            if per_slot.len() != views.len() {
                return Err(TilingError::PlacementCount {
                    slot,
                    expected: views.len(),
                    got: per_slot.len(),
                });
            }
            for (placement, (per_view, view)) in per_slot.iter().zip(views).enumerate() {
                if per_view.len() != view.len() {
                    return Err(TilingError::ForceShape {
                        slot,
                        placement,
                        expected: view.len(),
                        got: per_view.len(),
                    });
                }
            }
        }
        Ok(forces)
    }

    /// Materializes every placed tile, asks `law` for forces and adds them
    /// to the pending per-edge forces.
    ///
    /// Calling it more than once before [`TilingModel::update`] sums the
    /// contributions of each call.
    ///
    /// ### Returns
    /// The frame the forces were computed on.
    pub fn differentiate(&mut self, law: &dyn ForceLaw) -> Result<Frame, TilingError> {
        let frame = phases::materialize_phase(self, &self.cfg)?;
        let mut scratch: [ForceBuffer; 3] = Default::default();
        phases::force_phase(self, &frame, law, &mut scratch)?;

        for (pending, fresh) in self.forces.iter_mut().zip(&scratch) {
            if pending.len() != fresh.len() {
                pending.ensure_len(fresh.len());
            }
            pending.merge_from(fresh);
        }
        debug!(tiles = frame.tiles().len(), "differentiate");
        Ok(frame)
    }

    /// Applies the pending forces to the canonical edges and clears them.
    ///
    /// ### Returns
    /// The largest node displacement, which drivers can use as a
    /// convergence measure.
    pub fn update(&mut self) -> Result<f64, TilingError> {
        let max_step = phases::apply_phase(&mut self.edges, &self.forces, &self.cfg)?;
        for buf in &mut self.forces {
            buf.clear();
        }
        debug!(max_step, "update");
        Ok(max_step)
    }

    /// One full relaxation step: [`TilingModel::differentiate`] then
    /// [`TilingModel::update`].
    pub fn step(&mut self, law: &dyn ForceLaw) -> Result<f64, TilingError> {
        self.differentiate(law)?;
        self.update()
    }
}
