//! One canonical edge seen through every placement that shares it.
//!
//! An [`EdgeIdentity`] borrows its identity line instead of storing copies,
//! so edits to the line are picked up by the next pass over the views.

use crate::{
    error::EdgeError,
    line::{LinkedLine, Node},
    orientation::{Orientation, OrientedView},
};

#[derive(Clone, Copy, Debug)]
pub struct EdgeIdentity<'a> {
    identity: &'a LinkedLine,
    orientations: &'a [Orientation],
}

impl<'a> EdgeIdentity<'a> {
    /// ### Errors
    /// [`EdgeError::NoOrientations`] if `orientations` is empty.
    pub fn new(
        identity: &'a LinkedLine,
        orientations: &'a [Orientation],
    ) -> Result<Self, EdgeError> {
        if orientations.is_empty() {
            return Err(EdgeError::NoOrientations);
        }
        Ok(Self {
            identity,
            orientations,
        })
    }

    /// For orientation lists known to be non-empty.
    pub(crate) fn from_parts(
        identity: &'a LinkedLine,
        orientations: &'a [Orientation],
    ) -> Self {
        debug_assert!(!orientations.is_empty());
        Self {
            identity,
            orientations,
        }
    }

    #[inline]
    pub fn identity(&self) -> &'a LinkedLine {
        self.identity
    }

    #[inline]
    pub fn orientations(&self) -> &'a [Orientation] {
        self.orientations
    }

    /// Number of positions along the identity line.
    #[inline]
    pub fn len(&self) -> usize {
        self.identity.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.identity.is_empty()
    }

    /// One tuple per identity position, holding the matching node of every
    /// placement in orientation order.
    pub fn iter(&self) -> Placements {
        Placements {
            views: self
                .orientations
                .iter()
                .map(|o| o.apply_to(self.identity))
                .collect(),
            position: 0,
        }
    }

    /// Every placement materialized as its own line, in orientation order.
    ///
    /// The copies keep the identity's arena layout, so a `NodeId` of the
    /// identity names the same position in each of them.
    pub fn views(&self) -> Vec<LinkedLine> {
        self.orientations
            .iter()
            .map(|o| o.transformed(self.identity))
            .collect()
    }
}

impl<'a> IntoIterator for &EdgeIdentity<'a> {
    type Item = Vec<Node>;
    type IntoIter = Placements;

    fn into_iter(self) -> Placements {
        self.iter()
    }
}

/// Zips the oriented views of an [`EdgeIdentity`] position by position.
#[derive(Debug)]
pub struct Placements {
    views: Vec<OrientedView>,
    position: usize,
}

impl Iterator for Placements {
    type Item = Vec<Node>;

    /// ### Panics
    /// Panics if the views run out at different positions. All views copy
    /// the same identity line, so this means the line's links are broken.
    fn next(&mut self) -> Option<Vec<Node>> {
        let tuple: Vec<Node> = self.views.iter_mut().filter_map(Iterator::next).collect();
        if tuple.is_empty() {
            return None;
        }
        if tuple.len() != self.views.len() {
            panic!(
                "{}",
                EdgeError::StructuralInconsistency {
                    position: self.position
                }
            );
        }
        self.position += 1;
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.views
            .first()
            .map_or((0, Some(0)), |v| v.size_hint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use std::f64::consts::PI;

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-12
    }

    fn scenario_orientations() -> Vec<Orientation> {
        vec![
            Orientation::default(),
            Orientation::new(PI, DVec2::ZERO),
            Orientation::new(0.0, DVec2::new(2.0, 3.0)),
        ]
    }

    #[test]
    fn tuples_line_up_across_placements() {
        let mut line = LinkedLine::new();
        line.add(0.0, 0.0);
        line.add(1.0, 0.0);
        let orientations = scenario_orientations();
        let edge = EdgeIdentity::new(&line, &orientations).unwrap();

        let tuples: Vec<Vec<Node>> = edge.iter().collect();
        assert_eq!(tuples.len(), 2);

        for (tuple, (_, canon)) in tuples.iter().zip(line.iter()) {
            assert_eq!(tuple.len(), 3);
            assert_eq!(tuple[0].pos, canon.pos);
            assert!(close(tuple[1].pos, -canon.pos));
            assert_eq!(tuple[2].pos, canon.pos + DVec2::new(2.0, 3.0));
        }
    }

    #[test]
    fn edits_to_identity_show_in_next_pass() {
        let mut line = LinkedLine::from_points([DVec2::ZERO, DVec2::X]);
        let orientations = scenario_orientations();

        let head = line.head().unwrap();
        line.set_pos(head, DVec2::new(0.0, 0.5)).unwrap();

        let edge = EdgeIdentity::new(&line, &orientations).unwrap();
        let first = edge.iter().next().unwrap();
        assert_eq!(first[0].pos, DVec2::new(0.0, 0.5));
        assert!(close(first[1].pos, DVec2::new(0.0, -0.5)));
        assert_eq!(first[2].pos, DVec2::new(2.0, 3.5));
    }

    #[test]
    fn subdivision_reaches_every_view() {
        let mut line = LinkedLine::from_points([DVec2::ZERO, DVec2::X]);
        line.adaptive_subdivision(0.3).unwrap();
        let orientations = scenario_orientations();
        let edge = EdgeIdentity::new(&line, &orientations).unwrap();

        assert_eq!(edge.len(), 5);
        assert_eq!(edge.iter().count(), 5);
        assert!(edge.iter().all(|t| t.len() == 3));
        assert!(edge.views().iter().all(|v| v.len() == 5));
    }

    #[test]
    fn views_share_arena_layout() {
        let mut line = LinkedLine::from_points([DVec2::ZERO, DVec2::X]);
        line.adaptive_subdivision(0.5).unwrap();
        let orientations = scenario_orientations();
        let edge = EdgeIdentity::new(&line, &orientations).unwrap();

        let ids: Vec<_> = line.iter().map(|(id, _)| id).collect();
        for view in edge.views() {
            assert_eq!(view.iter().map(|(id, _)| id).collect::<Vec<_>>(), ids);
        }
    }

    #[test]
    fn empty_orientation_list_is_rejected() {
        let line = LinkedLine::new();
        assert!(matches!(
            EdgeIdentity::new(&line, &[]),
            Err(EdgeError::NoOrientations)
        ));
    }

    #[test]
    fn empty_identity_yields_nothing() {
        let line = LinkedLine::new();
        let orientations = [Orientation::IDENTITY];
        let edge = EdgeIdentity::new(&line, &orientations).unwrap();
        assert!(edge.is_empty());
        assert_eq!(edge.iter().count(), 0);
    }
}
