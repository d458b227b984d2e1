use crate::{line::LinkedLine, line::Node, types::NodeId};
use glam::DVec2;

/// A rigid placement: rotate about the origin by `rotation` radians, then
/// translate by `translation`.
///
/// [`Orientation::default`] is the identity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub rotation: f64,
    pub translation: DVec2,
}

impl Orientation {
    pub const IDENTITY: Self = Self {
        rotation: 0.0,
        translation: DVec2::ZERO,
    };

    pub fn new(rotation: f64, translation: DVec2) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_degrees(degrees: f64, translation: DVec2) -> Self {
        Self::new(degrees.to_radians(), translation)
    }

    #[inline]
    pub fn transform_point(&self, p: DVec2) -> DVec2 {
        DVec2::from_angle(self.rotation).rotate(p) + self.translation
    }

    #[inline]
    pub fn rotate_vector(&self, v: DVec2) -> DVec2 {
        DVec2::from_angle(self.rotation).rotate(v)
    }

    /// Maps a vector from the placed frame back into the canonical frame.
    #[inline]
    pub fn inverse_rotate_vector(&self, v: DVec2) -> DVec2 {
        DVec2::from_angle(-self.rotation).rotate(v)
    }

    /// The placement equivalent to applying `self` first, then `outer`.
    pub fn then(&self, outer: &Orientation) -> Orientation {
        Orientation {
            rotation: self.rotation + outer.rotation,
            translation: outer.transform_point(self.translation),
        }
    }

    /// A transformed deep copy of `line`. `line` itself is left untouched.
    pub fn transformed(&self, line: &LinkedLine) -> LinkedLine {
        let mut copy = line.clone();
        copy.rotate(self.rotation);
        copy.translate(self.translation);
        copy
    }

    /// Lazily walks a transformed copy of `line` from head to tail.
    ///
    /// Every call makes a fresh copy, so the views of two calls are
    /// independent of each other and of later edits to `line`.
    pub fn apply_to(&self, line: &LinkedLine) -> OrientedView {
        let copy = self.transformed(line);
        let cursor = copy.head();
        OrientedView {
            remaining: copy.len(),
            line: copy,
            cursor,
        }
    }
}

/// Iterator over the nodes of one transformed copy of a line.
#[derive(Debug)]
pub struct OrientedView {
    line: LinkedLine,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl OrientedView {
    /// The transformed copy this view walks.
    pub fn line(&self) -> &LinkedLine {
        &self.line
    }

    pub fn into_line(self) -> LinkedLine {
        self.line
    }
}

impl Iterator for OrientedView {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let id = self.cursor?;
        let node = *self.line.node(id)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for OrientedView {}
