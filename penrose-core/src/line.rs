use crate::{
    error::LineError,
    types::{LineId, NodeId},
};
use glam::DVec2;
use std::fmt;
use tracing::trace;

/// A point of a [`LinkedLine`] together with its links.
///
/// `next` and `prev` are arena indices into the owning line; `next` is
/// `None` at the tail, `prev` is `None` at the head.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub pos: DVec2,
    pub next: Option<NodeId>,
    pub prev: Option<NodeId>,
}

impl Node {
    pub fn new(pos: DVec2) -> Self {
        Self {
            pos,
            next: None,
            prev: None,
        }
    }

    #[inline]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.pos.x, self.pos.y)
    }
}

/// A mutable polyline stored as a doubly-linked list over a node arena.
///
/// Nodes are never removed, so every arena slot is reachable from `head`
/// and the traversal length always equals the number of stored nodes.
/// [`LinkedLine::add`] prepends: adding `P0, P1, .., PN` yields the
/// traversal `PN, .., P1, P0`.
///
/// A line is not safe for concurrent mutation; callers sharing one across
/// threads must synchronize externally.
#[derive(Debug)]
pub struct LinkedLine {
    id: LineId,
    nodes: Vec<Node>,
    head: Option<NodeId>,
}

impl Default for LinkedLine {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LinkedLine {
    /// Deep copy with a fresh [`LineId`]; the copy shares no identity with `self`.
    fn clone(&self) -> Self {
        Self {
            id: LineId::fresh(),
            nodes: self.nodes.clone(),
            head: self.head,
        }
    }
}

impl LinkedLine {
    pub fn new() -> Self {
        Self {
            id: LineId::fresh(),
            nodes: Vec::new(),
            head: None,
        }
    }

    /// Builds a line whose head-to-tail traversal matches `points`.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = DVec2>,
    {
        let points: Vec<DVec2> = points.into_iter().collect();
        let mut line = Self::new();
        for p in points.into_iter().rev() {
            line.add_pos(p);
        }
        line
    }

    #[inline]
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Prepends a node at `(x, y)` and returns its id.
    pub fn add(&mut self, x: f64, y: f64) -> NodeId {
        self.add_pos(DVec2::new(x, y))
    }

    pub fn add_pos(&mut self, pos: DVec2) -> NodeId {
        let id = self.nodes.len();
        let mut node = Node::new(pos);
        if let Some(old) = self.head {
            node.next = Some(old);
            self.nodes[old].prev = Some(id);
        }
        self.nodes.push(node);
        self.head = Some(id);
        id
    }

    #[inline]
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Id of the last node in traversal order. O(n).
    pub fn tail(&self) -> Option<NodeId> {
        self.iter().last().map(|(id, _)| id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn set_pos(&mut self, id: NodeId, pos: DVec2) -> Result<(), LineError> {
        let node = self.nodes.get_mut(id).ok_or(LineError::UnknownNode(id))?;
        node.pos = pos;
        Ok(())
    }

    /// Euclidean distance from node `id` to its successor.
    ///
    /// ### Errors
    /// [`LineError::InvalidTraversal`] if `id` is the tail.
    pub fn distance_to_next(&self, id: NodeId) -> Result<f64, LineError> {
        let node = self.nodes.get(id).ok_or(LineError::UnknownNode(id))?;
        let next = node.next.ok_or(LineError::InvalidTraversal(id))?;
        Ok(node.pos.distance(self.nodes[next].pos))
    }

    /// Head-to-tail traversal. Every call starts a fresh pass.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            line: self,
            cursor: self.head,
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.iter().map(|(_, n)| n.pos)
    }

    /// Id of the node at traversal position `n`. O(n).
    pub fn id_at(&self, n: usize) -> Result<NodeId, LineError> {
        self.iter()
            .nth(n)
            .map(|(id, _)| id)
            .ok_or(LineError::IndexOutOfRange {
                index: n,
                len: self.len(),
            })
    }

    pub fn get(&self, n: usize) -> Result<&Node, LineError> {
        let id = self.id_at(n)?;
        Ok(&self.nodes[id])
    }

    /// Splices a midpoint after every node whose segment to its successor
    /// is longer than `max_dist`, until no segment exceeds it.
    ///
    /// Running it again with the same or a larger threshold inserts
    /// nothing.
    ///
    /// ### Returns
    /// The number of inserted nodes.
    ///
    /// ### Errors
    /// - [`LineError::InvalidDistance`] unless `max_dist` is positive and finite.
    /// - [`LineError::Unrefinable`] when a segment longer than `max_dist` has
    ///   a non-finite length, or its midpoint rounds onto one of its ends.
    ///   Segments before it may already have been split.
    pub fn adaptive_subdivision(&mut self, max_dist: f64) -> Result<usize, LineError> {
        if !(max_dist > 0.0 && max_dist.is_finite()) {
            return Err(LineError::InvalidDistance(max_dist));
        }

        let mut inserted = 0;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            while let Some(next) = self.nodes[id].next {
                let a = self.nodes[id].pos;
                let b = self.nodes[next].pos;
                let dist = a.distance(b);
                if !dist.is_finite() {
                    return Err(LineError::Unrefinable(id));
                }
                if dist <= max_dist {
                    break;
                }
                let mid = (a + b) * 0.5;
                if mid == a || mid == b {
                    return Err(LineError::Unrefinable(id));
                }
                self.insert_after(id, mid);
                inserted += 1;
            }
            cursor = self.nodes[id].next;
        }

        debug_assert!(self.check_links().is_ok());
        trace!(line = ?self.id, max_dist, inserted, "adaptive subdivision");
        Ok(inserted)
    }

    fn insert_after(&mut self, id: NodeId, pos: DVec2) -> NodeId {
        let new_id = self.nodes.len();
        let next = self.nodes[id].next;
        self.nodes.push(Node {
            pos,
            next,
            prev: Some(id),
        });
        if let Some(next) = next {
            self.nodes[next].prev = Some(new_id);
        }
        self.nodes[id].next = Some(new_id);
        new_id
    }

    pub fn translate(&mut self, v: DVec2) {
        for node in &mut self.nodes {
            node.pos += v;
        }
    }

    /// Rotates every node about the origin by `angle` radians.
    pub fn rotate(&mut self, angle: f64) {
        let rot = DVec2::from_angle(angle);
        for node in &mut self.nodes {
            node.pos = rot.rotate(node.pos);
        }
    }

    /// Verifies link symmetry, acyclicity and that every arena slot is
    /// reachable from the head.
    ///
    /// ### Errors
    /// [`LineError::BrokenLinks`] naming the first offending node.
    pub fn check_links(&self) -> Result<(), LineError> {
        let Some(head) = self.head else {
            return if self.nodes.is_empty() {
                Ok(())
            } else {
                Err(LineError::BrokenLinks(0))
            };
        };
        if self.nodes[head].prev.is_some() {
            return Err(LineError::BrokenLinks(head));
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut cursor = Some(head);
        let mut count = 0;
        while let Some(id) = cursor {
            if seen[id] {
                return Err(LineError::BrokenLinks(id));
            }
            seen[id] = true;
            count += 1;
            if let Some(next) = self.nodes[id].next {
                if next >= self.nodes.len() || self.nodes[next].prev != Some(id) {
                    return Err(LineError::BrokenLinks(id));
                }
            }
            cursor = self.nodes[id].next;
        }

        match seen.iter().position(|s| !s) {
            Some(orphan) if count != self.nodes.len() => Err(LineError::BrokenLinks(orphan)),
            _ => Ok(()),
        }
    }
}

/// Prints the nodes head to tail as `(x,y)` pairs joined by ` -> `, with
/// each coordinate in `{:?}` form, e.g. `(1.0,0.0) -> (0.75,0.0)`. An
/// empty line prints nothing.
impl fmt::Display for LinkedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, node)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

/// Head-to-tail iterator over `(id, node)` pairs of a [`LinkedLine`].
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    line: &'a LinkedLine,
    cursor: Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = &self.line.nodes[id];
        self.cursor = node.next;
        Some((id, node))
    }
}

impl<'a> IntoIterator for &'a LinkedLine {
    type Item = (NodeId, &'a Node);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
