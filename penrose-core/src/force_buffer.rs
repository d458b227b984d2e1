use crate::types::NodeId;
use glam::DVec2;

/// Accumulates relaxation forces per node of one canonical edge.
///
/// For each `NodeId`, this buffer stores:
///
/// - The sum of all force vectors written for that node.
/// - The number of contributions that were added.
///
/// Every placement of a shared edge contributes separately, and the
/// **average** is what finally moves the canonical node.
#[derive(Clone, Debug, Default)]
pub struct ForceBuffer {
    sum: Vec<DVec2>,
    count: Vec<u32>,
}

impl ForceBuffer {
    /// Creates a buffer for `len` nodes with every entry zeroed.
    pub fn with_len(len: usize) -> Self {
        Self {
            sum: vec![DVec2::ZERO; len],
            count: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.sum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sum.is_empty()
    }

    /// Resizes to `len` entries and clears all of them, even when the
    /// length was already right.
    pub fn ensure_len(&mut self, len: usize) {
        if self.sum.len() != len {
            self.sum.resize(len, DVec2::ZERO);
            self.count.resize(len, 0);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.sum.fill(DVec2::ZERO);
        self.count.fill(0);
    }

    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn add(&mut self, id: NodeId, force: DVec2) {
        self.sum[id] += force;
        self.count[id] += 1;
    }

    /// Average force for `id`, or `DVec2::ZERO` if nothing was added.
    #[inline]
    pub fn avg(&self, id: NodeId) -> DVec2 {
        match self.count[id] {
            0 => DVec2::ZERO,
            c => self.sum[id] / f64::from(c),
        }
    }

    #[inline]
    pub fn count(&self, id: NodeId) -> u32 {
        self.count[id]
    }

    #[inline]
    pub fn is_touched(&self, id: NodeId) -> bool {
        self.count[id] > 0
    }

    pub fn touched_indices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.count
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| (c > 0).then_some(i))
    }

    /// ### Panics
    /// Panics if the two buffers have different lengths.
    pub fn merge_from(&mut self, other: &ForceBuffer) {
        assert_eq!(self.sum.len(), other.sum.len());
        for i in 0..self.sum.len() {
            self.sum[i] += other.sum[i];
            self.count[i] += other.count[i];
        }
    }
}
