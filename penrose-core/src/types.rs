use std::sync::atomic::{AtomicUsize, Ordering};

/// Identifier for a node in a [`crate::line::LinkedLine`].
///
/// This is an index into the line's node arena, and is only meaningful
/// within the lifetime of the line that issued it.
pub type NodeId = usize;

/// Identity of one [`crate::line::LinkedLine`].
///
/// Every line (including every clone of a line) gets a fresh id, so two
/// distinct lines never share one even when their geometry is equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(usize);

static NEXT_LINE_ID: AtomicUsize = AtomicUsize::new(0);

impl LineId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Object identity of a node: the line that owns it plus its arena index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub line: LineId,
    pub node: NodeId,
}
