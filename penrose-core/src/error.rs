use crate::{tiling::Prototile, types::NodeId};
use thiserror::Error;

/// Precondition failures on a [`crate::line::LinkedLine`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LineError {
    #[error("node {0} has no successor")]
    InvalidTraversal(NodeId),
    #[error("index {index} out of range for line of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("unknown node id {0}")]
    UnknownNode(NodeId),
    #[error("subdivision threshold must be positive and finite, got {0}")]
    InvalidDistance(f64),
    #[error("broken links at node {0}")]
    BrokenLinks(NodeId),
    #[error("segment after node {0} cannot be split any further")]
    Unrefinable(NodeId),
}

/// Failures building or walking an [`crate::edge_identity::EdgeIdentity`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EdgeError {
    #[error("an edge identity needs at least one orientation")]
    NoOrientations,
    #[error("views disagree in length at position {position}")]
    StructuralInconsistency { position: usize },
}

/// Failures of the tiling lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TilingError {
    #[error("growth probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error(
        "force law returned {got} vectors for edge {slot} placement {placement}, \
         expected {expected}"
    )]
    ForceShape {
        slot: usize,
        placement: usize,
        expected: usize,
        got: usize,
    },
    #[error("force law returned {got} placements for edge {slot}, expected {expected}")]
    PlacementCount {
        slot: usize,
        expected: usize,
        got: usize,
    },
    #[error("grid cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),
    #[error("no tile with index {0}")]
    UnknownTile(usize),
    #[error("tile {tile} is not a {expected:?}")]
    PrototileMismatch { tile: usize, expected: Prototile },
    #[error(transparent)]
    Line(#[from] LineError),
    #[error(transparent)]
    Edge(#[from] EdgeError),
}
