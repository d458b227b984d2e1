//! Shared-edge relaxation core for organic kite/dart Penrose tilings.
//!
//! Main components:
//! - [`line`]: mutable doubly-linked polylines with adaptive refinement.
//! - [`grid`]: uniform spatial hash for neighbourhood queries.
//! - [`orientation`]: rigid placements and transformed line views.
//! - [`edge_identity`]: one canonical edge seen through all its placements.
//! - [`tiling`]: the kite/dart model and its growth and relaxation lifecycle.
//! - [`phases`]: the individual steps of growth and relaxation.
//! - [`strategy`]: force law and growth rule supplied by the driver.
//! - [`force_buffer`]: per-node force accumulation.
//! - [`config`]: tunables for the model.
//! - [`error`]: error types.
//! - [`types`]: shared ids.

pub mod config;
pub mod edge_identity;
pub mod error;
pub mod force_buffer;
pub mod grid;
pub mod line;
pub mod orientation;
pub mod phases;
pub mod strategy;
pub mod tiling;
pub mod types;
