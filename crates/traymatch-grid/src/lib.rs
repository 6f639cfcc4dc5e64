//! Board bounds and cell occupancy for the traymatch puzzle engine.
//!
//! [`GridOccupancy`] is the authoritative map from grid cell to its owner
//! (a wall or a container). It answers the adjacency and availability
//! questions asked by move validation, spawners, and the cascade engine.
//! [`GridBounds`] describes the playable rectangle.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bounds;
pub mod error;
pub mod occupancy;

pub use bounds::GridBounds;
pub use error::{GridError, OccupancyError};
pub use occupancy::{GridOccupancy, Occupant};
