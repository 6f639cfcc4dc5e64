//! Core types for the traymatch puzzle engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by every other crate in the workspace: colors, grid
//! cells, strongly-typed ids, container shapes, movement constraints, the
//! events the engine publishes, and the error types that cross crate
//! boundaries.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod color;
pub mod error;
pub mod event;
pub mod id;
pub mod shape;

pub use color::Color;
pub use error::{MoveError, ShapeError};
pub use event::{GameEvent, GameState};
pub use id::{Cell, ContainerId, ItemId};
pub use shape::{Axis, ContainerShape, Direction, Footprint, SLOT_SCALE};
