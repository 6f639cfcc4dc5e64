//! Error types shared across the traymatch workspace.
//!
//! Planning and occupancy failures live next to their subsystems
//! (`traymatch-plan`, `traymatch-grid`); the types here cross crate
//! boundaries: shape validation and move rejection.

use std::error::Error;
use std::fmt;

use crate::event::GameState;
use crate::id::{Cell, ContainerId};
use crate::shape::Axis;

/// Errors from [`ContainerShape`](crate::ContainerShape) construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeError {
    /// A footprint dimension is zero.
    EmptyFootprint {
        /// Requested width.
        width: u32,
        /// Requested depth.
        depth: u32,
    },
    /// An excluded offset lies outside the footprint rectangle.
    ExcludedOutsideFootprint {
        /// The offending offset.
        offset: Cell,
        /// Footprint width.
        width: u32,
        /// Footprint depth.
        depth: u32,
    },
    /// Every unit cell of the footprint is excluded.
    FullyExcluded,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFootprint { width, depth } => {
                write!(f, "footprint {width}x{depth} has no cells")
            }
            Self::ExcludedOutsideFootprint {
                offset,
                width,
                depth,
            } => write!(
                f,
                "excluded offset {offset} lies outside {width}x{depth} footprint"
            ),
            Self::FullyExcluded => write!(f, "every footprint cell is excluded"),
        }
    }
}

impl Error for ShapeError {}

/// Why a requested container move was rejected.
///
/// Rejection happens at the validation boundary: when any of these is
/// returned, no board state, move budget, or cascade has been touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveError {
    /// The game is not accepting moves in its current state.
    NotPlaying {
        /// State at the time of the request.
        state: GameState,
    },
    /// No container with this id exists on the board.
    UnknownContainer {
        /// The requested container.
        container: ContainerId,
    },
    /// The container has finished or is finishing.
    Inactive {
        /// The requested container.
        container: ContainerId,
    },
    /// The container is gated and has not unlocked yet.
    Locked {
        /// The requested container.
        container: ContainerId,
    },
    /// The container is mid-exchange or mid-cascade.
    Busy {
        /// The requested container.
        container: ContainerId,
    },
    /// The target anchor equals the current anchor.
    NoDisplacement {
        /// The requested container.
        container: ContainerId,
    },
    /// The move leaves the container's permitted axis.
    AxisViolation {
        /// The requested container.
        container: ContainerId,
        /// The container's axis constraint.
        axis: Axis,
        /// Current anchor.
        from: Cell,
        /// Requested anchor.
        to: Cell,
    },
    /// A footprint cell would fall outside the board.
    OutOfBounds {
        /// The requested container.
        container: ContainerId,
        /// First footprint cell found outside the board.
        cell: Cell,
    },
    /// A footprint cell is owned by a wall or another container.
    Occupied {
        /// The requested container.
        container: ContainerId,
        /// First colliding cell.
        cell: Cell,
        /// The container owning the cell, or `None` for a wall.
        by: Option<ContainerId>,
    },
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPlaying { state } => write!(f, "moves not accepted while {state}"),
            Self::UnknownContainer { container } => write!(f, "unknown container {container}"),
            Self::Inactive { container } => write!(f, "container {container} is no longer active"),
            Self::Locked { container } => write!(f, "container {container} is locked"),
            Self::Busy { container } => write!(f, "container {container} is busy"),
            Self::NoDisplacement { container } => {
                write!(f, "container {container} is already at the target cell")
            }
            Self::AxisViolation {
                container,
                axis,
                from,
                to,
            } => write!(
                f,
                "container {container} is constrained to {axis:?} movement: {from} -> {to}"
            ),
            Self::OutOfBounds { container, cell } => {
                write!(f, "container {container} would leave the board at {cell}")
            }
            Self::Occupied {
                container,
                cell,
                by: Some(other),
            } => write!(f, "container {container} collides with {other} at {cell}"),
            Self::Occupied {
                container,
                cell,
                by: None,
            } => write!(f, "container {container} collides with a wall at {cell}"),
        }
    }
}

impl Error for MoveError {}
