//! Error types for board construction and occupancy updates.

use std::fmt;

use traymatch_core::{Cell, ContainerId};

use crate::occupancy::Occupant;

/// Errors from [`GridBounds`](crate::GridBounds) construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// A board dimension is zero.
    EmptyGrid {
        /// Requested width.
        width: u32,
        /// Requested depth.
        depth: u32,
    },
    /// A board dimension does not fit the `i32` cell coordinates.
    DimensionTooLarge {
        /// Which dimension.
        name: &'static str,
        /// Requested value.
        value: u32,
        /// Maximum accepted value.
        max: u32,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { width, depth } => write!(f, "board {width}x{depth} has no cells"),
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "board {name} {value} exceeds maximum {max}")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Errors from registering or moving occupants.
///
/// Every failing operation leaves the occupancy map exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OccupancyError {
    /// A requested cell already belongs to another occupant.
    Collision {
        /// The container asking for the cell, or `None` for a wall.
        requester: Option<ContainerId>,
        /// The contested cell.
        cell: Cell,
        /// Its current owner.
        occupant: Occupant,
    },
    /// The container is already registered.
    AlreadyRegistered {
        /// The container.
        container: ContainerId,
    },
    /// The container is not registered.
    NotRegistered {
        /// The container.
        container: ContainerId,
    },
}

impl fmt::Display for OccupancyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collision {
                requester,
                cell,
                occupant,
            } => {
                match requester {
                    Some(id) => write!(f, "container {id}")?,
                    None => write!(f, "wall")?,
                }
                write!(f, " cannot claim {cell}: held by {occupant}")
            }
            Self::AlreadyRegistered { container } => {
                write!(f, "container {container} is already registered")
            }
            Self::NotRegistered { container } => {
                write!(f, "container {container} is not registered")
            }
        }
    }
}

impl std::error::Error for OccupancyError {}
