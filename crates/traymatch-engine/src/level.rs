//! Declarative level description and its validation errors.
//!
//! A [`LevelSpec`] is the in-memory form of one authored map. Container
//! ids are assigned at load: placements first, in list order, then every
//! spawner queue, spawner by spawner.

use std::error::Error;
use std::fmt;

use traymatch_core::{Axis, Cell, ContainerId, ContainerShape, Direction};
use traymatch_grid::{GridError, OccupancyError};

/// How a placed container behaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlacementKind {
    /// Moves freely, exchanges from the start.
    #[default]
    Plain,
    /// Moves only along one axis.
    Directional(Axis),
    /// Locked, empty, and immovable until `threshold` containers finish.
    Blocked {
        /// Finish count that unlocks the container.
        threshold: u32,
    },
}

/// A container present on the board when the level loads.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Footprint and home color.
    pub shape: ContainerShape,
    /// Lower-left footprint cell.
    pub anchor: Cell,
    /// Movement and gating behavior.
    pub kind: PlacementKind,
}

impl Placement {
    /// A plain container at `anchor`.
    pub fn plain(shape: ContainerShape, anchor: Cell) -> Self {
        Self {
            shape,
            anchor,
            kind: PlacementKind::Plain,
        }
    }

    /// An axis-constrained container at `anchor`.
    pub fn directional(shape: ContainerShape, anchor: Cell, axis: Axis) -> Self {
        Self {
            shape,
            anchor,
            kind: PlacementKind::Directional(axis),
        }
    }

    /// A gated container at `anchor`.
    pub fn blocked(shape: ContainerShape, anchor: Cell, threshold: u32) -> Self {
        Self {
            shape,
            anchor,
            kind: PlacementKind::Blocked { threshold },
        }
    }
}

/// A source that emits queued containers onto the board.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnerSpec {
    /// Cell the spawner occupies. It blocks moves like a wall.
    pub cell: Cell,
    /// Side the containers are emitted on.
    pub direction: Direction,
    /// Containers to emit, in order.
    pub queue: Vec<ContainerShape>,
}

/// One authored map.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelSpec {
    /// Board width in cells.
    pub width: u32,
    /// Board depth in cells.
    pub depth: u32,
    /// Board centre cell.
    pub origin: Cell,
    /// Permanently blocked cells.
    pub walls: Vec<Cell>,
    /// Moves available to the player.
    pub move_budget: u32,
    /// Containers on the board at load.
    pub placements: Vec<Placement>,
    /// Container sources.
    pub spawners: Vec<SpawnerSpec>,
}

impl LevelSpec {
    /// An empty `width × depth` level centred on the origin.
    pub fn new(width: u32, depth: u32, move_budget: u32) -> Self {
        Self {
            width,
            depth,
            origin: Cell::ZERO,
            walls: Vec::new(),
            move_budget,
            placements: Vec::new(),
            spawners: Vec::new(),
        }
    }

    /// Append a placement.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placements.push(placement);
        self
    }

    /// Append a wall.
    pub fn with_wall(mut self, cell: Cell) -> Self {
        self.walls.push(cell);
        self
    }

    /// Append a spawner.
    pub fn with_spawner(mut self, spawner: SpawnerSpec) -> Self {
        self.spawners.push(spawner);
        self
    }

    /// Total containers the level will ever hold.
    pub fn planned_count(&self) -> usize {
        self.placements.len() + self.spawners.iter().map(|s| s.queue.len()).sum::<usize>()
    }
}

/// Errors detected while building a board from a [`LevelSpec`].
#[derive(Debug, PartialEq)]
pub enum LevelError {
    /// The board dimensions are unusable.
    Grid(GridError),
    /// A wall lies outside the board.
    WallOutOfBounds {
        /// The wall cell.
        cell: Cell,
    },
    /// A spawner lies outside the board.
    SpawnerOutOfBounds {
        /// Index into [`LevelSpec::spawners`].
        index: usize,
        /// The spawner cell.
        cell: Cell,
    },
    /// A placed container does not fit on the board.
    PlacementOutOfBounds {
        /// The container id it was assigned.
        container: ContainerId,
        /// First footprint cell outside the board.
        cell: Cell,
    },
    /// Two occupants claim the same cell.
    Overlap(OccupancyError),
    /// The level holds more containers than ids can address.
    TooManyContainers {
        /// Containers requested.
        count: usize,
    },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::WallOutOfBounds { cell } => write!(f, "wall at {cell} is off the board"),
            Self::SpawnerOutOfBounds { index, cell } => {
                write!(f, "spawner {index} at {cell} is off the board")
            }
            Self::PlacementOutOfBounds { container, cell } => {
                write!(f, "container {container} leaves the board at {cell}")
            }
            Self::Overlap(e) => write!(f, "overlap: {e}"),
            Self::TooManyContainers { count } => {
                write!(f, "{count} containers exceed the id space")
            }
        }
    }
}

impl Error for LevelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Overlap(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for LevelError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<OccupancyError> for LevelError {
    fn from(e: OccupancyError) -> Self {
        Self::Overlap(e)
    }
}
