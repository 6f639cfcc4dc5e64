//! Strongly-typed identifiers and the [`Cell`] grid coordinate.

use std::fmt;
use std::ops::{Add, Sub};

/// Identifies a container ("tray") for the lifetime of a level.
///
/// Ids are assigned sequentially at level load in placement order
/// (static placements first, then spawner queues), so `ContainerId(n)`
/// is the n-th planned container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ContainerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a single item ("food").
///
/// Items keep their id when they move between containers, so relocation
/// events can be correlated by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// An integer cell on the board grid.
///
/// `x` grows to the right, `z` grows upward (away from the player). The
/// same type doubles as a footprint offset relative to a container anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub z: i32,
}

impl Cell {
    /// The origin cell / zero offset.
    pub const ZERO: Cell = Cell { x: 0, z: 0 };

    /// Create a cell from its column and row.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Shift this cell by `(dx, dz)`.
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// The four orthogonal neighbours, in left, right, up, down order.
    pub fn neighbours4(self) -> [Cell; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    /// Manhattan distance between two cells.
    pub fn manhattan(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.z.abs_diff(other.z)
    }
}

impl Add for Cell {
    type Output = Cell;

    fn add(self, rhs: Cell) -> Cell {
        self.offset(rhs.x, rhs.z)
    }
}

impl Sub for Cell {
    type Output = Cell;

    fn sub(self, rhs: Cell) -> Cell {
        self.offset(-rhs.x, -rhs.z)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
