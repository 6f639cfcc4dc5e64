//! Authoritative cell → owner map.
//!
//! Each registered container owns one cell per non-excluded footprint
//! offset. Walls own single cells for the lifetime of the board. A cell
//! maps to at most one owner at any time; every mutating operation checks
//! the whole request before touching the map, so a rejected request has
//! no side effects.

use std::fmt;

use indexmap::IndexMap;
use traymatch_core::{Cell, ContainerId, Footprint};

use crate::error::OccupancyError;

/// Owner of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    /// A permanent obstacle.
    Wall,
    /// A registered container.
    Container(ContainerId),
}

impl fmt::Display for Occupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wall => f.write_str("wall"),
            Self::Container(id) => write!(f, "container {id}"),
        }
    }
}

/// Map from grid cell to the wall or container occupying it.
///
/// Mutated only by registration, unregistration, and relocation (pickup,
/// drop, spawn, finish). Read-only during scoring and adjacency lookup.
#[derive(Clone, Debug, Default)]
pub struct GridOccupancy {
    cells: IndexMap<Cell, Occupant>,
    footprints: IndexMap<ContainerId, Footprint>,
}

impl GridOccupancy {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a wall on `cell`.
    ///
    /// Adding a wall twice on the same cell is a no-op.
    pub fn add_wall(&mut self, cell: Cell) -> Result<(), OccupancyError> {
        match self.cells.get(&cell) {
            None => {
                self.cells.insert(cell, Occupant::Wall);
                Ok(())
            }
            Some(Occupant::Wall) => Ok(()),
            Some(&occupant) => Err(OccupancyError::Collision {
                requester: None,
                cell,
                occupant,
            }),
        }
    }

    /// Register `container` on `cells`.
    ///
    /// Fails without mutation if the container is already registered or
    /// any cell is owned by someone else.
    pub fn register(
        &mut self,
        container: ContainerId,
        cells: &[Cell],
    ) -> Result<(), OccupancyError> {
        if self.footprints.contains_key(&container) {
            return Err(OccupancyError::AlreadyRegistered { container });
        }
        self.check_claim(container, cells)?;
        for &cell in cells {
            self.cells.insert(cell, Occupant::Container(container));
        }
        self.footprints.insert(container, cells.iter().copied().collect());
        Ok(())
    }

    /// Release every cell owned by `container`, returning them.
    pub fn unregister(&mut self, container: ContainerId) -> Option<Footprint> {
        let footprint = self.footprints.shift_remove(&container)?;
        for cell in &footprint {
            self.cells.swap_remove(cell);
        }
        Some(footprint)
    }

    /// Atomically move `container` onto `cells`.
    ///
    /// On collision the container keeps its previous cells.
    pub fn relocate(
        &mut self,
        container: ContainerId,
        cells: &[Cell],
    ) -> Result<(), OccupancyError> {
        if !self.footprints.contains_key(&container) {
            return Err(OccupancyError::NotRegistered { container });
        }
        self.check_claim(container, cells)?;
        if let Some(old) = self.footprints.get(&container) {
            for cell in old.iter() {
                self.cells.swap_remove(cell);
            }
        }
        for &cell in cells {
            self.cells.insert(cell, Occupant::Container(container));
        }
        self.footprints.insert(container, cells.iter().copied().collect());
        Ok(())
    }

    fn check_claim(&self, container: ContainerId, cells: &[Cell]) -> Result<(), OccupancyError> {
        for &cell in cells {
            if let Some(&occupant) = self.cells.get(&cell) {
                if occupant != Occupant::Container(container) {
                    return Err(OccupancyError::Collision {
                        requester: Some(container),
                        cell,
                        occupant,
                    });
                }
            }
        }
        Ok(())
    }

    /// Owner of `cell`, if any.
    pub fn occupant(&self, cell: Cell) -> Option<Occupant> {
        self.cells.get(&cell).copied()
    }

    /// Container owning `cell`, if any.
    pub fn container_at(&self, cell: Cell) -> Option<ContainerId> {
        match self.cells.get(&cell) {
            Some(Occupant::Container(id)) => Some(*id),
            _ => None,
        }
    }

    /// Whether `cell` is free, or owned by `requester` itself.
    pub fn is_available(&self, cell: Cell, requester: Option<ContainerId>) -> bool {
        match self.cells.get(&cell) {
            None => true,
            Some(Occupant::Container(id)) => Some(*id) == requester,
            Some(Occupant::Wall) => false,
        }
    }

    /// Cells currently owned by `container`.
    pub fn cells_of(&self, container: ContainerId) -> Option<&[Cell]> {
        self.footprints.get(&container).map(|f| f.as_slice())
    }

    /// Whether `container` is registered.
    pub fn is_registered(&self, container: ContainerId) -> bool {
        self.footprints.contains_key(&container)
    }

    /// Registered containers, in registration order.
    pub fn containers(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.footprints.keys().copied()
    }

    /// Number of registered containers.
    pub fn container_count(&self) -> usize {
        self.footprints.len()
    }

    /// Distinct containers orthogonally adjacent to `container`.
    ///
    /// Order is discovery order: footprint cells in registration order,
    /// each probed left, right, up, down. Walls are never neighbours.
    pub fn neighbours(&self, container: ContainerId) -> Vec<ContainerId> {
        let mut out = Vec::new();
        let Some(cells) = self.footprints.get(&container) else {
            return out;
        };
        for cell in cells {
            for probe in cell.neighbours4() {
                if let Some(other) = self.container_at(probe) {
                    if other != container && !out.contains(&other) {
                        out.push(other);
                    }
                }
            }
        }
        out
    }

    /// Number of distinct containers adjacent to `container`.
    pub fn adjacent_count(&self, container: ContainerId) -> usize {
        self.neighbours(container).len()
    }
}
