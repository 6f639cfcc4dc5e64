//! Planner inputs.

use traymatch_core::{Color, ContainerId, ContainerShape};

/// A container to be filled by the planner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Identity; must be unique within one planning request.
    pub id: ContainerId,
    /// Footprint and home color.
    pub shape: ContainerShape,
}

impl ContainerSpec {
    /// Create a spec.
    pub fn new(id: ContainerId, shape: ContainerShape) -> Self {
        Self { id, shape }
    }

    /// Item slots of the container.
    pub fn capacity(&self) -> usize {
        self.shape.capacity()
    }

    /// Home color of the container.
    pub fn home(&self) -> Color {
        self.shape.home()
    }
}

/// A gated container and the finish count that unlocks it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockedSpec {
    /// The gated container; must also appear in the container list.
    pub container: ContainerId,
    /// Containers that must finish before this one unlocks.
    pub unlock_requirement: u32,
}
