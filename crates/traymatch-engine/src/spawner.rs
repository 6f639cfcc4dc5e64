//! Container sources that feed the board as space frees up.

use std::collections::VecDeque;

use traymatch_core::{Cell, Direction};

use crate::container::Container;

/// An ordered queue of planned containers emitted on one side of a cell.
///
/// Queued containers are not on the board yet but already carry their
/// planned content, and they count as remaining for the win condition.
#[derive(Clone, Debug)]
pub struct Spawner {
    cell: Cell,
    direction: Direction,
    queue: VecDeque<Container>,
}

impl Spawner {
    /// An empty spawner at `cell` emitting toward `direction`.
    pub fn new(cell: Cell, direction: Direction) -> Self {
        Self {
            cell,
            direction,
            queue: VecDeque::new(),
        }
    }

    /// Cell the spawner occupies.
    pub fn cell(&self) -> Cell {
        self.cell
    }

    /// Emission side.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Containers still waiting to be emitted.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// The next container to emit.
    pub fn front(&self) -> Option<&Container> {
        self.queue.front()
    }

    /// Where the next container would land.
    pub fn next_anchor(&self) -> Option<Cell> {
        let next = self.queue.front()?;
        Some(
            self.direction
                .spawn_anchor(self.cell, next.shape().width(), next.shape().depth()),
        )
    }

    pub(crate) fn push(&mut self, container: Container) {
        self.queue.push_back(container);
    }

    pub(crate) fn pop(&mut self) -> Option<Container> {
        self.queue.pop_front()
    }

    pub(crate) fn unpop(&mut self, container: Container) {
        self.queue.push_front(container);
    }

    pub(crate) fn queue_iter(&self) -> impl Iterator<Item = &Container> + '_ {
        self.queue.iter()
    }

    pub(crate) fn queue_mut(&mut self) -> impl Iterator<Item = &mut Container> + '_ {
        self.queue.iter_mut()
    }
}
