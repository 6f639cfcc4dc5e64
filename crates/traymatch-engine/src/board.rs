//! The board: containers, items, occupancy, spawners, and the event bus.
//!
//! [`Board`] is the single owner of mutable game state. Async tasks share
//! it as a [`SharedBoard`] and only borrow it between suspension points.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crossbeam_channel::Receiver;
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::{debug, info, warn};
use traymatch_core::{Cell, Color, ContainerId, Footprint, GameEvent, ItemId, MoveError};
use traymatch_grid::{GridBounds, GridOccupancy, Occupant};
use traymatch_plan::{AllocationPlan, BlockedSpec, ContainerSpec};

use crate::container::{Container, Item};
use crate::events::EventBus;
use crate::level::{LevelError, LevelSpec, PlacementKind};
use crate::spawner::Spawner;

/// Board shared between the orchestrator and its exchange tasks.
pub type SharedBoard = Rc<RefCell<Board>>;

/// How far a container can slide in each direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveLimits {
    /// Cells toward −x.
    pub left: u32,
    /// Cells toward +x.
    pub right: u32,
    /// Cells toward +z.
    pub up: u32,
    /// Cells toward −z.
    pub down: u32,
}

/// Mutable game state.
#[derive(Debug)]
pub struct Board {
    bounds: GridBounds,
    occupancy: GridOccupancy,
    containers: IndexMap<ContainerId, Container>,
    spawners: Vec<Spawner>,
    next_item: u64,
    finished_count: u32,
    finished: VecDeque<ContainerId>,
    changed: IndexSet<ContainerId>,
    bus: EventBus,
}

impl Board {
    /// An empty board.
    pub fn new(bounds: GridBounds) -> Self {
        Self {
            bounds,
            occupancy: GridOccupancy::new(),
            containers: IndexMap::new(),
            spawners: Vec::new(),
            next_item: 0,
            finished_count: 0,
            finished: VecDeque::new(),
            changed: IndexSet::new(),
            bus: EventBus::new(),
        }
    }

    /// Build the board described by `level`, with every container empty.
    ///
    /// Placements get ids `0..n` in list order; spawner queues follow.
    pub fn from_level(level: &LevelSpec) -> Result<Self, LevelError> {
        let count = level.planned_count();
        if u32::try_from(count).is_err() {
            return Err(LevelError::TooManyContainers { count });
        }

        let bounds = GridBounds::new(level.width, level.depth, level.origin)?;
        let mut board = Self::new(bounds);

        for &cell in &level.walls {
            if !bounds.contains(cell) {
                return Err(LevelError::WallOutOfBounds { cell });
            }
            board.occupancy.add_wall(cell)?;
        }

        let mut next_id = 0u32;
        for placement in &level.placements {
            let id = ContainerId(next_id);
            next_id += 1;
            let mut container = Container::new(id, placement.shape.clone(), placement.anchor);
            match placement.kind {
                PlacementKind::Plain => {}
                PlacementKind::Directional(axis) => container = container.with_axis(axis),
                PlacementKind::Blocked { threshold } => container = container.gated(threshold),
            }
            board.place(container)?;
        }

        for (index, spec) in level.spawners.iter().enumerate() {
            if !bounds.contains(spec.cell) {
                return Err(LevelError::SpawnerOutOfBounds {
                    index,
                    cell: spec.cell,
                });
            }
            // A spawner blocks its own cell like a wall.
            board.occupancy.add_wall(spec.cell)?;
            let mut spawner = Spawner::new(spec.cell, spec.direction);
            for shape in &spec.queue {
                let id = ContainerId(next_id);
                next_id += 1;
                spawner.push(Container::new(id, shape.clone(), spec.cell));
            }
            board.spawners.push(spawner);
        }

        Ok(board)
    }

    /// Register `container` on the grid.
    pub fn place(&mut self, container: Container) -> Result<(), LevelError> {
        let cells = container.footprint();
        if let Some(&cell) = cells.iter().find(|c| !self.bounds.contains(**c)) {
            return Err(LevelError::PlacementOutOfBounds {
                container: container.id(),
                cell,
            });
        }
        self.occupancy.register(container.id(), &cells)?;
        self.containers.insert(container.id(), container);
        Ok(())
    }

    // ── Planning ───────────────────────────────────────────────────

    /// Planner inputs for every container the level will ever hold.
    pub fn planning_specs(&self) -> (Vec<ContainerSpec>, Vec<BlockedSpec>) {
        let queued = self.spawners.iter().flat_map(|s| s.queue_iter());
        let mut specs = Vec::new();
        let mut blocked = Vec::new();
        for c in self.containers.values().chain(queued) {
            specs.push(ContainerSpec::new(c.id(), c.shape().clone()));
            if let Some(threshold) = c.unlock_threshold() {
                blocked.push(BlockedSpec {
                    container: c.id(),
                    unlock_requirement: threshold,
                });
            }
        }
        (specs, blocked)
    }

    /// Hand out planned content.
    ///
    /// Unlocked board containers receive items now. Gated and queued
    /// containers keep their colors until they unlock or spawn.
    pub fn apply_plan(&mut self, plan: AllocationPlan) {
        for (id, colors) in plan.into_assignments() {
            if !self.assign(id, colors) {
                warn!(container = %id, "plan names a container not on the board");
            }
        }
    }

    /// Give `id` its content, following the same rules as
    /// [`apply_plan`](Board::apply_plan).
    ///
    /// Returns `false` if no placed or queued container has that id.
    pub fn assign(&mut self, id: ContainerId, colors: Vec<Color>) -> bool {
        match self.containers.get_mut(&id) {
            Some(c) if c.flags.locked => {
                c.withhold(colors);
                return true;
            }
            Some(_) => {
                self.dispense(id, colors);
                return true;
            }
            None => {}
        }
        let queued = self
            .spawners
            .iter_mut()
            .flat_map(|s| s.queue_mut())
            .find(|c| c.id() == id);
        match queued {
            Some(c) => {
                c.withhold(colors);
                true
            }
            None => false,
        }
    }

    /// Create items of `colors` inside `container`.
    pub fn dispense(&mut self, container: ContainerId, colors: Vec<Color>) {
        let Some(c) = self.containers.get_mut(&container) else {
            return;
        };
        for color in colors {
            let id = ItemId(self.next_item);
            self.next_item += 1;
            c.put_item(Item {
                id,
                color,
                owner: container,
            });
        }
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Board rectangle.
    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    /// Cell ownership.
    pub fn occupancy(&self) -> &GridOccupancy {
        &self.occupancy
    }

    /// Look up a container on the board, finished ones included.
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub(crate) fn container_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.containers.get_mut(&id)
    }

    /// Every container that has been on the board, in placement order.
    pub fn containers(&self) -> impl Iterator<Item = &Container> + '_ {
        self.containers.values()
    }

    /// Containers on the board and not yet finished.
    pub fn active(&self) -> impl Iterator<Item = &Container> + '_ {
        self.containers.values().filter(|c| c.flags.active)
    }

    /// Number of active containers.
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Containers still queued in spawners.
    pub fn queued_count(&self) -> usize {
        self.spawners.iter().map(Spawner::queued).sum()
    }

    /// Containers that must still finish for the level to be won.
    pub fn remaining(&self) -> usize {
        self.active_count() + self.queued_count()
    }

    /// Finish events published so far.
    pub fn finished_count(&self) -> u32 {
        self.finished_count
    }

    /// Spawners, in level order.
    pub fn spawners(&self) -> &[Spawner] {
        &self.spawners
    }

    /// Whether an exchange may start on `id` right now.
    pub fn is_exchange_eligible(&self, id: ContainerId) -> bool {
        self.containers.get(&id).is_some_and(Container::can_exchange)
            && self.occupancy.is_registered(id)
    }

    /// Distinct containers adjacent to `id`, in discovery order.
    pub fn neighbours(&self, id: ContainerId) -> Vec<ContainerId> {
        self.occupancy.neighbours(id)
    }

    /// Number of distinct containers adjacent to `id`.
    pub fn adjacent_count(&self, id: ContainerId) -> usize {
        self.occupancy.adjacent_count(id)
    }

    // ── Items ──────────────────────────────────────────────────────

    /// Move `item` from `from` to `to`, publishing `ItemRelocated`.
    ///
    /// Returns `false` without touching anything when either container is
    /// gone or finishing, or `from` no longer holds the item.
    pub fn relocate_item(&mut self, item: ItemId, from: ContainerId, to: ContainerId) -> bool {
        if from == to || !self.accepts_trade(to) {
            return false;
        }
        let Some(src) = self.containers.get_mut(&from) else {
            return false;
        };
        if !(src.flags.active && !src.flags.finishing) {
            return false;
        }
        let Some(moved) = src.take_item(item) else {
            return false;
        };
        let color = moved.color;
        if let Some(dst) = self.containers.get_mut(&to) {
            dst.put_item(moved);
        }
        self.changed.insert(from);
        self.changed.insert(to);
        self.bus.publish(GameEvent::ItemRelocated {
            item,
            from,
            to,
            color,
        });
        true
    }

    fn accepts_trade(&self, id: ContainerId) -> bool {
        self.containers
            .get(&id)
            .is_some_and(|c| c.flags.active && !c.flags.finishing)
    }

    /// Whether `container` holds `item`.
    pub fn holds(&self, container: ContainerId, item: ItemId) -> bool {
        self.containers.get(&container).is_some_and(|c| c.holds(item))
    }

    /// Containers whose content changed since the last call.
    pub fn take_changed(&mut self) -> IndexSet<ContainerId> {
        std::mem::take(&mut self.changed)
    }

    // ── Moves ──────────────────────────────────────────────────────

    /// Check a move without mutating anything, returning the target cells.
    pub fn validate_move(&self, id: ContainerId, target: Cell) -> Result<Footprint, MoveError> {
        let c = self
            .containers
            .get(&id)
            .ok_or(MoveError::UnknownContainer { container: id })?;
        if !c.flags.active || c.flags.finishing {
            return Err(MoveError::Inactive { container: id });
        }
        if c.flags.locked {
            return Err(MoveError::Locked { container: id });
        }
        if c.flags.swapping || c.flags.cascading {
            return Err(MoveError::Busy { container: id });
        }
        if c.anchor() == target {
            return Err(MoveError::NoDisplacement { container: id });
        }
        if let Some(axis) = c.axis() {
            if !axis.permits(c.anchor(), target) {
                return Err(MoveError::AxisViolation {
                    container: id,
                    axis,
                    from: c.anchor(),
                    to: target,
                });
            }
        }
        let cells = c.shape().footprint(target);
        for &cell in &cells {
            if !self.bounds.contains(cell) {
                return Err(MoveError::OutOfBounds {
                    container: id,
                    cell,
                });
            }
            match self.occupancy.occupant(cell) {
                Some(Occupant::Container(other)) if other != id => {
                    return Err(MoveError::Occupied {
                        container: id,
                        cell,
                        by: Some(other),
                    })
                }
                Some(Occupant::Wall) => {
                    return Err(MoveError::Occupied {
                        container: id,
                        cell,
                        by: None,
                    })
                }
                _ => {}
            }
        }
        Ok(cells)
    }

    /// Validate and commit a move, returning the previous anchor.
    ///
    /// On error the board is unchanged.
    pub fn try_move(&mut self, id: ContainerId, target: Cell) -> Result<Cell, MoveError> {
        let cells = self.validate_move(id, target)?;
        self.occupancy.relocate(id, &cells).map_err(|e| {
            warn!(container = %id, error = %e, "validated move rejected by occupancy");
            MoveError::Occupied {
                container: id,
                cell: target,
                by: None,
            }
        })?;
        let c = self
            .containers
            .get_mut(&id)
            .ok_or(MoveError::UnknownContainer { container: id })?;
        let from = c.anchor();
        c.set_anchor(target);
        self.bus.publish(GameEvent::ContainerMoved {
            container: id,
            from,
            to: target,
        });
        Ok(from)
    }

    /// How far `id` can slide each way before leaving the board or
    /// touching another occupant. `None` for unknown containers.
    pub fn move_limits(&self, id: ContainerId) -> Option<MoveLimits> {
        let c = self.containers.get(&id)?;
        if !c.flags.active || c.flags.locked || c.flags.finishing {
            return Some(MoveLimits::default());
        }
        let reach = |dx: i32, dz: i32| -> u32 {
            if let Some(axis) = c.axis() {
                if !axis.permits(c.anchor(), c.anchor().offset(dx, dz)) {
                    return 0;
                }
            }
            let max = self.bounds.width().max(self.bounds.depth());
            let mut steps = 0;
            while steps < max {
                let k = steps as i32 + 1;
                let anchor = c.anchor().offset(dx * k, dz * k);
                let clear = c.shape().footprint(anchor).iter().all(|&cell| {
                    self.bounds.contains(cell) && self.occupancy.is_available(cell, Some(id))
                });
                if !clear {
                    break;
                }
                steps += 1;
            }
            steps
        };
        Some(MoveLimits {
            left: reach(-1, 0),
            right: reach(1, 0),
            up: reach(0, 1),
            down: reach(0, -1),
        })
    }

    // ── Finishing and unlocking ────────────────────────────────────

    /// Mark `id` as finishing if it is complete and idle.
    ///
    /// A finishing container accepts no further trades.
    pub fn begin_finish(&mut self, id: ContainerId) -> bool {
        let Some(c) = self.containers.get_mut(&id) else {
            return false;
        };
        let f = c.flags;
        if !f.active || f.locked || f.swapping || f.finishing || !c.is_complete() {
            return false;
        }
        c.flags.finishing = true;
        true
    }

    /// Take a finishing container off the board and queue its finish event.
    pub fn complete_finish(&mut self, id: ContainerId) {
        let Some(c) = self.containers.get_mut(&id) else {
            return;
        };
        if !c.flags.active {
            return;
        }
        c.flags.active = false;
        self.occupancy.unregister(id);
        self.changed.shift_remove(&id);
        self.finished.push_back(id);
        debug!(container = %id, "container left the board");
    }

    /// Containers that left the board and await their finish event.
    pub fn take_finished(&mut self) -> Vec<ContainerId> {
        self.finished.drain(..).collect()
    }

    /// Whether nothing is in flight: no container on the board is mid-trade
    /// or finishing, and no finish event is waiting to be published.
    pub fn is_quiet(&self) -> bool {
        self.finished.is_empty()
            && self
                .active()
                .all(|c| !c.flags.swapping && !c.flags.finishing)
    }

    /// Publish the finish event of `id`, returning the new finish total.
    pub fn record_finish(&mut self, id: ContainerId) -> u32 {
        self.finished_count += 1;
        let total = self.finished_count;
        if let Some(c) = self.containers.get(&id) {
            let home = c.home();
            info!(container = %id, %home, total, "container finished");
            self.bus.publish(GameEvent::ContainerFinished {
                container: id,
                home,
                finished_total: total,
            });
        }
        total
    }

    /// Gated containers whose threshold has been reached.
    pub fn unlock_ready(&self) -> Vec<ContainerId> {
        self.active()
            .filter(|c| c.flags.locked)
            .filter(|c| c.unlock_threshold().unwrap_or(0) <= self.finished_count)
            .map(Container::id)
            .collect()
    }

    /// Unlock `id` and dispense its withheld content.
    pub fn unlock(&mut self, id: ContainerId) -> bool {
        let Some(c) = self.containers.get_mut(&id) else {
            return false;
        };
        if !c.flags.locked || !c.flags.active {
            return false;
        }
        c.flags.locked = false;
        let colors = c.take_withheld();
        self.dispense(id, colors);
        self.changed.insert(id);
        info!(container = %id, finished = self.finished_count, "container unlocked");
        self.bus.publish(GameEvent::ContainerUnlocked { container: id });
        true
    }

    // ── Spawners ───────────────────────────────────────────────────

    /// Let every spawner try to emit its next container.
    ///
    /// Returns the containers that landed.
    pub fn trigger_spawners(&mut self) -> Vec<ContainerId> {
        (0..self.spawners.len())
            .filter_map(|i| self.try_spawn_next(i))
            .collect()
    }

    /// Place the next queued container of spawner `index` at its emission
    /// anchor, if the whole rectangle there is in bounds and free.
    ///
    /// The container gets its withheld content on landing. Returns `None`
    /// when the spawner is unknown, empty, or blocked.
    pub fn try_spawn_next(&mut self, index: usize) -> Option<ContainerId> {
        let spawner = self.spawners.get(index)?;
        let anchor = spawner.next_anchor()?;
        let next = spawner.front()?;
        let rect = next.shape().bounding_cells(anchor);
        let clear = rect
            .iter()
            .all(|&cell| self.bounds.contains(cell) && self.occupancy.is_available(cell, None));
        if !clear {
            debug!(spawner = index, container = %next.id(), %anchor, "spawner blocked");
            return None;
        }

        let mut container = self.spawners[index].pop()?;
        container.set_anchor(anchor);
        let id = container.id();
        if let Err(e) = self.occupancy.register(id, &container.footprint()) {
            warn!(container = %id, error = %e, "spawn registration failed");
            self.spawners[index].unpop(container);
            return None;
        }
        let colors = container.take_withheld();
        self.containers.insert(id, container);
        self.dispense(id, colors);
        debug!(spawner = index, container = %id, %anchor, "container spawned");
        self.bus.publish(GameEvent::ContainerSpawned {
            container: id,
            anchor,
        });
        Some(id)
    }

    // ── Events ─────────────────────────────────────────────────────

    /// Register an event subscriber.
    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.bus.subscribe()
    }

    /// Publish `event` to every subscriber.
    pub fn publish(&mut self, event: GameEvent) {
        self.bus.publish(event);
    }
}

// ── BusyGuard ──────────────────────────────────────────────────────

/// Which busy bit a [`BusyGuard`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BusyFlag {
    Swapping,
    Cascading,
}

/// Sets a busy bit on a set of containers and clears it on drop.
///
/// Dropping covers every exit path, including a task torn down with its
/// runtime. Toggling needs a mutable borrow of the board, so no borrow may
/// be held when a guard is acquired or dropped; board borrows never span
/// an `.await`, which keeps that true for every task. A violation would
/// leave the bit stuck, so debug builds panic on it.
pub(crate) struct BusyGuard {
    board: SharedBoard,
    ids: SmallVec<[ContainerId; 2]>,
    flag: BusyFlag,
}

impl BusyGuard {
    /// Set `flag` on `ids`. The caller must not hold a borrow of `board`.
    pub(crate) fn acquire(board: &SharedBoard, ids: &[ContainerId], flag: BusyFlag) -> Self {
        let guard = Self {
            board: Rc::clone(board),
            ids: ids.iter().copied().collect(),
            flag,
        };
        guard.set(true);
        guard
    }

    fn set(&self, value: bool) {
        let Ok(mut board) = self.board.try_borrow_mut() else {
            warn!(flag = ?self.flag, "board borrowed while toggling busy flag");
            debug_assert!(
                std::thread::panicking(),
                "board borrowed while toggling {:?} flag",
                self.flag
            );
            return;
        };
        for &id in &self.ids {
            if let Some(c) = board.container_mut(id) {
                match self.flag {
                    BusyFlag::Swapping => c.flags.swapping = value,
                    BusyFlag::Cascading => c.flags.cascading = value,
                }
            }
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.set(false);
    }
}
