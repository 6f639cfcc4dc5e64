//! Game states and the events published to presentation subscribers.

use std::fmt;

use crate::color::Color;
use crate::id::{Cell, ContainerId, ItemId};

/// Lifecycle state of a level.
///
/// `Won` and `Lost` are terminal. `Won` is sticky: once reached, later
/// evaluations can never move the game to `Lost`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameState {
    /// Level loaded, waiting for the game to start.
    WaitingToStart,
    /// Initial board is settling before play begins.
    Starting,
    /// Accepting moves.
    Playing,
    /// Play suspended by the player.
    Paused,
    /// Every planned container finished.
    Won,
    /// Out of moves, or no remaining pair can ever meet.
    Lost,
}

impl GameState {
    /// Whether the state is `Won` or `Lost`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WaitingToStart => "waiting to start",
            Self::Starting => "starting",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Won => "won",
            Self::Lost => "lost",
        };
        f.write_str(s)
    }
}

/// A discrete notification for animation, audio, and UI consumers.
///
/// The engine never depends on how these are consumed; subscribers that
/// stop listening are dropped from the bus automatically.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A container completed and left the board.
    ContainerFinished {
        /// The finished container.
        container: ContainerId,
        /// Its home color.
        home: Color,
        /// Total containers finished so far, including this one.
        finished_total: u32,
    },
    /// A gated container reached its threshold and unlocked.
    ContainerUnlocked {
        /// The unlocked container.
        container: ContainerId,
    },
    /// A spawner placed a new container on the board.
    ContainerSpawned {
        /// The new container.
        container: ContainerId,
        /// Where it landed.
        anchor: Cell,
    },
    /// A player move was committed.
    ContainerMoved {
        /// The moved container.
        container: ContainerId,
        /// Previous anchor.
        from: Cell,
        /// New anchor.
        to: Cell,
    },
    /// An item changed owner during an exchange.
    ItemRelocated {
        /// The item.
        item: ItemId,
        /// Previous owner.
        from: ContainerId,
        /// New owner.
        to: ContainerId,
        /// Item color.
        color: Color,
    },
    /// The remaining move budget changed.
    MovesChanged {
        /// Moves left.
        remaining: u32,
        /// Moves available at level start.
        budget: u32,
    },
    /// The finish streak changed.
    ComboChanged {
        /// Current streak length, 0 when the streak expired.
        count: u32,
    },
    /// The game moved between lifecycle states.
    StateChanged {
        /// Previous state.
        from: GameState,
        /// New state.
        to: GameState,
    },
}
