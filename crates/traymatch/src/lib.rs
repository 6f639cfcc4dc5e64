//! traymatch: the decision core of a grid container-matching puzzle.
//!
//! Containers sit on a grid holding colored items. Moving one container
//! next to others starts chains of item exchanges; containers whose items
//! all match their home color finish and leave the board, gated containers
//! unlock, spawners emit new containers, and the level is eventually won or
//! lost.
//!
//! This is the facade crate that re-exports the public API from all
//! traymatch sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use traymatch::prelude::*;
//!
//! // A Red and a Blue container side by side on a 6 × 1 strip.
//! let red = ContainerShape::new(1, 1, Color::Red).unwrap();
//! let blue = ContainerShape::new(1, 1, Color::Blue).unwrap();
//! let level = LevelSpec::new(6, 1, 10)
//!     .with_placement(Placement::plain(red, Cell::new(-3, 0)))
//!     .with_placement(Placement::plain(blue, Cell::new(-2, 0)));
//!
//! // Authored content; `Game::load` would plan it at random instead.
//! let mut board = Board::from_level(&level).unwrap();
//! board.assign(ContainerId(0), vec![Color::Red, Color::Blue, Color::Red, Color::Blue]);
//! board.assign(ContainerId(1), vec![Color::Blue, Color::Red, Color::Blue, Color::Red]);
//!
//! let mut config = GameConfig::default();
//! config.exchange.trade_interval = Duration::ZERO;
//! config.timing.finish_settle = Duration::ZERO;
//! config.timing.finish_spacing = Duration::ZERO;
//! config.timing.start_delay = Duration::ZERO;
//! let mut game = Game::from_board(board, level.move_budget, config).unwrap();
//!
//! // Exchanges run as local tasks on a current-thread runtime.
//! let rt = tokio::runtime::Builder::new_current_thread()
//!     .enable_time()
//!     .build()
//!     .unwrap();
//! let report = tokio::task::LocalSet::new().block_on(&rt, game.start());
//! assert_eq!(report.finished.len(), 2);
//! assert_eq!(game.state(), GameState::Won);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `traymatch-core` | Colors, ids, cells, shapes, events, errors |
//! | [`grid`] | `traymatch-grid` | Board bounds and cell occupancy |
//! | [`plan`] | `traymatch-plan` | Random content allocation |
//! | [`engine`] | `traymatch-engine` | Board, exchanges, cascades, outcome, game loop |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, ids, and errors (`traymatch-core`).
pub use traymatch_core as types;

/// Board bounds and cell occupancy (`traymatch-grid`).
///
/// [`grid::GridOccupancy`] answers every adjacency and availability
/// question asked by moves, spawners, and cascades.
pub use traymatch_grid as grid;

/// Retry-bounded content allocation (`traymatch-plan`).
pub use traymatch_plan as plan;

/// The puzzle-resolution engine (`traymatch-engine`).
///
/// [`engine::Game`] drives a level; [`engine::CascadeEngine`],
/// [`engine::ExchangeResolver`], and [`engine::OutcomeEvaluator`] are the
/// pieces it is built from.
pub use traymatch_engine as engine;

/// Common imports for typical traymatch usage.
///
/// ```rust
/// use traymatch::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use traymatch_core::{
        Axis, Cell, Color, ContainerId, ContainerShape, Direction, GameEvent, GameState, ItemId,
    };

    // Errors
    pub use traymatch_core::{MoveError, ShapeError};
    pub use traymatch_engine::{ConfigError, LevelError, LoadError};
    pub use traymatch_plan::PlanError;

    // Planning
    pub use traymatch_plan::{AllocationPlan, AllocationPlanner, PlannerConfig};

    // Engine
    pub use traymatch_engine::{
        Board, Game, GameConfig, LevelSpec, MoveLimits, MoveReport, Placement, PlacementKind,
        SettleReport, SpawnerSpec,
    };
}
