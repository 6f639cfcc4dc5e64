//! Cascade, exchange, and outcome engine for traymatch levels.
//!
//! Provides the [`Game`] orchestrator that loads a level, allocates its
//! content, and turns every committed player move into exchange cascades
//! over the container adjacency graph, finish events, unlocks, spawns, and
//! eventually a win or a loss.
//!
//! The engine is single-threaded and asynchronous: exchanges animate item
//! by item, so they run as local tasks on a current-thread tokio runtime
//! and share the board through a [`SharedBoard`]. Drive a [`Game`] from
//! inside a [`LocalSet`](tokio::task::LocalSet).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod board;
pub mod cascade;
pub mod combo;
pub mod config;
pub mod container;
pub mod error;
pub mod events;
pub mod exchange;
pub mod game;
pub mod level;
pub mod outcome;
pub mod spawner;

pub use board::{Board, MoveLimits, SharedBoard};
pub use cascade::{priority_score, CascadeEngine, CascadeSession, SessionPhase, SessionReport};
pub use combo::ComboTracker;
pub use config::{ConfigError, ExchangeConfig, GameConfig, TimingConfig};
pub use container::{Container, ContainerFlags, Item};
pub use error::LoadError;
pub use events::EventBus;
pub use exchange::{
    plan_exchange, ExchangeOutcome, ExchangeResolver, ExchangeSet, Trade, TradeKind,
};
pub use game::{Game, MoveReport, SettleReport};
pub use level::{LevelError, LevelSpec, Placement, PlacementKind, SpawnerSpec};
pub use outcome::{next_state, LoseReason, OutcomeEvaluator, Verdict};
pub use spawner::Spawner;
