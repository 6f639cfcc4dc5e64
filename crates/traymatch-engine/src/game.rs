//! Level orchestration: loading, the state machine, moves, and settling.
//!
//! [`Game`] owns one level. It validates and commits player moves, runs
//! the resulting cascades to quiescence, sequences finish events, unlocks
//! gated containers, feeds spawners, and decides win or loss.
//!
//! Cascades spawn local tasks, so every async method here must be polled
//! inside a [`LocalSet`](tokio::task::LocalSet) on a current-thread
//! runtime.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crossbeam_channel::Receiver;
use rand::Rng;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use traymatch_core::{Cell, ContainerId, GameEvent, GameState, MoveError};
use traymatch_plan::AllocationPlanner;

use crate::board::{Board, MoveLimits, SharedBoard};
use crate::cascade::{CascadeEngine, SessionReport};
use crate::combo::ComboTracker;
use crate::config::GameConfig;
use crate::error::LoadError;
use crate::exchange::ExchangeResolver;
use crate::level::LevelSpec;
use crate::outcome::{next_state, OutcomeEvaluator, Verdict};

/// What one settle pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettleReport {
    /// Cascade sessions run.
    pub sessions: usize,
    /// Layers dispatched across all sessions.
    pub layers: usize,
    /// Trades landed across all sessions.
    pub trades: usize,
    /// Layers abandoned on the drain timeout.
    pub stalled_layers: usize,
    /// Containers whose finish event was published, in order.
    pub finished: Vec<ContainerId>,
    /// Gated containers unlocked.
    pub unlocked: Vec<ContainerId>,
    /// Containers emitted by spawners.
    pub spawned: Vec<ContainerId>,
    /// Whether the session bound cut follow-up cascades short.
    pub truncated: bool,
}

impl SettleReport {
    fn absorb(&mut self, session: &SessionReport) {
        self.sessions += 1;
        self.layers += session.layers;
        self.trades += session.trades;
        self.stalled_layers += session.stalled_layers;
    }
}

/// Result of a committed move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveReport {
    /// Anchor before the move.
    pub from: Cell,
    /// Anchor after the move.
    pub to: Cell,
    /// Moves left after this one.
    pub moves_remaining: u32,
    /// What the follow-up settle did.
    pub settle: SettleReport,
    /// Game state once everything settled.
    pub state: GameState,
}

/// One running level.
pub struct Game {
    board: SharedBoard,
    config: GameConfig,
    cascade: CascadeEngine,
    outcome: OutcomeEvaluator,
    combo: ComboTracker,
    state: GameState,
    paused_from: Option<GameState>,
    move_budget: u32,
    moves_remaining: u32,
    pending: VecDeque<ContainerId>,
    last_finish: Option<Instant>,
}

impl Game {
    /// Build the board for `level` and allocate every container's content.
    ///
    /// # Errors
    ///
    /// [`LoadError::Plan`] when the planner exhausts its retries; the level
    /// must not be started and the caller decides whether to regenerate it.
    pub fn load<R: Rng + ?Sized>(
        level: &LevelSpec,
        config: GameConfig,
        rng: &mut R,
    ) -> Result<Self, LoadError> {
        config.validate()?;
        let mut board = Board::from_level(level)?;
        let (specs, blocked) = board.planning_specs();
        let plan = AllocationPlanner::new(config.planner.clone()).plan(&specs, &blocked, rng)?;
        info!(
            containers = specs.len(),
            gated = blocked.len(),
            attempts = plan.attempts(),
            "level loaded"
        );
        board.apply_plan(plan);
        Ok(Self::assemble(board, level.move_budget, config))
    }

    /// Wrap a board whose content is already assigned.
    ///
    /// For authored or replayed layouts that bypass the planner. The board
    /// is used as is; no allocation invariants are checked.
    pub fn from_board(
        board: Board,
        move_budget: u32,
        config: GameConfig,
    ) -> Result<Self, LoadError> {
        config.validate()?;
        Ok(Self::assemble(board, move_budget, config))
    }

    fn assemble(board: Board, move_budget: u32, config: GameConfig) -> Self {
        let outcome = OutcomeEvaluator::new(config.timing.finish_settle, config.reach_distance);
        let cascade = CascadeEngine::new(
            ExchangeResolver::new(config.exchange.clone()),
            outcome.clone(),
            config.timing.drain_timeout,
        );
        Self {
            board: Rc::new(RefCell::new(board)),
            combo: ComboTracker::new(config.timing.combo_window),
            cascade,
            outcome,
            state: GameState::WaitingToStart,
            paused_from: None,
            move_budget,
            moves_remaining: move_budget,
            pending: VecDeque::new(),
            last_finish: None,
            config,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// Current lifecycle state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Moves left.
    pub fn moves_remaining(&self) -> u32 {
        self.moves_remaining
    }

    /// Moves available at level start.
    pub fn move_budget(&self) -> u32 {
        self.move_budget
    }

    /// Current finish streak.
    pub fn combo(&self) -> u32 {
        self.combo.count()
    }

    /// The active configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Read access to the board.
    ///
    /// Do not hold the guard across an `.await` on this game.
    pub fn board(&self) -> Ref<'_, Board> {
        self.board.borrow()
    }

    /// How far `container` can slide each way.
    pub fn move_limits(&self, container: ContainerId) -> Option<MoveLimits> {
        self.board.borrow().move_limits(container)
    }

    /// Register an event subscriber. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> Receiver<GameEvent> {
        self.board.borrow_mut().subscribe()
    }

    // ── State machine ──────────────────────────────────────────────

    /// Settle the freshly dispensed board, then begin play.
    ///
    /// Does nothing unless the game is waiting to start.
    pub async fn start(&mut self) -> SettleReport {
        if self.state != GameState::WaitingToStart {
            return SettleReport::default();
        }
        self.transition(GameState::Starting);
        self.publish(GameEvent::MovesChanged {
            remaining: self.moves_remaining,
            budget: self.move_budget,
        });

        let seeds: Vec<ContainerId> = self
            .board
            .borrow()
            .active()
            .filter(|c| !c.flags.locked)
            .map(|c| c.id())
            .collect();
        self.pending.extend(seeds);
        let spawned = self.board.borrow_mut().trigger_spawners();
        self.pending.extend(spawned.iter().copied());

        let mut report = self.settle().await;
        report.spawned.splice(0..0, spawned);

        sleep(self.config.timing.start_delay).await;
        self.transition(GameState::Playing);
        self.evaluate();
        report
    }

    /// Suspend play. Returns `false` unless the game was playing.
    pub fn pause(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        self.paused_from = Some(self.state);
        self.transition(GameState::Paused);
        true
    }

    /// Resume into the state play was paused from.
    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused {
            return false;
        }
        let to = self.paused_from.take().unwrap_or(GameState::Playing);
        self.transition(to);
        true
    }

    /// Expire a lapsed combo streak. Call periodically from the frame loop.
    pub fn poll(&mut self) {
        if self.combo.expire(Instant::now()) {
            self.publish(GameEvent::ComboChanged { count: 0 });
        }
    }

    fn transition(&mut self, to: GameState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        info!(%from, %to, "game state changed");
        self.publish(GameEvent::StateChanged { from, to });
    }

    fn evaluate(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        let verdict = self
            .outcome
            .evaluate(&self.board.borrow(), self.moves_remaining);
        if let Verdict::Lose(reason) = verdict {
            info!(?reason, "level lost");
        }
        let next = next_state(self.state, verdict);
        self.transition(next);
    }

    fn publish(&self, event: GameEvent) {
        self.board.borrow_mut().publish(event);
    }

    // ── Moves ──────────────────────────────────────────────────────

    /// Move `container` so its anchor lands on `target`.
    ///
    /// Validation happens before anything changes: a rejected move costs
    /// no budget and starts no cascade. A committed move spends one move,
    /// triggers spawners, runs cascades from the moved container until the
    /// board is quiet, and re-evaluates the outcome.
    pub async fn attempt_move(
        &mut self,
        container: ContainerId,
        target: Cell,
    ) -> Result<MoveReport, MoveError> {
        if self.state != GameState::Playing {
            return Err(MoveError::NotPlaying { state: self.state });
        }
        let from = self
            .board
            .borrow_mut()
            .try_move(container, target)
            .inspect_err(|e| debug!(%container, %target, error = %e, "move rejected"))?;

        self.moves_remaining = self.moves_remaining.saturating_sub(1);
        self.publish(GameEvent::MovesChanged {
            remaining: self.moves_remaining,
            budget: self.move_budget,
        });

        self.pending.push_back(container);
        let spawned = self.board.borrow_mut().trigger_spawners();
        self.pending.extend(spawned.iter().copied());

        let mut settle = self.settle().await;
        settle.spawned.splice(0..0, spawned);
        self.evaluate();

        Ok(MoveReport {
            from,
            to: target,
            moves_remaining: self.moves_remaining,
            settle,
            state: self.state,
        })
    }

    // ── Settling ───────────────────────────────────────────────────

    /// Run queued cascades and finish sequencing until the board is quiet.
    ///
    /// Each session returns only after all of its exchanges and completion
    /// checks are done, so once the pending queue and the finish queue are
    /// both empty nothing is left in flight.
    async fn settle(&mut self) -> SettleReport {
        let mut report = SettleReport::default();
        loop {
            self.poll();
            while let Some(seed) = self.pending.pop_front() {
                if report.sessions >= self.config.max_sessions_per_settle {
                    warn!(
                        sessions = report.sessions,
                        dropped = self.pending.len() + 1,
                        "cascade session bound reached"
                    );
                    report.truncated = true;
                    self.pending.clear();
                    break;
                }
                let live = self
                    .board
                    .borrow()
                    .container(seed)
                    .is_some_and(|c| c.flags.active && !c.flags.locked);
                if !live {
                    continue;
                }
                let session = self.cascade.run(&self.board, seed).await;
                report.absorb(&session);
                self.queue_changed();
            }

            let finished = self.board.borrow_mut().take_finished();
            if finished.is_empty() {
                break;
            }
            self.publish_finishes(finished, &mut report).await;
        }
        debug_assert!(self.board.borrow().is_quiet(), "settle returned mid-exchange");
        report
    }

    /// Seed follow-up sessions at every container whose content changed.
    fn queue_changed(&mut self) {
        let changed = self.board.borrow_mut().take_changed();
        let board = self.board.borrow();
        for id in changed {
            let live = board.container(id).is_some_and(|c| c.flags.active);
            if live && !self.pending.contains(&id) {
                self.pending.push_back(id);
            }
        }
    }

    /// Publish finish events in completion order, spaced apart, and react
    /// to each: combo, unlocks, spawners.
    async fn publish_finishes(&mut self, finished: Vec<ContainerId>, report: &mut SettleReport) {
        let spacing = self.config.timing.finish_spacing;
        for id in finished {
            if let Some(last) = self.last_finish {
                let since = Instant::now().duration_since(last);
                if since < spacing {
                    sleep(spacing - since).await;
                }
            }
            let now = Instant::now();
            self.last_finish = Some(now);
            self.board.borrow_mut().record_finish(id);
            report.finished.push(id);

            let count = self.combo.record(now);
            self.publish(GameEvent::ComboChanged { count });

            let ready = self.board.borrow().unlock_ready();
            for gated in ready {
                if self.board.borrow_mut().unlock(gated) {
                    self.pending.push_back(gated);
                    report.unlocked.push(gated);
                }
            }

            let spawned = self.board.borrow_mut().trigger_spawners();
            for s in spawned {
                self.pending.push_back(s);
                report.spawned.push(s);
            }
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("moves_remaining", &self.moves_remaining)
            .field("move_budget", &self.move_budget)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
