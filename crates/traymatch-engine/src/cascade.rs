//! Breadth-first propagation of exchanges across the adjacency graph.
//!
//! A [`CascadeSession`] starts at one container and walks outward layer by
//! layer. Each layer pairs every frontier container with its eligible,
//! not-yet-visited neighbours (best [`priority_score`] first), dispatches
//! one exchange task per pair, and waits for the layer to drain. A
//! container is marked visited the moment it is scheduled, so no container
//! enters two layers of the same session.
//!
//! Sessions are owned per run. Nothing is shared between two runs except
//! the board itself.

use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::join_all;
use indexmap::IndexSet;
use tokio::task::{spawn_local, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, warn};
use traymatch_core::ContainerId;

use crate::board::{Board, BusyFlag, BusyGuard, SharedBoard};
use crate::exchange::{ExchangeOutcome, ExchangeResolver};
use crate::outcome::OutcomeEvaluator;

/// Ordering key for exchange candidates. Higher goes first.
///
/// - +1000 when each side holds an item the other's home color needs,
///   otherwise +500 when only one side does;
/// - `(20 − min(wrong(a), wrong(b))) × 10`, favouring near-complete pairs;
/// - the combined item count of both containers;
/// - twice the number of containers adjacent to `b`.
pub fn priority_score(board: &Board, a: ContainerId, b: ContainerId) -> i64 {
    let (Some(ca), Some(cb)) = (board.container(a), board.container(b)) else {
        return i64::MIN;
    };
    let a_helps = ca.offers(cb.home());
    let b_helps = cb.offers(ca.home());
    let mut score: i64 = match (a_helps, b_helps) {
        (true, true) => 1000,
        (true, false) | (false, true) => 500,
        (false, false) => 0,
    };
    let nearest = ca.wrong_count().min(cb.wrong_count()) as i64;
    score += (20 - nearest) * 10;
    score += (ca.items().len() + cb.items().len()) as i64;
    score += 2 * board.adjacent_count(b) as i64;
    score
}

/// Phase of a [`CascadeSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created, nothing scheduled yet.
    Seed,
    /// Pairing the current frontier with its neighbours.
    Expanding,
    /// Waiting for the current layer's exchanges.
    Draining,
    /// Frontier exhausted.
    Settled,
}

/// Summary of one cascade run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// The container the session started from.
    pub seed: Option<ContainerId>,
    /// Layers that dispatched at least one exchange.
    pub layers: usize,
    /// Every `(frontier, neighbour)` pair dispatched, in dispatch order.
    pub dispatched: Vec<(ContainerId, ContainerId)>,
    /// Trades landed by the session's exchanges, stalled ones included.
    pub trades: usize,
    /// Layers that hit the drain timeout.
    pub stalled_layers: usize,
    /// Containers finished by this session's completion checks.
    pub finished: Vec<ContainerId>,
}

/// Bookkeeping of one propagation run.
#[derive(Clone, Debug)]
pub struct CascadeSession {
    seed: ContainerId,
    visited: IndexSet<ContainerId>,
    layer: Vec<ContainerId>,
    phase: SessionPhase,
}

impl CascadeSession {
    /// A session seeded at `seed`.
    pub fn new(seed: ContainerId) -> Self {
        let mut visited = IndexSet::new();
        visited.insert(seed);
        Self {
            seed,
            visited,
            layer: vec![seed],
            phase: SessionPhase::Seed,
        }
    }

    /// The starting container.
    pub fn seed(&self) -> ContainerId {
        self.seed
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Containers scheduled so far, seed first.
    pub fn visited(&self) -> &IndexSet<ContainerId> {
        &self.visited
    }

    /// Pair the current frontier with its neighbours and advance.
    ///
    /// Each frontier container's eligible, unvisited neighbours are
    /// ordered by descending [`priority_score`] (stable on ties), marked
    /// visited, and become the next frontier. Returns the pairs to
    /// dispatch; when empty the session is settled.
    pub fn expand(&mut self, board: &Board) -> Vec<(ContainerId, ContainerId)> {
        self.phase = SessionPhase::Expanding;
        let mut pairs = Vec::new();
        let mut next = Vec::new();
        for &tray in &self.layer {
            let mut candidates: Vec<(ContainerId, i64)> = board
                .neighbours(tray)
                .into_iter()
                .filter(|n| !self.visited.contains(n) && board.is_exchange_eligible(*n))
                .map(|n| (n, priority_score(board, tray, n)))
                .collect();
            candidates.sort_by(|x, y| y.1.cmp(&x.1));
            for (n, _) in candidates {
                self.visited.insert(n);
                pairs.push((tray, n));
                next.push(n);
            }
        }
        self.layer = next;
        self.phase = if pairs.is_empty() {
            SessionPhase::Settled
        } else {
            SessionPhase::Draining
        };
        pairs
    }
}

/// Runs cascade sessions against a shared board.
///
/// Sessions spawn their exchanges with [`tokio::task::spawn_local`], so
/// [`run`](CascadeEngine::run) must be polled inside a
/// [`LocalSet`](tokio::task::LocalSet).
#[derive(Clone, Debug)]
pub struct CascadeEngine {
    resolver: ExchangeResolver,
    outcome: OutcomeEvaluator,
    drain_timeout: Duration,
}

type ExchangeTask = JoinHandle<(ExchangeOutcome, Vec<ContainerId>)>;

impl CascadeEngine {
    /// Create an engine.
    pub fn new(
        resolver: ExchangeResolver,
        outcome: OutcomeEvaluator,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            outcome,
            drain_timeout,
        }
    }

    /// Propagate exchanges outward from `seed` until the frontier empties.
    ///
    /// A layer drains once every exchange in it has landed its trades; the
    /// completion checks of the traded pair run afterwards, outside the
    /// drain. A layer that does not drain within the timeout is abandoned
    /// and the session moves on to the next one.
    ///
    /// The session only settles once every exchange it dispatched, stalled
    /// or not, has finished along with its completion check, so nothing of
    /// this session is still swapping or finishing when `run` returns.
    pub async fn run(&self, board: &SharedBoard, seed: ContainerId) -> SessionReport {
        let mut session = CascadeSession::new(seed);
        let mut report = SessionReport {
            seed: Some(seed),
            ..SessionReport::default()
        };
        let _cascading = BusyGuard::acquire(board, &[seed], BusyFlag::Cascading);
        debug!(%seed, "cascade session started");

        let mut tasks: Vec<ExchangeTask> = Vec::new();
        loop {
            let pairs = session.expand(&board.borrow());
            if pairs.is_empty() {
                break;
            }
            report.layers += 1;
            report.dispatched.extend_from_slice(&pairs);

            let mut landed = Vec::with_capacity(pairs.len());
            for (a, b) in pairs {
                let (tx, rx) = oneshot::channel();
                landed.push(rx);
                tasks.push(self.dispatch(board, a, b, tx));
            }

            if timeout(self.drain_timeout, join_all(landed)).await.is_err() {
                report.stalled_layers += 1;
                warn!(
                    %seed,
                    layer = report.layers,
                    drain_timeout = ?self.drain_timeout,
                    "cascade layer did not drain, moving on"
                );
            }
        }

        for joined in join_all(tasks).await {
            match joined {
                Ok((result, finished)) => {
                    report.trades += result.applied;
                    report.finished.extend(finished);
                }
                Err(e) => warn!(%seed, error = %e, "exchange task failed"),
            }
        }

        let visited: Vec<ContainerId> = session.visited().iter().copied().collect();
        let finished = self.outcome.check_completion(board, &visited).await;
        report.finished.extend(finished);
        debug!(
            %seed,
            layers = report.layers,
            trades = report.trades,
            finished = report.finished.len(),
            "cascade session settled"
        );
        report
    }

    /// Spawn the exchange between `a` and `b`, signalling `landed` once its
    /// trades are done and before its completion check starts.
    fn dispatch(
        &self,
        board: &SharedBoard,
        a: ContainerId,
        b: ContainerId,
        landed: oneshot::Sender<()>,
    ) -> ExchangeTask {
        let board = Rc::clone(board);
        let resolver = self.resolver.clone();
        let outcome = self.outcome.clone();
        spawn_local(async move {
            let result = resolver.resolve(&board, a, b).await;
            // The layer may already have given up on us.
            let _ = landed.send(());
            let finished = if result.skipped {
                Vec::new()
            } else {
                outcome.check_completion(&board, &[a, b]).await
            };
            (result, finished)
        })
    }
}
