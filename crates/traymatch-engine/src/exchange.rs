//! Pairwise item exchange between adjacent containers.
//!
//! Deciding and executing are split. [`plan_exchange`] is a pure function
//! of the two containers' current content; [`ExchangeResolver::resolve`]
//! marks both sides busy, lands the planned trades one by one across
//! suspension points, and stops early if either side starts finishing or
//! leaves the board. Trades already landed are never rolled back.
//!
//! Every trade is one-for-one, so the combined item count of the pair is
//! conserved, and every trade hands at least one side an item of its home
//! color.

use std::fmt;

use smallvec::SmallVec;
use tokio::time::sleep;
use tracing::debug;
use traymatch_core::{ContainerId, ItemId};

use crate::board::{Board, BusyFlag, BusyGuard, SharedBoard};
use crate::config::ExchangeConfig;
use crate::container::Item;

/// Why a trade is part of an exchange set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TradeKind {
    /// Both items go home.
    Mutual,
    /// One item goes home, the other is a wrong item moved aside.
    Spillover,
}

/// One-for-one swap of two items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trade {
    /// Item moving from `b` to `a`.
    pub to_a: ItemId,
    /// Item moving from `a` to `b`.
    pub to_b: ItemId,
    /// Mutual or spillover.
    pub kind: TradeKind,
}

/// The trades two containers agreed on, in execution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeSet {
    /// First side.
    pub a: ContainerId,
    /// Second side.
    pub b: ContainerId,
    /// Mutual trades first, then spillover.
    pub trades: Vec<Trade>,
}

impl ExchangeSet {
    /// A set with no trades.
    pub fn empty(a: ContainerId, b: ContainerId) -> Self {
        Self {
            a,
            b,
            trades: Vec::new(),
        }
    }

    /// Whether nothing would change hands.
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Number of mutual trades.
    pub fn mutual_count(&self) -> usize {
        self.trades
            .iter()
            .filter(|t| t.kind == TradeKind::Mutual)
            .count()
    }
}

/// Decide what `a` and `b` should trade.
///
/// Only the first `max_bag` wrong items of each side are considered.
/// Returns an empty set when either container is missing.
pub fn plan_exchange(
    board: &Board,
    a: ContainerId,
    b: ContainerId,
    max_bag: usize,
) -> ExchangeSet {
    let (Some(ca), Some(cb)) = (board.container(a), board.container(b)) else {
        return ExchangeSet::empty(a, b);
    };
    let (home_a, home_b) = (ca.home(), cb.home());
    let bag_a: SmallVec<[Item; 20]> = ca.wrong_items().take(max_bag).copied().collect();
    let bag_b: SmallVec<[Item; 20]> = cb.wrong_items().take(max_bag).copied().collect();

    let i_want: SmallVec<[ItemId; 20]> = bag_b
        .iter()
        .filter(|i| i.color == home_a)
        .map(|i| i.id)
        .collect();
    let they_want: SmallVec<[ItemId; 20]> = bag_a
        .iter()
        .filter(|i| i.color == home_b)
        .map(|i| i.id)
        .collect();

    let pairs = i_want.len().min(they_want.len());
    let mut trades = Vec::with_capacity(i_want.len().max(they_want.len()));

    for k in 0..pairs {
        trades.push(Trade {
            to_a: i_want[k],
            to_b: they_want[k],
            kind: TradeKind::Mutual,
        });
    }

    // Leftover wanted items from b are paid for with a's unwanted items.
    let mut a_givable = bag_a.iter().map(|i| i.id).filter(|id| !they_want.contains(id));
    for &desired in &i_want[pairs..] {
        let Some(give) = a_givable.next() else { break };
        trades.push(Trade {
            to_a: desired,
            to_b: give,
            kind: TradeKind::Spillover,
        });
    }

    let mut b_givable = bag_b.iter().map(|i| i.id).filter(|id| !i_want.contains(id));
    for &desired in &they_want[pairs..] {
        let Some(give) = b_givable.next() else { break };
        trades.push(Trade {
            to_a: give,
            to_b: desired,
            kind: TradeKind::Spillover,
        });
    }

    ExchangeSet { a, b, trades }
}

/// What a [`resolve`](ExchangeResolver::resolve) call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExchangeOutcome {
    /// Trades planned.
    pub planned: usize,
    /// Trades landed.
    pub applied: usize,
    /// Whether the exchange never started because a side was ineligible.
    pub skipped: bool,
    /// Whether remaining trades were dropped because a side went away.
    pub aborted: bool,
}

impl ExchangeOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

impl fmt::Display for ExchangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skipped {
            return f.write_str("skipped");
        }
        write!(f, "{}/{} trades", self.applied, self.planned)?;
        if self.aborted {
            f.write_str(" (aborted)")?;
        }
        Ok(())
    }
}

/// Executes exchanges against a shared board.
#[derive(Clone, Debug, Default)]
pub struct ExchangeResolver {
    config: ExchangeConfig,
}

impl ExchangeResolver {
    /// Create a resolver.
    pub fn new(config: ExchangeConfig) -> Self {
        Self { config }
    }

    /// Plan and execute the exchange between `a` and `b`.
    ///
    /// A no-op when either side is locked, inactive, finishing, or already
    /// part of another exchange. Otherwise both sides stay busy until this
    /// future completes or is dropped.
    ///
    /// The first trade lands immediately and each further one after
    /// `trade_interval`, so a full set of `n` trades takes
    /// `(n - 1) × trade_interval`.
    pub async fn resolve(
        &self,
        board: &SharedBoard,
        a: ContainerId,
        b: ContainerId,
    ) -> ExchangeOutcome {
        let set = {
            let board = board.borrow();
            if a == b || !board.is_exchange_eligible(a) || !board.is_exchange_eligible(b) {
                return ExchangeOutcome::skipped();
            }
            plan_exchange(&board, a, b, self.config.max_bag_size)
        };
        let _busy = BusyGuard::acquire(board, &[a, b], BusyFlag::Swapping);

        let mut outcome = ExchangeOutcome {
            planned: set.trades.len(),
            ..ExchangeOutcome::default()
        };
        for (k, trade) in set.trades.iter().enumerate() {
            if k > 0 {
                sleep(self.config.trade_interval).await;
            }
            let mut board = board.borrow_mut();
            if !still_trading(&board, a) || !still_trading(&board, b) {
                debug!(
                    %a,
                    %b,
                    remaining = set.trades.len() - k,
                    "dropping trades of departed container"
                );
                outcome.aborted = true;
                break;
            }
            if apply_trade(&mut board, a, b, trade) {
                outcome.applied += 1;
            }
        }
        outcome
    }
}

fn still_trading(board: &Board, id: ContainerId) -> bool {
    board
        .container(id)
        .is_some_and(|c| c.flags.active && !c.flags.finishing)
}

/// Land one trade if both items are still where the plan left them.
fn apply_trade(board: &mut Board, a: ContainerId, b: ContainerId, trade: &Trade) -> bool {
    if !board.holds(b, trade.to_a) || !board.holds(a, trade.to_b) {
        return false;
    }
    board.relocate_item(trade.to_a, b, a) && board.relocate_item(trade.to_b, a, b)
}
