//! Completion, unlock, and win/lose decisions.
//!
//! Completion runs at two suspension points: the end of the current tick
//! (so a container is never observed mid-trade) and a short settle delay
//! before a finished container leaves the board.
//!
//! Win and lose are decided on a settled board. The unreachability test is
//! a heuristic, not a reachability proof: it only applies when every
//! remaining container is an unlocked axis-constrained one, and it projects
//! bounded rays along each container's travel lane. See [`pair_reachable`].

use std::time::Duration;

use indexmap::IndexSet;
use tokio::task::yield_now;
use tokio::time::sleep;
use traymatch_core::{Axis, Cell, ContainerId, GameState};

use crate::board::{Board, SharedBoard};
use crate::container::Container;

/// Why a level was lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoseReason {
    /// The move budget is spent.
    OutOfMoves,
    /// No two remaining containers of different colors can meet.
    Unreachable,
}

/// Result of evaluating a settled board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Keep playing.
    Continue,
    /// Every planned container finished.
    Win,
    /// The level can no longer be won.
    Lose(LoseReason),
}

/// Decides completion and the terminal state of a level.
#[derive(Clone, Debug)]
pub struct OutcomeEvaluator {
    finish_settle: Duration,
    reach_distance: u32,
}

impl OutcomeEvaluator {
    /// Create an evaluator.
    pub fn new(finish_settle: Duration, reach_distance: u32) -> Self {
        Self {
            finish_settle,
            reach_distance,
        }
    }

    /// Finish every container in `ids` that is complete and idle.
    ///
    /// Waits for the end of the current tick, marks complete containers as
    /// finishing, waits the settle delay, then takes them off the board.
    /// The checks for all of `ids` run back to back. Returns the containers
    /// that finished.
    pub async fn check_completion(
        &self,
        board: &SharedBoard,
        ids: &[ContainerId],
    ) -> Vec<ContainerId> {
        yield_now().await;
        let finishing: Vec<ContainerId> = {
            let mut board = board.borrow_mut();
            ids.iter().copied().filter(|&id| board.begin_finish(id)).collect()
        };
        if finishing.is_empty() {
            return finishing;
        }
        sleep(self.finish_settle).await;
        let mut board = board.borrow_mut();
        for &id in &finishing {
            board.complete_finish(id);
        }
        finishing
    }

    /// Judge a settled board.
    ///
    /// Win takes precedence: a board with nothing remaining is won even if
    /// the last move spent the budget.
    pub fn evaluate(&self, board: &Board, moves_remaining: u32) -> Verdict {
        if board.remaining() == 0 {
            return Verdict::Win;
        }
        if moves_remaining == 0 {
            return Verdict::Lose(LoseReason::OutOfMoves);
        }
        if unreachable(board, self.reach_distance) {
            return Verdict::Lose(LoseReason::Unreachable);
        }
        Verdict::Continue
    }
}

/// State after applying `verdict` to `current`.
///
/// Terminal states never change, so a win can never turn into a loss.
pub fn next_state(current: GameState, verdict: Verdict) -> GameState {
    if current.is_terminal() {
        return current;
    }
    match verdict {
        Verdict::Continue => current,
        Verdict::Win => GameState::Won,
        Verdict::Lose(_) => GameState::Lost,
    }
}

/// Whether the unreachability heuristic declares the board stuck.
///
/// Only applies when nothing is queued in spawners and every active
/// container is unlocked and axis-constrained.
pub fn unreachable(board: &Board, reach: u32) -> bool {
    if board.queued_count() > 0 {
        return false;
    }
    let lanes: Vec<&Container> = board.active().collect();
    if lanes.is_empty() || lanes.iter().any(|c| c.flags.locked || c.axis().is_none()) {
        return false;
    }
    for a in &lanes {
        for b in &lanes {
            if a.id() != b.id() && a.home() != b.home() && pair_reachable(a, b, reach) {
                return false;
            }
        }
    }
    true
}

/// Whether `a` may still meet `b`, judged from `a`'s travel lane.
///
/// Same axis: `a`'s inner ray (its lane through the footprint centre) or
/// one of its outer rays (the lines flanking the lane) must cross `b`'s
/// footprint. Different axes: `a`'s inner ray must cross `b`'s footprint
/// or `b`'s own inner ray.
/// Rays extend `reach` cells each way. Containers without an axis are
/// always considered reachable.
pub fn pair_reachable(a: &Container, b: &Container, reach: u32) -> bool {
    let (Some(axis_a), Some(axis_b)) = (a.axis(), b.axis()) else {
        return true;
    };
    let b_cells: IndexSet<Cell> = b.footprint().into_iter().collect();
    let inner_a = inner_ray(a, axis_a, reach);
    if inner_a.iter().any(|c| b_cells.contains(c)) {
        return true;
    }
    if axis_a == axis_b {
        outer_ray(a, axis_a, reach).iter().any(|c| b_cells.contains(c))
    } else {
        !inner_a.is_disjoint(&inner_ray(b, axis_b, reach))
    }
}

fn inner_ray(c: &Container, axis: Axis, reach: u32) -> IndexSet<Cell> {
    let r = reach as i32;
    let (w, d) = (c.shape().width() as i32, c.shape().depth() as i32);
    let base = c.anchor();
    let mut out = IndexSet::new();
    for step in -r..=r {
        match axis {
            Axis::Horizontal => {
                let z = base.z + d / 2;
                for x in 0..w {
                    out.insert(Cell::new(base.x + step + x, z));
                }
            }
            Axis::Vertical => {
                let x = base.x + w / 2;
                for z in 0..d {
                    out.insert(Cell::new(x, base.z + step + z));
                }
            }
        }
    }
    out
}

fn outer_ray(c: &Container, axis: Axis, reach: u32) -> IndexSet<Cell> {
    let r = reach as i32;
    let (w, d) = (c.shape().width() as i32, c.shape().depth() as i32);
    let base = c.anchor();
    let mut out = IndexSet::new();
    for step in -r..=r {
        match axis {
            Axis::Horizontal => {
                for x in 0..w {
                    out.insert(Cell::new(base.x + step + x, base.z + d));
                    out.insert(Cell::new(base.x + step + x, base.z - 1));
                }
            }
            Axis::Vertical => {
                for z in 0..d {
                    out.insert(Cell::new(base.x - 1, base.z + step + z));
                    out.insert(Cell::new(base.x + w, base.z + step + z));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use traymatch_core::{Color, ContainerShape};
    use traymatch_grid::GridBounds;
    use traymatch_test_utils::run_local;

    fn lane(id: u32, home: Color, anchor: Cell, axis: Axis) -> Container {
        let shape = ContainerShape::new(1, 1, home).unwrap();
        Container::new(ContainerId(id), shape, anchor).with_axis(axis)
    }

    #[test]
    fn win_is_sticky() {
        assert_eq!(
            next_state(GameState::Won, Verdict::Lose(LoseReason::OutOfMoves)),
            GameState::Won
        );
        assert_eq!(next_state(GameState::Lost, Verdict::Win), GameState::Lost);
        assert_eq!(next_state(GameState::Playing, Verdict::Win), GameState::Won);
        assert_eq!(
            next_state(GameState::Playing, Verdict::Lose(LoseReason::Unreachable)),
            GameState::Lost
        );
        assert_eq!(next_state(GameState::Playing, Verdict::Continue), GameState::Playing);
    }

    #[test]
    fn parallel_lanes_side_by_side_can_meet() {
        // Two horizontal lanes one row apart: b sits on a's upper outer ray.
        let a = lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal);
        let b = lane(1, Color::Blue, Cell::new(3, 1), Axis::Horizontal);
        assert!(pair_reachable(&a, &b, 5));
    }

    #[test]
    fn shared_lane_can_meet() {
        let a = lane(0, Color::Red, Cell::new(-3, 0), Axis::Horizontal);
        let b = lane(1, Color::Blue, Cell::new(0, 0), Axis::Horizontal);
        assert!(pair_reachable(&a, &b, 5));
        assert!(pair_reachable(&b, &a, 5));

        let up = lane(2, Color::Red, Cell::new(4, -2), Axis::Vertical);
        let down = lane(3, Color::Blue, Cell::new(4, 2), Axis::Vertical);
        assert!(pair_reachable(&up, &down, 5));
    }

    #[test]
    fn shared_lane_beyond_reach_cannot_meet() {
        let a = lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal);
        let b = lane(1, Color::Blue, Cell::new(7, 0), Axis::Horizontal);
        assert!(!pair_reachable(&a, &b, 5));
    }

    #[test]
    fn shared_lane_is_not_unreachable() {
        let eval = OutcomeEvaluator::new(Duration::from_millis(200), 5);
        let board = board_of(vec![
            lane(0, Color::Red, Cell::new(-3, 0), Axis::Horizontal),
            lane(1, Color::Blue, Cell::new(0, 0), Axis::Horizontal),
        ]);
        assert_eq!(eval.evaluate(&board, 3), Verdict::Continue);
    }

    #[test]
    fn parallel_lanes_far_apart_cannot_meet() {
        let a = lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal);
        let b = lane(1, Color::Blue, Cell::new(0, 3), Axis::Horizontal);
        assert!(!pair_reachable(&a, &b, 5));
        assert!(!pair_reachable(&b, &a, 5));
    }

    #[test]
    fn parallel_lanes_beyond_reach_cannot_meet() {
        let a = lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal);
        let b = lane(1, Color::Blue, Cell::new(7, 1), Axis::Horizontal);
        assert!(!pair_reachable(&a, &b, 5));
        assert!(pair_reachable(&a, &b, 7));
    }

    #[test]
    fn crossing_lanes_can_meet() {
        let a = lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal);
        let b = lane(1, Color::Blue, Cell::new(3, 4), Axis::Vertical);
        assert!(pair_reachable(&a, &b, 5));
    }

    #[test]
    fn crossing_lanes_out_of_reach_cannot_meet() {
        let a = lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal);
        let b = lane(1, Color::Blue, Cell::new(9, 9), Axis::Vertical);
        assert!(!pair_reachable(&a, &b, 5));
    }

    fn board_of(containers: Vec<Container>) -> Board {
        let mut board = Board::new(GridBounds::new(20, 20, Cell::ZERO).unwrap());
        for c in containers {
            board.place(c).unwrap();
        }
        board
    }

    #[test]
    fn empty_board_wins_even_without_moves() {
        let eval = OutcomeEvaluator::new(Duration::from_millis(200), 5);
        let board = board_of(Vec::new());
        assert_eq!(eval.evaluate(&board, 0), Verdict::Win);
    }

    #[test]
    fn exhausted_budget_loses_before_reachability() {
        let eval = OutcomeEvaluator::new(Duration::from_millis(200), 5);
        let board = board_of(vec![
            lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal),
            lane(1, Color::Blue, Cell::new(3, 1), Axis::Horizontal),
        ]);
        assert_eq!(eval.evaluate(&board, 0), Verdict::Lose(LoseReason::OutOfMoves));
        assert_eq!(eval.evaluate(&board, 3), Verdict::Continue);
    }

    #[test]
    fn separated_lanes_lose_as_unreachable() {
        let eval = OutcomeEvaluator::new(Duration::from_millis(200), 5);
        let board = board_of(vec![
            lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal),
            lane(1, Color::Blue, Cell::new(0, 4), Axis::Horizontal),
        ]);
        assert_eq!(eval.evaluate(&board, 3), Verdict::Lose(LoseReason::Unreachable));
    }

    #[test]
    fn free_container_disables_heuristic() {
        let shape = ContainerShape::new(1, 1, Color::Blue).unwrap();
        let board = board_of(vec![
            lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal),
            Container::new(ContainerId(1), shape, Cell::new(0, 4)),
        ]);
        assert!(!unreachable(&board, 5));
    }

    #[test]
    fn completion_takes_complete_containers_off_the_board() {
        let mut board = board_of(vec![
            lane(0, Color::Red, Cell::new(0, 0), Axis::Horizontal),
            lane(1, Color::Blue, Cell::new(1, 0), Axis::Horizontal),
        ]);
        board.dispense(ContainerId(0), vec![Color::Red; 4]);
        board.dispense(ContainerId(1), vec![Color::Blue, Color::Red]);
        let shared: SharedBoard = Rc::new(RefCell::new(board));
        let eval = OutcomeEvaluator::new(Duration::from_millis(200), 5);

        let ids = [ContainerId(0), ContainerId(1)];
        let done = run_local(eval.check_completion(&shared, &ids));

        assert_eq!(done, vec![ContainerId(0)]);
        let mut board = shared.borrow_mut();
        assert!(!board.container(ContainerId(0)).unwrap().flags.active);
        assert!(board.container(ContainerId(1)).unwrap().flags.active);
        assert_eq!(board.take_finished(), vec![ContainerId(0)]);
    }
}
