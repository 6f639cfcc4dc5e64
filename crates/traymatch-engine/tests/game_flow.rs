//! Full-game scenarios: load, start, move, settle, and terminal states.

use std::time::Duration;

use traymatch_core::{Axis, Cell, Color, ContainerId, Direction, GameEvent, GameState, MoveError};
use traymatch_engine::{Board, Game, GameConfig, LevelSpec, LoadError, Placement, SpawnerSpec};
use traymatch_plan::PlanError;
use traymatch_test_utils::{count, drain, run_local, seeded, shape, transitions, unit};

use Color::*;

const RED: ContainerId = ContainerId(0);
const BLUE: ContainerId = ContainerId(1);
const GREEN: ContainerId = ContainerId(2);

/// A 6 × 1 strip (x in -3..=2) with a Red and a Blue container.
fn strip(budget: u32, red_at: i32, blue_at: i32) -> LevelSpec {
    LevelSpec::new(6, 1, budget)
        .with_placement(Placement::plain(unit(Red), Cell::new(red_at, 0)))
        .with_placement(Placement::plain(unit(Blue), Cell::new(blue_at, 0)))
}

/// Two mutual trades solve both containers.
const PAIR: &[(ContainerId, &[Color])] = &[
    (RED, &[Red, Red, Blue, Blue]),
    (BLUE, &[Blue, Red, Red, Blue]),
];

fn game_with(level: &LevelSpec, content: &[(ContainerId, &[Color])]) -> Game {
    let mut board = Board::from_level(level).unwrap();
    for &(id, colors) in content {
        assert!(board.assign(id, colors.to_vec()), "{id} is not on the level");
    }
    Game::from_board(board, level.move_budget, GameConfig::default()).unwrap()
}

fn finishes(events: &[GameEvent]) -> usize {
    count(events, |e| matches!(e, GameEvent::ContainerFinished { .. }))
}

#[test]
fn adjacent_pair_solves_itself_and_wins_once() {
    let level = strip(3, -3, -2);
    let mut game = Game::load(&level, GameConfig::default(), &mut seeded(7)).unwrap();
    let events = game.subscribe();

    let report = run_local(game.start());

    assert_eq!(game.state(), GameState::Won);
    assert_eq!(report.finished.len(), 2);
    assert_eq!(game.board().remaining(), 0);
    let events = drain(&events);
    assert_eq!(
        transitions(&events),
        vec![GameState::Starting, GameState::Playing, GameState::Won]
    );
    assert_eq!(finishes(&events), 2);
}

#[test]
fn move_into_contact_wins() {
    let level = strip(5, -3, 2);
    let mut game = game_with(&level, PAIR);
    run_local(game.start());
    assert_eq!(game.state(), GameState::Playing);
    let events = game.subscribe();

    let report = run_local(game.attempt_move(RED, Cell::new(1, 0))).unwrap();

    assert_eq!(report.from, Cell::new(-3, 0));
    assert_eq!(report.to, Cell::new(1, 0));
    assert_eq!(report.moves_remaining, 4);
    assert_eq!(report.settle.trades, 2);
    assert_eq!(report.settle.finished.len(), 2);
    assert_eq!(report.state, GameState::Won);

    let events = drain(&events);
    assert_eq!(finishes(&events), 2);
    assert_eq!(
        count(&events, |e| matches!(e, GameEvent::ItemRelocated { .. })),
        4
    );
    assert_eq!(
        count(&events, |e| matches!(e, GameEvent::ComboChanged { count: 2 })),
        1
    );
    assert_eq!(transitions(&events), vec![GameState::Won]);

    // Won is terminal.
    assert_eq!(
        run_local(game.attempt_move(BLUE, Cell::new(0, 0))),
        Err(MoveError::NotPlaying { state: GameState::Won })
    );
}

#[test]
fn spending_the_last_move_without_progress_loses() {
    let level = strip(1, -3, 2);
    let mut game = game_with(&level, PAIR);
    run_local(game.start());
    let events = game.subscribe();

    let report = run_local(game.attempt_move(RED, Cell::new(-1, 0))).unwrap();

    assert_eq!(report.moves_remaining, 0);
    assert_eq!(report.settle.trades, 0);
    assert_eq!(game.state(), GameState::Lost);
    let events = drain(&events);
    assert!(events.contains(&GameEvent::MovesChanged {
        remaining: 0,
        budget: 1
    }));
    assert_eq!(transitions(&events), vec![GameState::Lost]);
}

#[test]
fn zero_budget_loses_on_start() {
    let level = strip(0, -3, 2);
    let mut game = game_with(&level, PAIR);

    run_local(game.start());

    assert_eq!(game.state(), GameState::Lost);
    assert_eq!(
        run_local(game.attempt_move(RED, Cell::new(-2, 0))),
        Err(MoveError::NotPlaying {
            state: GameState::Lost
        })
    );
}

#[test]
fn rejected_moves_cost_nothing() {
    let level = strip(3, -3, 2);
    let mut game = game_with(&level, PAIR);

    assert_eq!(
        run_local(game.attempt_move(RED, Cell::new(-2, 0))),
        Err(MoveError::NotPlaying {
            state: GameState::WaitingToStart
        })
    );

    run_local(game.start());
    let events = game.subscribe();

    let rejected = [
        (
            RED,
            Cell::new(2, 0),
            MoveError::Occupied {
                container: RED,
                cell: Cell::new(2, 0),
                by: Some(BLUE),
            },
        ),
        (
            RED,
            Cell::new(3, 0),
            MoveError::OutOfBounds {
                container: RED,
                cell: Cell::new(3, 0),
            },
        ),
        (RED, Cell::new(-3, 0), MoveError::NoDisplacement { container: RED }),
        (
            ContainerId(99),
            Cell::new(0, 0),
            MoveError::UnknownContainer {
                container: ContainerId(99),
            },
        ),
    ];
    for (id, target, expected) in rejected {
        assert_eq!(run_local(game.attempt_move(id, target)), Err(expected));
    }

    assert_eq!(game.moves_remaining(), 3);
    assert_eq!(game.state(), GameState::Playing);
    assert_eq!(game.board().container(RED).unwrap().anchor(), Cell::new(-3, 0));
    assert!(drain(&events).is_empty());
}

#[test]
fn directional_container_stays_on_its_axis() {
    let level = LevelSpec::new(6, 3, 3)
        .with_placement(Placement::directional(
            unit(Red),
            Cell::new(-3, 0),
            Axis::Horizontal,
        ))
        .with_placement(Placement::plain(unit(Blue), Cell::new(2, 0)));
    let mut game = game_with(&level, PAIR);
    run_local(game.start());

    let err = run_local(game.attempt_move(RED, Cell::new(-3, 1))).unwrap_err();
    assert!(matches!(err, MoveError::AxisViolation { axis: Axis::Horizontal, .. }));
    assert_eq!(game.moves_remaining(), 3);

    let limits = game.move_limits(RED).unwrap();
    assert_eq!((limits.up, limits.down), (0, 0));
    assert_eq!(limits.right, 4);
}

#[test]
fn no_demand_pair_stays_put() {
    let level = strip(3, -3, -2).with_placement(Placement::plain(unit(Green), Cell::new(2, 0)));
    let mut game = game_with(
        &level,
        &[
            (RED, &[Red, Red, Red, Green]),
            (BLUE, &[Blue, Blue, Blue, Green]),
            (GREEN, &[Green, Green, Red, Blue]),
        ],
    );
    let events = game.subscribe();

    let report = run_local(game.start());

    assert_eq!(report.trades, 0);
    assert!(report.finished.is_empty());
    assert_eq!(game.state(), GameState::Playing);
    let board = game.board();
    assert_eq!(board.container(RED).unwrap().colors(), vec![Red, Red, Red, Green]);
    assert_eq!(board.container(BLUE).unwrap().colors(), vec![Blue, Blue, Blue, Green]);
    drop(board);
    assert_eq!(
        count(&drain(&events), |e| matches!(e, GameEvent::ItemRelocated { .. })),
        0
    );
}

#[test]
fn finishes_unlock_gated_container() {
    let level =
        strip(3, -3, -2).with_placement(Placement::blocked(unit(Green), Cell::new(2, 0), 2));
    let mut game = game_with(
        &level,
        &[
            (RED, &[Red, Blue, Red, Blue]),
            (BLUE, &[Red, Blue, Blue, Red]),
            (GREEN, &[Green, Green, Green, Green]),
        ],
    );
    assert!(game.board().container(GREEN).unwrap().items().is_empty());
    assert_eq!(
        run_local(game.attempt_move(GREEN, Cell::new(1, 0))),
        Err(MoveError::NotPlaying {
            state: GameState::WaitingToStart
        })
    );
    let events = game.subscribe();

    let report = run_local(game.start());

    assert_eq!(report.unlocked, vec![GREEN]);
    assert_eq!(report.finished.len(), 3);
    assert_eq!(report.finished[2], GREEN);
    assert_eq!(game.state(), GameState::Won);
    let events = drain(&events);
    assert_eq!(
        count(&events, |e| matches!(
            e,
            GameEvent::ContainerUnlocked { container } if *container == GREEN
        )),
        1
    );
    assert_eq!(finishes(&events), 3);
}

#[test]
fn locked_container_refuses_moves() {
    let level =
        strip(3, -3, 1).with_placement(Placement::blocked(unit(Green), Cell::new(-1, 0), 5));
    let mut game = game_with(
        &level,
        &[
            (RED, &[Red, Red, Blue, Green]),
            (BLUE, &[Blue, Red, Blue, Green]),
            (GREEN, &[Green, Green, Red, Blue]),
        ],
    );
    run_local(game.start());
    assert_eq!(
        run_local(game.attempt_move(GREEN, Cell::new(0, 0))),
        Err(MoveError::Locked { container: GREEN })
    );
}

#[test]
fn spawner_feeds_the_board() {
    let level = LevelSpec::new(6, 1, 3)
        .with_placement(Placement::plain(unit(Red), Cell::new(-3, 0)))
        .with_spawner(SpawnerSpec {
            cell: Cell::new(2, 0),
            direction: Direction::Left,
            queue: vec![unit(Blue)],
        });
    let mut game = game_with(&level, PAIR);
    assert_eq!(game.board().remaining(), 2);
    assert_eq!(game.board().active_count(), 1);
    let events = game.subscribe();

    let report = run_local(game.start());

    assert_eq!(report.spawned, vec![BLUE]);
    assert_eq!(game.board().container(BLUE).unwrap().anchor(), Cell::new(1, 0));
    assert_eq!(game.board().queued_count(), 0);
    assert!(drain(&events).contains(&GameEvent::ContainerSpawned {
        container: BLUE,
        anchor: Cell::new(1, 0),
    }));

    let report = run_local(game.attempt_move(RED, Cell::new(0, 0))).unwrap();
    assert_eq!(report.settle.finished.len(), 2);
    assert_eq!(game.state(), GameState::Won);
}

#[test]
fn pause_and_resume_gate_moves() {
    let level = strip(3, -3, 2);
    let mut game = game_with(&level, PAIR);
    assert!(!game.pause());
    run_local(game.start());

    assert!(game.pause());
    assert_eq!(game.state(), GameState::Paused);
    assert_eq!(
        run_local(game.attempt_move(RED, Cell::new(-2, 0))),
        Err(MoveError::NotPlaying {
            state: GameState::Paused
        })
    );
    assert!(game.resume());
    assert_eq!(game.state(), GameState::Playing);
    assert!(!game.resume());
}

#[test]
fn unsolvable_gating_fails_to_load() {
    // Red and Blue must finish before Green opens, but Green can hold at
    // most three greens, so its fourth green always sits in Red or Blue.
    let level =
        strip(3, -3, -2).with_placement(Placement::blocked(unit(Green), Cell::new(2, 0), 2));
    match Game::load(&level, GameConfig::default(), &mut seeded(11)) {
        Err(LoadError::Plan(PlanError::Infeasible { attempts, .. })) => assert_eq!(attempts, 30),
        other => panic!("expected an infeasible plan, got {other:?}"),
    }
}

#[test]
fn invalid_config_fails_to_load() {
    let mut config = GameConfig::default();
    config.exchange.max_bag_size = 0;
    let err = Game::load(&strip(3, -3, 2), config, &mut seeded(0)).unwrap_err();
    assert!(matches!(err, LoadError::Config(_)));
}

#[test]
fn session_bound_truncates_follow_ups() {
    let level = strip(3, -3, -2);
    let mut board = Board::from_level(&level).unwrap();
    board.assign(RED, vec![Red, Red, Blue, Blue]);
    board.assign(BLUE, vec![Blue, Red, Red, Blue]);
    let config = GameConfig {
        max_sessions_per_settle: 1,
        ..GameConfig::default()
    };
    let mut game = Game::from_board(board, level.move_budget, config).unwrap();

    let report = run_local(game.start());

    assert_eq!(report.sessions, 1);
    assert!(report.truncated);
    // The one session that ran still solved the pair.
    assert_eq!(report.finished, vec![RED, BLUE]);
    assert_eq!(game.state(), GameState::Won);
}

#[test]
fn long_exchange_still_finishes_and_wins() {
    // Two 3 x 2 containers, each holding 19 of the other's items: one
    // exchange of 19 mutual trades, close to the full bag.
    let level = LevelSpec::new(8, 2, 3)
        .with_placement(Placement::plain(shape(3, 2, Red), Cell::new(-4, -1)))
        .with_placement(Placement::plain(shape(3, 2, Blue), Cell::new(1, -1)));
    let mut red = vec![Red; 5];
    red.extend(vec![Blue; 19]);
    let mut blue = vec![Blue; 5];
    blue.extend(vec![Red; 19]);
    let mut game = game_with(&level, &[(RED, &red[..]), (BLUE, &blue[..])]);
    run_local(game.start());
    assert_eq!(game.state(), GameState::Playing);
    let events = game.subscribe();

    let report = run_local(game.attempt_move(RED, Cell::new(-2, -1))).unwrap();

    assert_eq!(report.settle.stalled_layers, 0);
    assert_eq!(report.settle.trades, 19);
    assert_eq!(report.settle.finished, vec![RED, BLUE]);
    assert_eq!(report.state, GameState::Won);
    assert_eq!(game.board().finished_count(), 2);
    assert!(game.board().is_quiet());
    let events = drain(&events);
    assert_eq!(finishes(&events), 2);
    assert_eq!(transitions(&events), vec![GameState::Won]);
}

#[test]
fn shared_lane_is_not_a_dead_end() {
    // Both containers slide along the same row, three cells apart.
    let level = LevelSpec::new(6, 1, 3)
        .with_placement(Placement::directional(
            unit(Red),
            Cell::new(-3, 0),
            Axis::Horizontal,
        ))
        .with_placement(Placement::directional(
            unit(Blue),
            Cell::new(0, 0),
            Axis::Horizontal,
        ));
    let mut game = game_with(&level, PAIR);

    run_local(game.start());
    assert_eq!(game.state(), GameState::Playing);

    let report = run_local(game.attempt_move(RED, Cell::new(-1, 0))).unwrap();
    assert_eq!(report.settle.trades, 2);
    assert_eq!(report.state, GameState::Won);
}

#[test]
fn drain_shorter_than_an_exchange_fails_to_load() {
    let mut config = GameConfig::default();
    config.timing.drain_timeout = Duration::from_millis(500);
    let board = Board::from_level(&strip(3, -3, 2)).unwrap();
    let err = Game::from_board(board, 3, config).unwrap_err();
    assert!(matches!(err, LoadError::Config(_)));
}
