//! Test fixtures and async helpers for traymatch development.
//!
//! Shape fixtures, seeded randomness, event draining, and [`run_local`],
//! which drives a future inside a [`LocalSet`] on a paused current-thread
//! runtime so cascade timers advance deterministically.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::future::Future;

use crossbeam_channel::Receiver;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::task::LocalSet;
use traymatch_core::{Color, ContainerShape, GameEvent, GameState};

/// A solid `width × depth` shape.
///
/// # Panics
///
/// On a zero dimension.
pub fn shape(width: u32, depth: u32, home: Color) -> ContainerShape {
    ContainerShape::new(width, depth, home).expect("fixture shape dimensions are non-zero")
}

/// A `1 × 1` shape: capacity 4.
pub fn unit(home: Color) -> ContainerShape {
    shape(1, 1, home)
}

/// A reproducible RNG.
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Run `fut` to completion inside a [`LocalSet`] on a current-thread
/// runtime whose clock starts paused.
///
/// With the clock paused, every `sleep` and `timeout` resolves as soon as
/// the runtime has nothing else to do, so multi-second cascades finish
/// instantly and in a fixed order.
pub fn run_local<F: Future>(fut: F) -> F::Output {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("current-thread runtime builds");
    LocalSet::new().block_on(&rt, fut)
}

/// Everything published so far, without blocking.
pub fn drain(events: &Receiver<GameEvent>) -> Vec<GameEvent> {
    events.try_iter().collect()
}

/// The `to` side of every state transition in `events`.
pub fn transitions(events: &[GameEvent]) -> Vec<GameState> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

/// How many events in `events` satisfy `pred`.
pub fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
