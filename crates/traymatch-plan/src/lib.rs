//! Retry-bounded random item allocation for traymatch levels.
//!
//! Given every container a level will ever hold (static, gated, and
//! spawner-queued), [`AllocationPlanner::plan`] assigns each one an
//! ordered list of item colors such that:
//!
//! - the total supply of each color equals the total capacity of the
//!   containers whose home is that color;
//! - no container starts with more than `⌊capacity × 0.75⌋` items of its
//!   own home color, nor with more than three distinct colors;
//! - when gated containers cannot unlock before the always-available ones
//!   are solved, the always-available subset is solvable on its own.
//!
//! Draws are random; pass a seeded RNG for reproducible plans.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod plan;
pub mod planner;
pub mod spec;

pub use error::{PlanError, PlanFailure};
pub use plan::AllocationPlan;
pub use planner::{AllocationPlanner, PlannerConfig};
pub use spec::{BlockedSpec, ContainerSpec};
