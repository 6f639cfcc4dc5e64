//! Planner errors.

use std::error::Error;
use std::fmt;

use traymatch_core::{Color, ContainerId};

/// Why a single planning attempt was abandoned.
///
/// Attempts fail routinely; only exhausting every attempt is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanFailure {
    /// No color in the bag satisfied the draw rules for a container.
    NoCandidate {
        /// The container being filled.
        container: ContainerId,
        /// Items already drawn for it.
        filled: usize,
        /// Its capacity.
        capacity: usize,
    },
    /// The always-available containers cannot be solved on their own.
    NotSelfSufficient {
        /// First color found short.
        color: Color,
        /// Items of that color held by other-home available containers.
        surplus: usize,
        /// Items of that color its available home containers still need.
        shortfall: usize,
    },
}

impl fmt::Display for PlanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidate {
                container,
                filled,
                capacity,
            } => write!(
                f,
                "no eligible color for container {container} after {filled}/{capacity} draws"
            ),
            Self::NotSelfSufficient {
                color,
                surplus,
                shortfall,
            } => write!(
                f,
                "available containers short of {color}: surplus {surplus} < shortfall {shortfall}"
            ),
        }
    }
}

/// Errors returned by [`AllocationPlanner::plan`](crate::AllocationPlanner::plan).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// The planner configuration is unusable.
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
    /// Two container specs share an id.
    DuplicateContainer {
        /// The repeated id.
        container: ContainerId,
    },
    /// A blocked spec names a container absent from the container list.
    UnknownBlocked {
        /// The unknown id.
        container: ContainerId,
    },
    /// Every attempt failed. The level must not start.
    Infeasible {
        /// Attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        last_failure: PlanFailure,
    },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid planner config: {reason}"),
            Self::DuplicateContainer { container } => {
                write!(f, "container {container} listed more than once")
            }
            Self::UnknownBlocked { container } => {
                write!(f, "blocked container {container} is not in the container list")
            }
            Self::Infeasible {
                attempts,
                last_failure,
            } => write!(
                f,
                "no valid allocation after {attempts} attempts (last: {last_failure})"
            ),
        }
    }
}

impl Error for PlanError {}
