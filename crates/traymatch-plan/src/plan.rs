//! The planner's output.

use indexmap::IndexMap;
use traymatch_core::{Color, ContainerId};

/// Colors assigned to every planned container.
///
/// Each list is sized exactly to its container's capacity. For every color,
/// the total across all lists equals [`demand`](AllocationPlan::demand).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationPlan {
    assignments: IndexMap<ContainerId, Vec<Color>>,
    demand: IndexMap<Color, usize>,
    attempts: u32,
}

impl AllocationPlan {
    pub(crate) fn new(
        assignments: IndexMap<ContainerId, Vec<Color>>,
        demand: IndexMap<Color, usize>,
        attempts: u32,
    ) -> Self {
        Self {
            assignments,
            demand,
            attempts,
        }
    }

    /// Colors planned for `container`.
    pub fn get(&self, container: ContainerId) -> Option<&[Color]> {
        self.assignments.get(&container).map(Vec::as_slice)
    }

    /// Planned containers and their colors, in input order.
    pub fn iter(&self) -> impl Iterator<Item = (ContainerId, &[Color])> + '_ {
        self.assignments.iter().map(|(id, c)| (*id, c.as_slice()))
    }

    /// Number of planned containers.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the plan covers no containers.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Required supply per color: total capacity of containers with that home.
    pub fn demand(&self) -> &IndexMap<Color, usize> {
        &self.demand
    }

    /// Items of `color` assigned across all containers.
    pub fn supply_of(&self, color: Color) -> usize {
        self.assignments
            .values()
            .map(|list| list.iter().filter(|&&c| c == color).count())
            .sum()
    }

    /// The attempt (1-based) on which this plan was produced.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Consume the plan, yielding the per-container assignments.
    pub fn into_assignments(self) -> IndexMap<ContainerId, Vec<Color>> {
        self.assignments
    }
}
