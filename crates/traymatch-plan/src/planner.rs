//! The allocation planner and its configuration.
//!
//! One planning *attempt* builds a bag holding every item the level needs,
//! shuffles it, then fills containers in input order. Each draw picks
//! uniformly among the bag entries that satisfy three caps:
//!
//! 1. **Match cap**: at most `⌊capacity × match_ratio⌋` items of the
//!    container's own home color.
//! 2. **Palette cap**: at most `palette_cap` distinct colors per container.
//! 3. **Supply cap**: never more of a color than the level demands.
//!
//! An attempt fails as soon as one container has no eligible draw. Failed
//! attempts are retried from scratch up to a bounded count.

use indexmap::{IndexMap, IndexSet};
use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, info, warn};
use traymatch_core::{Color, ContainerId};

use crate::error::{PlanError, PlanFailure};
use crate::plan::AllocationPlan;
use crate::spec::{BlockedSpec, ContainerSpec};

// ── PlannerConfig ──────────────────────────────────────────────────

/// Tuning for [`AllocationPlanner`].
#[derive(Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    /// Attempts when no self-sufficiency check applies. Default: 10.
    pub max_attempts: u32,
    /// Attempts when the self-sufficiency check applies. Default: 30.
    pub max_attempts_blocked: u32,
    /// Fraction of capacity that may start as home color. Default: 0.75.
    pub match_ratio: f64,
    /// Maximum distinct colors per container. Default: 3.
    pub palette_cap: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_attempts_blocked: 30,
            match_ratio: 0.75,
            palette_cap: 3,
        }
    }
}

impl PlannerConfig {
    /// Check that the configuration can produce plans at all.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.max_attempts == 0 || self.max_attempts_blocked == 0 {
            return Err(PlanError::InvalidConfig {
                reason: "attempt limits must be at least 1".into(),
            });
        }
        if !self.match_ratio.is_finite() || !(0.0..=1.0).contains(&self.match_ratio) {
            return Err(PlanError::InvalidConfig {
                reason: format!("match_ratio {} outside [0, 1]", self.match_ratio),
            });
        }
        if self.palette_cap == 0 {
            return Err(PlanError::InvalidConfig {
                reason: "palette_cap must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Home-color items a container of `capacity` may start with.
    pub fn match_cap(&self, capacity: usize) -> usize {
        (capacity as f64 * self.match_ratio).floor() as usize
    }
}

// ── AllocationPlanner ──────────────────────────────────────────────

/// Produces [`AllocationPlan`]s for a level's containers.
#[derive(Clone, Debug, Default)]
pub struct AllocationPlanner {
    config: PlannerConfig,
}

impl AllocationPlanner {
    /// Create a planner with the given tuning.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// The planner's tuning.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Assign item colors to `containers`.
    ///
    /// `containers` must list every container the level will ever hold,
    /// including gated and spawner-queued ones, since supply is derived from
    /// the full set. `blocked` names the gated subset and their unlock
    /// requirements.
    ///
    /// When the smallest unlock requirement is at least the number of
    /// always-available containers, no gated container can open before the
    /// available ones are solved, so each attempt must also leave that
    /// subset self-sufficient. The attempt limit is raised accordingly.
    ///
    /// # Errors
    ///
    /// [`PlanError::Infeasible`] once every attempt fails. Input problems
    /// (duplicate ids, unknown blocked ids, bad config) are reported before
    /// any attempt is made.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        containers: &[ContainerSpec],
        blocked: &[BlockedSpec],
        rng: &mut R,
    ) -> Result<AllocationPlan, PlanError> {
        self.config.validate()?;

        let mut ids = IndexSet::with_capacity(containers.len());
        for spec in containers {
            if !ids.insert(spec.id) {
                return Err(PlanError::DuplicateContainer { container: spec.id });
            }
        }
        let mut gated: IndexSet<ContainerId> = IndexSet::with_capacity(blocked.len());
        for b in blocked {
            if !ids.contains(&b.container) {
                return Err(PlanError::UnknownBlocked {
                    container: b.container,
                });
            }
            gated.insert(b.container);
        }

        let demand = demand_of(containers);
        let available: Vec<&ContainerSpec> = containers
            .iter()
            .filter(|spec| !gated.contains(&spec.id))
            .collect();
        let check_subset = blocked
            .iter()
            .map(|b| b.unlock_requirement as usize)
            .min()
            .is_some_and(|min_req| min_req >= available.len());
        let max_attempts = if check_subset {
            self.config.max_attempts_blocked
        } else {
            self.config.max_attempts
        };

        debug!(
            containers = containers.len(),
            gated = gated.len(),
            check_subset,
            max_attempts,
            "planning allocation"
        );

        let mut last_failure = None;
        for attempt in 1..=max_attempts {
            let outcome = self.attempt(containers, &demand, rng).and_then(|assignments| {
                if check_subset {
                    self_sufficient(&available, &assignments)?;
                }
                Ok(assignments)
            });
            match outcome {
                Ok(assignments) => {
                    info!(attempt, containers = containers.len(), "allocation planned");
                    return Ok(AllocationPlan::new(assignments, demand, attempt));
                }
                Err(failure) => {
                    debug!(attempt, %failure, "allocation attempt failed");
                    last_failure = Some(failure);
                }
            }
        }

        // max_attempts >= 1 after validate(), so at least one failure was recorded.
        let last_failure = last_failure.ok_or_else(|| PlanError::InvalidConfig {
            reason: "no attempts were made".into(),
        })?;
        warn!(attempts = max_attempts, %last_failure, "allocation infeasible");
        Err(PlanError::Infeasible {
            attempts: max_attempts,
            last_failure,
        })
    }

    fn attempt<R: Rng + ?Sized>(
        &self,
        containers: &[ContainerSpec],
        demand: &IndexMap<Color, usize>,
        rng: &mut R,
    ) -> Result<IndexMap<ContainerId, Vec<Color>>, PlanFailure> {
        let mut bag: Vec<Color> = demand
            .iter()
            .flat_map(|(&color, &n)| std::iter::repeat_n(color, n))
            .collect();
        bag.shuffle(rng);

        let mut drawn: IndexMap<Color, usize> = IndexMap::with_capacity(demand.len());
        let mut assignments = IndexMap::with_capacity(containers.len());
        let mut candidates = Vec::with_capacity(bag.len());

        for spec in containers {
            let capacity = spec.capacity();
            let home = spec.home();
            let match_cap = self.config.match_cap(capacity);
            let mut colors = Vec::with_capacity(capacity);
            let mut palette: SmallVec<[Color; 4]> = SmallVec::new();
            let mut matches = 0usize;

            while colors.len() < capacity {
                candidates.clear();
                candidates.extend(bag.iter().enumerate().filter_map(|(i, &color)| {
                    let supply_ok = drawn.get(&color).copied().unwrap_or(0)
                        < demand.get(&color).copied().unwrap_or(0);
                    let palette_ok =
                        palette.contains(&color) || palette.len() < self.config.palette_cap;
                    let match_ok = color != home || matches < match_cap;
                    (supply_ok && palette_ok && match_ok).then_some(i)
                }));

                if candidates.is_empty() {
                    return Err(PlanFailure::NoCandidate {
                        container: spec.id,
                        filled: colors.len(),
                        capacity,
                    });
                }

                let pick = candidates[rng.random_range(0..candidates.len())];
                let color = bag.remove(pick);
                *drawn.entry(color).or_insert(0) += 1;
                if !palette.contains(&color) {
                    palette.push(color);
                }
                if color == home {
                    matches += 1;
                }
                colors.push(color);
            }

            assignments.insert(spec.id, colors);
        }

        Ok(assignments)
    }
}

/// Total capacity per home color, in first-seen order.
fn demand_of(containers: &[ContainerSpec]) -> IndexMap<Color, usize> {
    let mut demand = IndexMap::new();
    for spec in containers {
        *demand.entry(spec.home()).or_insert(0) += spec.capacity();
    }
    demand
}

/// For every color, items held by other-home available containers must
/// cover what that color's available home containers still lack.
fn self_sufficient(
    available: &[&ContainerSpec],
    assignments: &IndexMap<ContainerId, Vec<Color>>,
) -> Result<(), PlanFailure> {
    let mut surplus: IndexMap<Color, usize> = IndexMap::new();
    let mut shortfall: IndexMap<Color, usize> = IndexMap::new();

    for spec in available {
        let Some(colors) = assignments.get(&spec.id) else {
            continue;
        };
        let home = spec.home();
        let at_home = colors.iter().filter(|&&c| c == home).count();
        *shortfall.entry(home).or_insert(0) += spec.capacity() - at_home;
        for &color in colors.iter().filter(|&&c| c != home) {
            *surplus.entry(color).or_insert(0) += 1;
        }
    }

    for (&color, &need) in &shortfall {
        let have = surplus.get(&color).copied().unwrap_or(0);
        if have < need {
            return Err(PlanFailure::NotSelfSufficient {
                color,
                surplus: have,
                shortfall: need,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use traymatch_core::ContainerShape;

    fn spec(id: u32, w: u32, d: u32, home: Color) -> ContainerSpec {
        ContainerSpec::new(
            ContainerId(id),
            ContainerShape::new(w, d, home).expect("valid shape"),
        )
    }

    fn assert_composition(plan: &AllocationPlan, specs: &[ContainerSpec], cfg: &PlannerConfig) {
        for s in specs {
            let colors = plan.get(s.id).expect("every container planned");
            assert_eq!(colors.len(), s.capacity(), "{} filled to capacity", s.id);
            let at_home = colors.iter().filter(|&&c| c == s.home()).count();
            assert!(at_home <= cfg.match_cap(s.capacity()), "{} over match cap", s.id);
            let mut distinct: Vec<Color> = colors.to_vec();
            distinct.sort();
            distinct.dedup();
            assert!(distinct.len() <= cfg.palette_cap, "{} over palette cap", s.id);
        }
        for (&color, &need) in plan.demand() {
            assert_eq!(plan.supply_of(color), need, "{color} supply matches demand");
        }
    }

    fn mixed_level() -> Vec<ContainerSpec> {
        vec![
            spec(1, 1, 1, Color::Red),
            spec(2, 1, 1, Color::Blue),
            spec(3, 1, 1, Color::Green),
            spec(4, 2, 1, Color::Red),
            spec(5, 2, 1, Color::Blue),
            spec(6, 1, 2, Color::Green),
            spec(7, 1, 1, Color::Yellow),
            spec(8, 1, 1, Color::Yellow),
        ]
    }

    #[test]
    fn default_config_values() {
        let cfg = PlannerConfig::default();
        assert_eq!(cfg.max_attempts, 10);
        assert_eq!(cfg.max_attempts_blocked, 30);
        assert_eq!(cfg.palette_cap, 3);
        assert_eq!(cfg.match_cap(4), 3);
        assert_eq!(cfg.match_cap(8), 6);
        assert_eq!(cfg.match_cap(6), 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_config_rejected() {
        let planner = AllocationPlanner::new(PlannerConfig {
            match_ratio: 1.5,
            ..PlannerConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        match planner.plan(&mixed_level(), &[], &mut rng) {
            Err(PlanError::InvalidConfig { .. }) => {}
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn empty_level_plans_trivially() {
        let planner = AllocationPlanner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let plan = planner.plan(&[], &[], &mut rng).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.attempts(), 1);
    }

    #[test]
    fn demand_is_capacity_by_home() {
        let specs = mixed_level();
        let demand = demand_of(&specs);
        assert_eq!(demand[&Color::Red], 4 + 8);
        assert_eq!(demand[&Color::Blue], 4 + 8);
        assert_eq!(demand[&Color::Green], 4 + 8);
        assert_eq!(demand[&Color::Yellow], 8);
    }

    #[test]
    fn some_seed_produces_valid_plan() {
        let planner = AllocationPlanner::default();
        let specs = mixed_level();
        let mut successes = 0;
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            if let Ok(plan) = planner.plan(&specs, &[], &mut rng) {
                assert_composition(&plan, &specs, planner.config());
                successes += 1;
            }
        }
        assert!(successes > 0, "no seed produced a plan");
    }

    #[test]
    fn same_seed_same_outcome() {
        let planner = AllocationPlanner::default();
        let specs = mixed_level();
        let a = planner.plan(&specs, &[], &mut ChaCha8Rng::seed_from_u64(42));
        let b = planner.plan(&specs, &[], &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn lone_container_is_infeasible() {
        // Four red slots, only red supply, but at most three may start red.
        let planner = AllocationPlanner::default();
        let specs = [spec(1, 1, 1, Color::Red)];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        match planner.plan(&specs, &[], &mut rng) {
            Err(PlanError::Infeasible {
                attempts,
                last_failure: PlanFailure::NoCandidate { container, filled, capacity },
            }) => {
                assert_eq!(attempts, 10);
                assert_eq!(container, ContainerId(1));
                assert_eq!(filled, 3);
                assert_eq!(capacity, 4);
            }
            other => panic!("expected Infeasible, got {other:?}"),
        }
    }

    #[test]
    fn unsolvable_available_subset_uses_blocked_limit() {
        // The lone available container can never complete itself: its
        // fourth red item is held by the gated container.
        let planner = AllocationPlanner::default();
        let specs = [spec(1, 1, 1, Color::Red), spec(2, 1, 1, Color::Blue)];
        let blocked = [BlockedSpec {
            container: ContainerId(2),
            unlock_requirement: 1,
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        match planner.plan(&specs, &blocked, &mut rng) {
            Err(PlanError::Infeasible {
                attempts,
                last_failure: PlanFailure::NotSelfSufficient { color, .. },
            }) => {
                assert_eq!(attempts, 30);
                assert_eq!(color, Color::Red);
            }
            other => panic!("expected NotSelfSufficient, got {other:?}"),
        }
    }

    #[test]
    fn low_unlock_requirement_skips_subset_check() {
        // Requirement 1 < 2 available containers: no subset check, so the
        // gated container may hold items the others need.
        let planner = AllocationPlanner::default();
        let specs = [
            spec(1, 1, 1, Color::Red),
            spec(2, 1, 1, Color::Blue),
            spec(3, 1, 1, Color::Green),
        ];
        let blocked = [BlockedSpec {
            container: ContainerId(3),
            unlock_requirement: 1,
        }];
        let mut successes = 0;
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            match planner.plan(&specs, &blocked, &mut rng) {
                Ok(plan) => {
                    assert_composition(&plan, &specs, planner.config());
                    successes += 1;
                }
                Err(PlanError::Infeasible { attempts, last_failure }) => {
                    assert_eq!(attempts, 10);
                    assert!(matches!(last_failure, PlanFailure::NoCandidate { .. }));
                }
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        assert!(successes > 0);
    }

    #[test]
    fn self_sufficient_subset_accepted() {
        let specs = [spec(1, 1, 1, Color::Red), spec(2, 1, 1, Color::Blue)];
        let available: Vec<&ContainerSpec> = specs.iter().collect();
        let mut assignments = IndexMap::new();
        assignments.insert(
            ContainerId(1),
            vec![Color::Red, Color::Red, Color::Blue, Color::Blue],
        );
        assignments.insert(
            ContainerId(2),
            vec![Color::Blue, Color::Blue, Color::Red, Color::Red],
        );
        assert!(self_sufficient(&available, &assignments).is_ok());

        assignments.insert(
            ContainerId(2),
            vec![Color::Blue, Color::Blue, Color::Red, Color::Green],
        );
        assert_eq!(
            self_sufficient(&available, &assignments),
            Err(PlanFailure::NotSelfSufficient {
                color: Color::Red,
                surplus: 1,
                shortfall: 2,
            })
        );
    }

    #[test]
    fn duplicate_container_rejected() {
        let planner = AllocationPlanner::default();
        let specs = [spec(1, 1, 1, Color::Red), spec(1, 1, 1, Color::Blue)];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            planner.plan(&specs, &[], &mut rng),
            Err(PlanError::DuplicateContainer {
                container: ContainerId(1)
            })
        );
    }

    #[test]
    fn unknown_blocked_rejected() {
        let planner = AllocationPlanner::default();
        let specs = [spec(1, 1, 1, Color::Red)];
        let blocked = [BlockedSpec {
            container: ContainerId(9),
            unlock_requirement: 1,
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            planner.plan(&specs, &blocked, &mut rng),
            Err(PlanError::UnknownBlocked {
                container: ContainerId(9)
            })
        );
    }

    fn arb_specs() -> impl Strategy<Value = Vec<ContainerSpec>> {
        prop::collection::vec((1u32..=2, 1u32..=2, 0usize..4), 2..8).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (w, d, c))| spec(i as u32, w, d, Color::ALL[c]))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn successful_plans_conserve_supply_and_respect_caps(
            specs in arb_specs(),
            seed in any::<u64>(),
        ) {
            let planner = AllocationPlanner::default();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            match planner.plan(&specs, &[], &mut rng) {
                Ok(plan) => assert_composition(&plan, &specs, planner.config()),
                Err(PlanError::Infeasible { attempts, .. }) => prop_assert_eq!(attempts, 10),
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
