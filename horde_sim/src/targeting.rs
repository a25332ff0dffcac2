// Target selection pipeline.
//
// Picks the best target for a seeker in four stages, always in this order:
//
//   1. Retrieval: candidate ids from a `CandidateSource`, either a full scan of the
//      agent store or a `SpatialGrid::query_within` block around the seeker.
//      Dead agents and the seeker itself are never retrieved. Both sources
//      yield ids in ascending order.
//   2. Cheap filters: planar distance (squared, no square root) and the
//      health band `[min_health, max_health]`, in the order chosen by
//      `FilterOrder`. The filters commute, so the survivors are the same
//      either way; only the work done differs.
//   3. Cost ranking: the `CostEstimator` is called once per survivor, and
//      survivors are sorted ascending by cost. The sort is stable, so equal
//      costs keep retrieval order.
//   4. Pick: the cheapest survivor, if any.
//
// The expensive estimator therefore only ever sees candidates that passed the
// cheap filters. `TargetSelector` owns the scratch buffers for every stage
// and reuses them across runs; `PipelineStats` records how much each stage
// saw on the last run.
//
// See also: `nodes.rs` (`Search` is the in-tree caller), `grid.rs`.

use crate::agent::Agent;
use crate::grid::SpatialGrid;
use crate::types::AgentId;
use serde::{Deserialize, Serialize};

/// Where stage 1 gets its candidates from.
#[derive(Clone, Copy, Debug)]
pub enum CandidateSource<'a> {
    FullScan,
    Grid(&'a SpatialGrid),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOrder {
    #[default]
    DistanceFirst,
    AttributeFirst,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetCriteria {
    pub max_distance: f32,
    pub min_health: f32,
    pub max_health: f32,
    pub order: FilterOrder,
}

/// Per-candidate cost used for ranking. Lower is better.
pub trait CostEstimator {
    fn estimate(&self, seeker: &Agent, candidate: &Agent) -> f32;
}

/// Stand-in path cost: marches from the seeker to the candidate in
/// `samples` equal steps, each costing its length plus a penalty for
/// diagonal travel. Optionally scaled by the candidate's health fraction so
/// weakened targets rank first, and by `same_archetype_factor` when the
/// candidate shares the seeker's archetype (1.0 disables that).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampledPathCost {
    pub samples: u32,
    pub diagonal_penalty: f32,
    pub weight_by_health: bool,
    pub same_archetype_factor: f32,
}

impl CostEstimator for SampledPathCost {
    fn estimate(&self, seeker: &Agent, candidate: &Agent) -> f32 {
        let distance = seeker.position.planar_distance(candidate.position);
        let samples = self.samples.max(1);
        let step = distance / samples as f32;
        let dx = candidate.position.x - seeker.position.x;
        let dz = candidate.position.z - seeker.position.z;
        // |sin θ · cos θ| of the heading, without trig: peaks at 0.5 on the
        // diagonals and is zero along the axes.
        let diagonal = if distance > 0.0 {
            (dx * dz).abs() / (distance * distance)
        } else {
            0.0
        };
        let mut cost = 0.0;
        for _ in 0..samples {
            cost += step + step * self.diagonal_penalty * diagonal;
        }
        if self.weight_by_health {
            cost *= candidate.health_fraction();
        }
        if candidate.archetype == seeker.archetype {
            cost *= self.same_archetype_factor;
        }
        cost
    }
}

/// Straight-line distance; the cheapest possible estimator.
#[derive(Clone, Copy, Debug, Default)]
pub struct StraightLineCost;

impl CostEstimator for StraightLineCost {
    fn estimate(&self, seeker: &Agent, candidate: &Agent) -> f32 {
        seeker.position.planar_distance(candidate.position)
    }
}

/// Work done by the last pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub retrieved: usize,
    /// Candidates left after whichever filter `FilterOrder` runs first. The
    /// second filter does this much work, so a lower number means the
    /// ordering paid off.
    pub after_first_filter: usize,
    pub survivors: usize,
    pub cost_evaluations: usize,
}

#[derive(Clone, Debug, Default)]
pub struct TargetSelector {
    retrieved: Vec<AgentId>,
    survivors: Vec<AgentId>,
    ranked: Vec<(f32, AgentId)>,
    last_stats: PipelineStats,
}

impl TargetSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run all four stages and return the chosen target.
    pub fn select<C: CostEstimator + ?Sized>(
        &mut self,
        seeker: &Agent,
        agents: &[Agent],
        source: CandidateSource<'_>,
        criteria: &TargetCriteria,
        estimator: &C,
    ) -> Option<AgentId> {
        self.retrieve(seeker, agents, source, criteria.max_distance);
        let after_first_filter = self.filter(seeker, agents, criteria);
        self.rank(seeker, agents, estimator);
        self.last_stats = PipelineStats {
            retrieved: self.retrieved.len(),
            after_first_filter,
            survivors: self.survivors.len(),
            cost_evaluations: self.ranked.len(),
        };
        self.ranked.first().map(|&(_, id)| id)
    }

    /// Candidates from the last run, cheapest first.
    pub fn ranked(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.ranked.iter().map(|&(_, id)| id)
    }

    pub fn last_stats(&self) -> PipelineStats {
        self.last_stats
    }

    fn retrieve(
        &mut self,
        seeker: &Agent,
        agents: &[Agent],
        source: CandidateSource<'_>,
        max_distance: f32,
    ) {
        match source {
            CandidateSource::FullScan => {
                self.retrieved.clear();
                self.retrieved.extend(
                    agents
                        .iter()
                        .filter(|a| a.id != seeker.id && a.is_alive())
                        .map(|a| a.id),
                );
            }
            CandidateSource::Grid(grid) => grid.query_within(
                seeker.position,
                max_distance,
                Some(seeker.id),
                agents,
                &mut self.retrieved,
            ),
        }
    }

    /// Returns the survivor count between the two filters.
    fn filter(&mut self, seeker: &Agent, agents: &[Agent], criteria: &TargetCriteria) -> usize {
        self.survivors.clear();
        self.survivors.extend_from_slice(&self.retrieved);
        let max_sq = criteria.max_distance * criteria.max_distance;
        let within_distance = |id: &AgentId| {
            seeker.position.planar_distance_sq(agents[id.index()].position) <= max_sq
        };
        let within_band = |id: &AgentId| {
            let health = agents[id.index()].stats.health;
            health >= criteria.min_health && health <= criteria.max_health
        };
        match criteria.order {
            FilterOrder::DistanceFirst => {
                self.survivors.retain(within_distance);
                let after_first = self.survivors.len();
                self.survivors.retain(within_band);
                after_first
            }
            FilterOrder::AttributeFirst => {
                self.survivors.retain(within_band);
                let after_first = self.survivors.len();
                self.survivors.retain(within_distance);
                after_first
            }
        }
    }

    fn rank<C: CostEstimator + ?Sized>(&mut self, seeker: &Agent, agents: &[Agent], estimator: &C) {
        self.ranked.clear();
        self.ranked.extend(
            self.survivors
                .iter()
                .map(|&id| (estimator.estimate(seeker, &agents[id.index()]), id)),
        );
        // Stable: equal costs keep retrieval order.
        self.ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::default_archetype;
    use crate::prng::GameRng;
    use crate::types::{Archetype, Vec3};
    use std::cell::Cell;

    fn spawn_field(seed: u64, count: u32) -> Vec<Agent> {
        let mut rng = GameRng::new(seed);
        (0..count)
            .map(|i| {
                let archetype = Archetype::ALL[(i as usize) % Archetype::ALL.len()];
                let pos = Vec3::flat(rng.range_f32(-50.0, 50.0), rng.range_f32(-50.0, 50.0));
                Agent::spawn(
                    AgentId(i),
                    archetype,
                    &default_archetype(archetype),
                    pos,
                    0,
                    0.2,
                    0.2,
                    &mut rng,
                )
            })
            .collect()
    }

    fn criteria(order: FilterOrder) -> TargetCriteria {
        TargetCriteria {
            max_distance: 20.0,
            min_health: 10.0,
            max_health: 100.0,
            order,
        }
    }

    /// Counts how often it is called, to check cost only runs on survivors.
    struct CountingCost {
        calls: Cell<usize>,
    }

    impl CostEstimator for CountingCost {
        fn estimate(&self, seeker: &Agent, candidate: &Agent) -> f32 {
            self.calls.set(self.calls.get() + 1);
            seeker.position.planar_distance(candidate.position)
        }
    }

    #[test]
    fn grid_and_full_scan_agree() {
        let agents = spawn_field(9, 500);
        let mut grid = SpatialGrid::new(100.0, 10.0).unwrap();
        grid.rebuild(&agents);
        let cost = SampledPathCost {
            samples: 20,
            diagonal_penalty: 0.1,
            weight_by_health: false,
            same_archetype_factor: 1.0,
        };
        let mut scan = TargetSelector::new();
        let mut gridded = TargetSelector::new();
        for seeker in agents.iter().take(100) {
            let c = criteria(FilterOrder::DistanceFirst);
            let a = scan.select(seeker, &agents, CandidateSource::FullScan, &c, &cost);
            let b = gridded.select(seeker, &agents, CandidateSource::Grid(&grid), &c, &cost);
            assert_eq!(a, b);
            assert_eq!(scan.ranked().collect::<Vec<_>>(), gridded.ranked().collect::<Vec<_>>());
            assert!(gridded.last_stats().retrieved <= scan.last_stats().retrieved);
        }
    }

    #[test]
    fn filter_order_does_not_change_selection() {
        let agents = spawn_field(31, 400);
        let cost = StraightLineCost;
        let mut selector = TargetSelector::new();
        let mut distance_first_work = 0;
        let mut attribute_first_work = 0;
        for seeker in agents.iter().take(80) {
            let a = selector.select(
                seeker,
                &agents,
                CandidateSource::FullScan,
                &criteria(FilterOrder::DistanceFirst),
                &cost,
            );
            let stats_a = selector.last_stats();
            let ranked_a: Vec<_> = selector.ranked().collect();
            let b = selector.select(
                seeker,
                &agents,
                CandidateSource::FullScan,
                &criteria(FilterOrder::AttributeFirst),
                &cost,
            );
            let stats_b = selector.last_stats();
            assert_eq!(a, b);
            assert_eq!(stats_a.retrieved, stats_b.retrieved);
            assert_eq!(stats_a.survivors, stats_b.survivors);
            assert_eq!(stats_a.cost_evaluations, stats_b.cost_evaluations);
            assert_eq!(ranked_a, selector.ranked().collect::<Vec<_>>());
            distance_first_work += stats_a.after_first_filter;
            attribute_first_work += stats_b.after_first_filter;
        }
        // A 20-unit radius keeps far fewer agents than the health band, so
        // filtering by distance first leaves less for the second filter.
        assert!(distance_first_work < attribute_first_work);
    }

    #[test]
    fn cost_is_computed_once_per_survivor() {
        let agents = spawn_field(5, 300);
        let mut selector = TargetSelector::new();
        for seeker in agents.iter().take(50) {
            let cost = CountingCost { calls: Cell::new(0) };
            selector.select(
                seeker,
                &agents,
                CandidateSource::FullScan,
                &criteria(FilterOrder::AttributeFirst),
                &cost,
            );
            let stats = selector.last_stats();
            assert_eq!(cost.calls.get(), stats.survivors);
            assert_eq!(stats.cost_evaluations, stats.survivors);
        }
    }

    #[test]
    fn health_band_is_inclusive() {
        let mut agents = spawn_field(1, 3);
        for a in &mut agents {
            a.position = Vec3::ZERO;
        }
        agents[1].stats.health = 10.0;
        agents[2].stats.health = 100.5;
        let mut selector = TargetSelector::new();
        let picked = selector.select(
            &agents[0],
            &agents,
            CandidateSource::FullScan,
            &criteria(FilterOrder::DistanceFirst),
            &StraightLineCost,
        );
        assert_eq!(picked, Some(AgentId(1)));
        assert_eq!(selector.last_stats().survivors, 1);
    }

    #[test]
    fn equal_costs_keep_retrieval_order() {
        let mut agents = spawn_field(2, 4);
        agents[0].position = Vec3::ZERO;
        for a in agents.iter_mut().skip(1) {
            a.position = Vec3::flat(5.0, 0.0);
            a.stats.health = 50.0;
        }
        let mut selector = TargetSelector::new();
        let picked = selector.select(
            &agents[0],
            &agents,
            CandidateSource::FullScan,
            &criteria(FilterOrder::DistanceFirst),
            &StraightLineCost,
        );
        assert_eq!(picked, Some(AgentId(1)));
        assert_eq!(
            selector.ranked().collect::<Vec<_>>(),
            vec![AgentId(1), AgentId(2), AgentId(3)]
        );
    }

    #[test]
    fn dead_and_self_are_never_candidates() {
        let mut agents = spawn_field(3, 3);
        for a in &mut agents {
            a.position = Vec3::ZERO;
            a.stats.health = 50.0;
        }
        agents[1].take_damage(1000.0);
        let mut selector = TargetSelector::new();
        selector.select(
            &agents[0],
            &agents,
            CandidateSource::FullScan,
            &criteria(FilterOrder::DistanceFirst),
            &StraightLineCost,
        );
        assert_eq!(selector.ranked().collect::<Vec<_>>(), vec![AgentId(2)]);
        assert_eq!(selector.last_stats().retrieved, 1);
    }

    #[test]
    fn empty_field_selects_nothing() {
        let agents = spawn_field(4, 1);
        let mut selector = TargetSelector::new();
        let picked = selector.select(
            &agents[0],
            &agents,
            CandidateSource::FullScan,
            &criteria(FilterOrder::DistanceFirst),
            &StraightLineCost,
        );
        assert_eq!(picked, None);
        assert_eq!(selector.last_stats(), PipelineStats::default());
    }

    #[test]
    fn health_weighting_prefers_wounded() {
        let mut agents = spawn_field(8, 3);
        agents[0].position = Vec3::ZERO;
        agents[1].position = Vec3::flat(4.0, 0.0);
        agents[2].position = Vec3::flat(8.0, 0.0);
        agents[2].stats.health = agents[2].stats.max_health * 0.1;
        let cost = SampledPathCost {
            samples: 20,
            diagonal_penalty: 0.1,
            weight_by_health: true,
            same_archetype_factor: 1.0,
        };
        let mut selector = TargetSelector::new();
        let c = TargetCriteria {
            max_distance: 20.0,
            min_health: 0.0,
            max_health: 1000.0,
            order: FilterOrder::DistanceFirst,
        };
        let picked = selector.select(&agents[0], &agents, CandidateSource::FullScan, &c, &cost);
        assert_eq!(picked, Some(AgentId(2)));
    }

    #[test]
    fn same_archetype_factor_scales_cost() {
        let agents = spawn_field(6, 7);
        let mut seeker = agents[0].clone();
        seeker.position = Vec3::ZERO;
        let mut kin = agents[6].clone();
        kin.position = Vec3::flat(10.0, 0.0);
        let mut other = agents[1].clone();
        other.position = Vec3::flat(10.0, 0.0);
        assert_eq!(kin.archetype, seeker.archetype);
        assert_ne!(other.archetype, seeker.archetype);
        let cost = SampledPathCost {
            samples: 20,
            diagonal_penalty: 0.1,
            weight_by_health: false,
            same_archetype_factor: 0.8,
        };
        assert!((cost.estimate(&seeker, &kin) - 8.0).abs() < 1e-3);
        assert!((cost.estimate(&seeker, &other) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn sampled_cost_penalizes_diagonals() {
        let agents = spawn_field(6, 3);
        let mut seeker = agents[0].clone();
        seeker.position = Vec3::ZERO;
        let mut straight = agents[1].clone();
        straight.position = Vec3::flat(10.0, 0.0);
        let mut diagonal = agents[2].clone();
        diagonal.position = Vec3::flat(10.0 / 2f32.sqrt(), 10.0 / 2f32.sqrt());
        let cost = SampledPathCost {
            samples: 20,
            diagonal_penalty: 0.1,
            weight_by_health: false,
            same_archetype_factor: 1.0,
        };
        let s = cost.estimate(&seeker, &straight);
        let d = cost.estimate(&seeker, &diagonal);
        assert!((s - 10.0).abs() < 1e-3);
        assert!(d > s);
    }
}
