use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use horde_sim::config::GameConfig;
use horde_sim::grid::SpatialGrid;
use horde_sim::sim::SimState;
use horde_sim::targeting::{
    CandidateSource, FilterOrder, SampledPathCost, TargetCriteria, TargetSelector,
};
use std::hint::black_box;

const SEED: u64 = 0xB0A7;
const FRAMES_PER_ITER: u32 = 32;

fn session(agents: usize, staggered: bool) -> SimState {
    let config = GameConfig {
        staggered_updates: staggered,
        ..GameConfig::default()
    };
    let mut sim = SimState::with_config(SEED, config).expect("default config is valid");
    sim.spawn_random(agents);
    sim
}

/// Whole frames, with and without staggered updates.
fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_frame");
    for agents in [250usize, 500, 1000] {
        for staggered in [true, false] {
            let label = if staggered { "staggered" } else { "every_frame" };
            group.bench_function(format!("{label}_agents{agents}"), |b| {
                b.iter_batched(
                    || session(agents, staggered),
                    |mut sim| {
                        for _ in 0..FRAMES_PER_ITER {
                            black_box(sim.step_frame(16).stats);
                        }
                        sim
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

/// One target selection per live agent, grid retrieval vs a full scan.
fn bench_target_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_selection");
    let estimator = SampledPathCost {
        samples: 20,
        diagonal_penalty: 0.1,
        weight_by_health: false,
        same_archetype_factor: 1.0,
    };
    let criteria = TargetCriteria {
        max_distance: 20.0,
        min_health: 0.0,
        max_health: 1000.0,
        order: FilterOrder::DistanceFirst,
    };
    for agents in [250usize, 1000] {
        let sim = session(agents, true);
        let config = sim.config();
        let mut grid =
            SpatialGrid::new(config.field_size, config.cell_size).expect("default grid is valid");
        grid.rebuild(sim.agents());
        let mut selector = TargetSelector::new();

        for (label, source) in [
            ("grid", CandidateSource::Grid(&grid)),
            ("full_scan", CandidateSource::FullScan),
        ] {
            group.bench_function(format!("{label}_agents{agents}"), |b| {
                b.iter(|| {
                    for seeker in sim.agents() {
                        black_box(selector.select(
                            seeker,
                            sim.agents(),
                            source,
                            &criteria,
                            &estimator,
                        ));
                    }
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_frames, bench_target_selection);
criterion_main!(benches);
