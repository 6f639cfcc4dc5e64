//! Criterion benchmarks for allocation planning.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use traymatch_core::{Color, ContainerId, ContainerShape};
use traymatch_plan::{AllocationPlanner, BlockedSpec, ContainerSpec};

/// Twenty mixed-size containers cycling through five home colors.
fn level_specs() -> Vec<ContainerSpec> {
    let sizes = [(1, 1), (2, 1), (1, 2), (2, 2)];
    (0..20u32)
        .map(|i| {
            let (w, d) = sizes[i as usize % sizes.len()];
            let home = Color::ALL[i as usize % 5];
            let shape = ContainerShape::new(w, d, home).expect("bench shape");
            ContainerSpec::new(ContainerId(i), shape)
        })
        .collect()
}

fn bench_plan(c: &mut Criterion) {
    let planner = AllocationPlanner::default();
    let specs = level_specs();
    let blocked = [BlockedSpec {
        container: ContainerId(19),
        unlock_requirement: 4,
    }];

    c.bench_function("plan_20_containers", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(0x7a7);
        b.iter(|| black_box(planner.plan(black_box(&specs), &[], &mut rng)))
    });

    c.bench_function("plan_20_containers_gated", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(0x7a7);
        b.iter(|| black_box(planner.plan(black_box(&specs), &blocked, &mut rng)))
    });
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
