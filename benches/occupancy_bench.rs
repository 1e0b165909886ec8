use criterion::{black_box, criterion_group, criterion_main, Criterion};

use road_occupancy::core::types::AgentId;
use road_occupancy::occupancy::OccupancyTracker;
use road_occupancy::path::Waypoint;

fn ring_path(start: u64, len: u64) -> Vec<Waypoint> {
    (0..len)
        .map(|i| {
            let point = (start + i) % 10_000;
            Waypoint::new(point, point / 20)
        })
        .collect()
}

fn bench_registration(c: &mut Criterion) {
    let paths: Vec<Vec<Waypoint>> = (0..1000).map(|a| ring_path(a * 9, 200)).collect();

    c.bench_function("register_unbuffered_1000x200", |b| {
        let mut tracker = OccupancyTracker::new();
        b.iter(|| {
            for (a, path) in paths.iter().enumerate() {
                tracker.register_unbuffered(AgentId(a as u32), path);
            }
        })
    });

    c.bench_function("register_sampled_1000x200", |b| {
        let mut tracker = OccupancyTracker::new();
        b.iter(|| {
            for (a, path) in paths.iter().enumerate() {
                tracker.register_sampled(AgentId(a as u32), path);
            }
        })
    });
}

fn bench_queries(c: &mut Criterion) {
    let mut tracker = OccupancyTracker::new();
    for a in 0..1000u32 {
        tracker.register_sampled(AgentId(a), &ring_path(u64::from(a) * 9, 200));
    }

    c.bench_function("overlapping_agents_1000", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for a in 0..1000u32 {
                total += tracker.overlapping_agents(black_box(AgentId(a))).len();
            }
            total
        })
    });
}

criterion_group!(benches, bench_registration, bench_queries);
criterion_main!(benches);
