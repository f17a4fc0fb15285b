//! Benchmarks for orientation generation, placement bookkeeping and candidate scoring.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use std::sync::Arc;
use stowage_core::{Config, MeritType};
use stowage_d3::orientation::generate_orientations;
use stowage_d3::{ClippingOracle, ComponentsSet, Container, Instance, Piece, Solution};

fn l_shape() -> ComponentsSet {
    let mut shape = ComponentsSet::new();
    shape
        .add_component(Vector3::zeros(), Vector3::new(4.0, 1.0, 1.0))
        .unwrap();
    shape
        .add_component(Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 3.0, 1.0))
        .unwrap();
    shape.seal().unwrap();
    shape
}

fn instance(pieces: usize) -> Arc<Instance> {
    let mut instance = Instance::new("bench");
    for i in 0..pieces {
        let s = 1.0 + (i % 4) as f64;
        instance
            .add_piece(Piece::cuboid(i, s, s + 1.0, 2.0).unwrap())
            .unwrap();
    }
    instance
        .add_container(Container::new(0, 40.0, 40.0, 40.0).unwrap())
        .unwrap();
    instance.seal(&ClippingOracle).unwrap();
    Arc::new(instance)
}

fn orientation_benchmark(c: &mut Criterion) {
    let shape = l_shape();
    c.bench_function("generate_orientations_l_shape", |b| {
        b.iter(|| black_box(generate_orientations(black_box(&shape)).unwrap()))
    });
}

fn bookkeeping_benchmark(c: &mut Criterion) {
    let solution = Solution::new(instance(50), Config::default().with_seed(1)).unwrap();
    c.bench_function("add_remove_50_pieces", |b| {
        b.iter(|| {
            let mut s = solution.clone();
            for p in 0..50 {
                let position = Vector3::new((p % 10) as f64 * 4.0, (p / 10) as f64 * 5.0, 0.0);
                s.add(0, p, 0, position).unwrap();
            }
            for p in 0..50 {
                s.remove(0, p).unwrap();
            }
            black_box(s.objective_value())
        })
    });
}

fn scoring_benchmark(c: &mut Criterion) {
    let config = Config::default()
        .with_merit_type(MeritType::EuclideanXYZ)
        .with_seed(1);
    let solution = Solution::new(instance(30), config).unwrap();
    c.bench_function("insert_best_30_pieces", |b| {
        b.iter(|| {
            let mut s = solution.clone();
            for p in 0..30 {
                s.insert_best(p, p).unwrap();
            }
            black_box(s.pieces_packed())
        })
    });
}

criterion_group!(
    benches,
    orientation_benchmark,
    bookkeeping_benchmark,
    scoring_benchmark
);
criterion_main!(benches);
