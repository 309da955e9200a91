mod common;

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use terrain_graph::prelude::*;

const FAN_OUT: [usize; 4] = [1, 4, 16, 64];

/// `width` seeded noise leaves feeding one add node through a normalize each.
fn build_fan_in(dimensions: Dimensions, width: usize) -> (NodeGraph, NodeId) {
    let mut graph = NodeGraph::new();
    let root = graph.add_add(None);
    for i in 0..width {
        let leaf = graph.add_generator(WhiteNoiseGenerator::new(dimensions, Some(i as u64)));
        let normalized = graph.add_normalize(leaf).expect("leaf exists");
        graph
            .add_weighted_dependency(root, normalized, 1.0 / width as f64)
            .expect("valid edge");
    }
    (graph, root)
}

/// A terrain-like pipeline: diamond-square + voronoi mixed, blurred and masked.
fn build_pipeline(dimensions: Dimensions) -> (NodeGraph, NodeId) {
    let mut graph = NodeGraph::new();
    let terrain = graph.add_generator(DiamondSquareGenerator::new(dimensions, Some(1)));
    let voronoi = VoronoiGenerator::new(dimensions, Some(2)).with_point_count(32);
    let cells = graph.add_generator(voronoi);
    let mix = graph.add_mix(None);
    graph.add_weighted_dependency(mix, terrain, 0.7).expect("valid edge");
    graph.add_weighted_dependency(mix, cells, 0.3).expect("valid edge");
    let blur: Vec<Arc<dyn Effect>> =
        vec![Arc::new(GaussianBlurEffect::new(1.5, None).expect("valid blur"))];
    let smoothed = graph.add_image_effect(mix, blur).expect("mix exists");
    let shape = graph.add_generator(PyramidGenerator::new(dimensions, 0.9));
    let root = graph.add_mask(smoothed, shape).expect("nodes exist");
    (graph, root)
}

fn fan_in_benches(c: &mut Criterion) {
    let dimensions = Dimensions::square(128);
    let mut group = c.benchmark_group("execution/fan_in");
    for &width in &FAN_OUT {
        group.throughput(common::cells_throughput(dimensions));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            b.iter_batched(
                || build_fan_in(dimensions, width),
                |(graph, root)| black_box(graph.evaluate(root).expect("evaluates")),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn pipeline_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution/pipeline");
    for &side in &common::SIDES {
        let dimensions = Dimensions::square(side);
        group.throughput(common::cells_throughput(dimensions));
        group.bench_with_input(BenchmarkId::from_parameter(side), &dimensions, |b, &dims| {
            b.iter_batched(
                || build_pipeline(dims),
                |(graph, root)| black_box(graph.evaluate(root).expect("evaluates")),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn cached_benches(c: &mut Criterion) {
    let (graph, root) = build_pipeline(Dimensions::square(64));
    graph.execute(root).expect("evaluates");
    c.bench_function("execution/cached", |b| {
        b.iter(|| black_box(graph.evaluate(black_box(root)).expect("cached")));
    });
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = fan_in_benches, pipeline_benches, cached_benches
}
criterion_main!(benches);
