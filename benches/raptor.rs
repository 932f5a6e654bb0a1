use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use raptor_core::RaptorEngine;
use scenarios::{access, default_params, random_network};

fn build_scenario() -> (raptor_core::GraphView<scenarios::DemoModel>, Vec<raptor_core::InitialStop<scenarios::DemoModel>>, Vec<raptor_core::InitialStop<scenarios::DemoModel>>, raptor_core::RaptorParameters<scenarios::Mode>) {
    let graph = random_network(7, 400, 60, 12, 40);
    let access_stops = vec![access(0, 120, 0.0)];
    let egress_stops = vec![access(399, 120, 0.0)];
    let params = default_params();
    (graph, access_stops, egress_stops, params)
}

fn single_departure_benchmark(c: &mut Criterion) {
    let (graph, access_stops, egress_stops, params) = build_scenario();
    let mut engine = RaptorEngine::new(&graph);
    c.bench_function("calc_least_cost_route", |b| {
        b.iter(|| engine.calc_least_cost_route(black_box(6 * 3600), black_box(0), black_box(399), &access_stops, &egress_stops, &params))
    });
}

fn window_query_benchmark(c: &mut Criterion) {
    let (graph, access_stops, egress_stops, params) = build_scenario();
    let mut engine = RaptorEngine::new(&graph);
    c.bench_function("calc_routes", |b| {
        b.iter(|| {
            engine.calc_routes(
                black_box(6 * 3600),
                black_box(6 * 3600 + 30 * 60),
                black_box(7 * 3600),
                black_box(0),
                black_box(399),
                &access_stops,
                &egress_stops,
                &params,
            )
        })
    });
}

criterion_group!(benches, single_departure_benchmark, window_query_benchmark);
criterion_main!(benches);
