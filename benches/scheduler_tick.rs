//! Benchmarks for the per-update cost of the scheduler

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tweenkit::{EngineConfig, TimeControl, TweenEngine, TweenParams, Vector3};

const FRAME: f32 = 1.0 / 60.0;

fn engine_for(count: usize) -> TweenEngine {
    TweenEngine::new(
        EngineConfig::default()
            .with_initial_capacity(count)
            .with_events(false),
    )
}

/// Looping tweens so the live set stays stable across iterations
fn spawn_scalars(engine: &mut TweenEngine, count: usize) {
    for i in 0..count {
        engine
            .create(
                TweenParams::new(0.0f32, i as f32, 1.0 + (i % 7) as f32 * 0.25)
                    .with_time_control(TimeControl::Loop),
            )
            .unwrap();
    }
}

fn spawn_vectors(engine: &mut TweenEngine, count: usize) {
    for i in 0..count {
        engine
            .create(
                TweenParams::new(
                    Vector3::zero(),
                    Vector3::new(i as f32, 1.0, -1.0),
                    1.0 + (i % 5) as f32 * 0.5,
                )
                .with_time_control(TimeControl::PingPong),
            )
            .unwrap();
    }
}

fn bench_scalar_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_tick");
    for &count in &[1_000usize, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut engine = engine_for(count);
            spawn_scalars(&mut engine, count);
            b.iter(|| engine.update(black_box(FRAME)));
        });
    }
    group.finish();
}

fn bench_vector_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector3_tick");
    for &count in &[1_000usize, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut engine = engine_for(count);
            spawn_vectors(&mut engine, count);
            b.iter(|| engine.update(black_box(FRAME)));
        });
    }
    group.finish();
}

fn bench_spawn_kill_churn(c: &mut Criterion) {
    c.bench_function("spawn_kill_churn_1000", |b| {
        let mut engine = engine_for(1_000);
        b.iter(|| {
            let mut ids = Vec::with_capacity(1_000);
            for i in 0..1_000 {
                ids.push(
                    engine
                        .create(TweenParams::new(0.0f32, i as f32, 10.0))
                        .unwrap(),
                );
            }
            engine.update(FRAME);
            for id in ids {
                engine.kill(id);
            }
            engine.update(FRAME);
        });
    });
}

criterion_group!(
    benches,
    bench_scalar_tick,
    bench_vector_tick,
    bench_spawn_kill_churn
);
criterion_main!(benches);
