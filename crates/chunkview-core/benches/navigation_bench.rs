//! Benchmarks for the navigation hot path.
//!
//! Every keypress runs one state transition, one bounding-area computation,
//! one reconcile, and one materialization. All four should stay flat in the
//! dataset size.
//!
//! Run with: cargo bench -p chunkview-core --bench navigation_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chunkview_core::{
    BoundingAreaConfig, Chunk, ChunkOrchestrator, ChunkStore, ViewportConfig, ViewportState,
    calculate_bounding_area, materialize,
};

// ============================================================================
// Setup helpers
// ============================================================================

fn viewport_config(height: usize) -> ViewportConfig {
    ViewportConfig::new(height)
        .with_thresholds(3, 3)
        .with_chunk_size(50)
        .normalized()
}

fn full_store(total: usize, chunk_size: usize) -> ChunkStore<u64> {
    let mut store = ChunkStore::new(chunk_size);
    for start in (0..total).step_by(chunk_size) {
        let end = (start + chunk_size).min(total);
        store.install(Chunk::new(start, (start as u64..end as u64).collect()));
    }
    store
}

// ============================================================================
// State machine
// ============================================================================

fn bench_cursor_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation_cursor_walk");

    for &total in &[1_000usize, 100_000, 10_000_000] {
        group.bench_with_input(BenchmarkId::new("down_1000", total), &total, |b, &total| {
            let config = viewport_config(40);
            b.iter(|| {
                let mut state = ViewportState::initial(&config, total);
                for _ in 0..1_000 {
                    state = state.cursor_down(&config, total);
                }
                black_box(state)
            });
        });
    }

    group.finish();
}

fn bench_page_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation_page_walk");
    let config = viewport_config(40);
    let total = 1_000_000;

    group.bench_function("page_down_then_up_100", |b| {
        b.iter(|| {
            let mut state = ViewportState::initial(&config, total);
            for _ in 0..100 {
                state = state.page_down(&config, total);
            }
            for _ in 0..100 {
                state = state.page_up(&config, total);
            }
            black_box(state)
        });
    });

    group.finish();
}

// ============================================================================
// Orchestration
// ============================================================================

fn bench_reconcile_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation_reconcile");

    for &radius in &[0usize, 2, 8] {
        group.bench_with_input(BenchmarkId::new("radius", radius), &radius, |b, &radius| {
            let config = viewport_config(40);
            let bounding = BoundingAreaConfig::default()
                .with_chunk_size(config.chunk_size)
                .with_radius(radius, radius);
            let total = 1_000_000;
            b.iter(|| {
                let mut orch = ChunkOrchestrator::new(bounding);
                let mut state = ViewportState::initial(&config, total);
                let mut issued = 0usize;
                for _ in 0..500 {
                    state = state.cursor_down(&config, total);
                    let area = calculate_bounding_area(&state, config.height, total, orch.config());
                    let ops = orch.reconcile(&area, total);
                    issued += ops.loads.len() + ops.unloads.len();
                }
                black_box(issued)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Materialization
// ============================================================================

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation_materialize");

    for &height in &[20usize, 80, 200] {
        group.bench_with_input(BenchmarkId::new("height", height), &height, |b, &height| {
            let config = viewport_config(height);
            let total = 10_000;
            let mut store = full_store(total, config.chunk_size);
            let state = ViewportState::default().jump_to_index(total / 2, &config, total);
            b.iter(|| {
                let frame = materialize(&state, &config, total, &mut store, |_| None);
                black_box(frame.rows.len())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cursor_walk,
    bench_page_walk,
    bench_reconcile_scroll,
    bench_materialize
);
criterion_main!(benches);
