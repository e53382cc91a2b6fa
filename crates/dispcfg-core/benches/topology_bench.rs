//! Criterion benchmarks for the array surgery behind every structural change.
//!
//! Run with:
//! ```bash
//! cargo bench --package dispcfg-core --bench topology_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispcfg_core::builder::{BuiltTopology, DisplaySpec, TopologyBuilder};
use dispcfg_core::domain::catalog::{available_indexes, sort_indexes};
use dispcfg_core::{AdapterId, DisplayTopology, ModeArena, OutputTechnology, Region};

// ── Fixture builders ──────────────────────────────────────────────────────────

/// `n` active 1920×1080 displays in one row, spread over two adapters, each
/// followed by an inactive duplicate path for the same target.
fn build_row(n: usize) -> BuiltTopology {
    let technologies = [
        OutputTechnology::Hdmi,
        OutputTechnology::DisplayPortExternal,
        OutputTechnology::Dvi,
        OutputTechnology::Internal,
    ];
    let mut builder = TopologyBuilder::new();
    for i in 0..n {
        let adapter = AdapterId::new(1 + (i % 2) as u32, 0);
        let target = i as u32;
        let technology = technologies[i % technologies.len()];
        builder
            .push(
                DisplaySpec::active(adapter, target, Region::new(1920 * i as i32, 0, 1920, 1080))
                    .technology(technology)
                    .connector(i as u32)
                    .with_desktop_image(),
            )
            .push(DisplaySpec::inactive(adapter, target).technology(technology));
    }
    builder.build()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("compact");
    for n in [2usize, 8, 32] {
        let built = build_row(n);
        let arena = ModeArena::new(built.modes.clone());
        let order: Vec<usize> = (0..built.paths.len()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| arena.compact(black_box(&built.paths), black_box(&order), black_box(2)))
        });
    }
    group.finish();
}

fn bench_catalog_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_sort");
    for n in [2usize, 8, 32] {
        let built = build_row(n);
        let indexes = available_indexes(&built.paths);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| sort_indexes(black_box(&built.paths), black_box(&indexes), &built.names))
        });
    }
    group.finish();
}

fn bench_desktop_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("desktop_map");
    for n in [2usize, 8, 32] {
        let topology: DisplayTopology =
            build_row(n).into_topology().expect("fixture topology must be valid");
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(&topology).desktop_map())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compact, bench_catalog_sort, bench_desktop_map);
criterion_main!(benches);
