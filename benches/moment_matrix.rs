//! Benchmarks for matrix construction.
//!
//! Each iteration builds a fresh system, so symbol-table growth and
//! canonicalization are measured together.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use npa_moment::prelude::*;
use std::collections::BTreeSet;

/// CHSH scenario (two parties, two binary measurements each) at level 2.
///
/// This measures:
/// - word generation and conjugation
/// - per-cell canonicalization and hashing
/// - symbol merging and the Collins–Gisin rebuild
fn bench_chsh_level_two(c: &mut Criterion) {
    c.bench_function("chsh_level_two", |b| {
        b.iter(|| {
            let context = LocalityContext::uniform(2, 2, 2).unwrap();
            let system = LocalityMatrixSystem::new(context);
            let (_, mm) = system.create_moment_matrix(black_box(2)).unwrap();
            assert_eq!(mm.dimension(), 13);
        });
    });
}

/// Triangle network under two-fold inflation at level 1.
///
/// Includes the factor table fixed point and the canonical-observable
/// enumeration run after the matrix is built.
fn bench_triangle_inflation(c: &mut Criterion) {
    c.bench_function("triangle_inflation_level_one", |b| {
        b.iter(|| {
            let network = CausalNetwork::new(
                vec![2, 2, 2],
                vec![
                    BTreeSet::from([0, 1]),
                    BTreeSet::from([1, 2]),
                    BTreeSet::from([0, 2]),
                ],
            )
            .unwrap();
            let context = InflationContext::new(network, black_box(2)).unwrap();
            let system = InflationMatrixSystem::new(context);
            let (_, mm) = system.create_moment_matrix(1).unwrap();
            assert_eq!(mm.dimension(), 13);
        });
    });
}

/// Raw words of a generic context, without measurement structure.
fn bench_generic_level_three(c: &mut Criterion) {
    c.bench_function("generic_three_operators_level_three", |b| {
        b.iter(|| {
            let system: MatrixSystem<GenericContext> = MatrixSystem::new(GenericContext::new(3));
            let (_, mm) = system.create_moment_matrix(black_box(3)).unwrap();
            assert_eq!(mm.dimension(), 40);
        });
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_chsh_level_two,
              bench_triangle_inflation,
              bench_generic_level_three
);
criterion_main!(benches);
