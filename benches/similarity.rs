//! Benchmarks for the pairwise similarity engine.
//!
//! Run with: cargo bench
//! Run specific benchmark: cargo bench -- compare

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use doppel::config::DetectionConfig;
use doppel::core::{Operand, ShapeToken, SourceRange, Statement, StatementSequence};
use doppel::similarity::compare;
use doppel::variation::type_compat::TypeHints;

const KINDS: &[&str] = &[
    "assign",
    "call:save/1",
    "if",
    "decl",
    "call:load/2",
    "return",
];

/// Build a window of `len` statements whose kinds cycle through a fixed
/// alphabet, offset by `salt` so two windows are similar but not equal.
fn build_sequence(start: u32, len: usize, salt: usize) -> StatementSequence {
    let statements: Vec<Statement> = (0..len)
        .map(|i| {
            let kind = KINDS[(i + salt) % KINDS.len()];
            Statement::new(ShapeToken::new(kind, kind), format!("{kind};")).with_operands(vec![
                Operand::identifier(format!("v{i}")),
                Operand::literal(format!("{}", i + salt)),
            ])
        })
        .collect();
    let end = start + len as u32 - 1;
    StatementSequence::new("bench.src", SourceRange::new(start, 1, end, 80), statements)
}

fn bench_compare(c: &mut Criterion) {
    let config = DetectionConfig::default();
    let hints = TypeHints::default();

    let mut group = c.benchmark_group("compare");
    for &len in &[8usize, 32, 128] {
        let a = build_sequence(10, len, 0);
        let b = build_sequence(1_000, len, 1);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |bench, _| {
            bench.iter(|| compare(black_box(&a), black_box(&b), &config, &hints));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compare);
criterion_main!(benches);
