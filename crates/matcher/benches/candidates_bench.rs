use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use features::Token;
use matcher::{CandidateConfig, CandidateGenerator, Entry};
use simhash::Fingerprint;
use std::hint::black_box;

/// `n` entries with spread-out 128-bit fingerprints.
fn corpus(n: usize) -> Vec<Entry> {
    (0..n)
        .map(|i| {
            let v = (i as u128 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15_F39C_C060_5CED_C835);
            let name = format!("w{i}");
            Entry::new(Token::new("eng", name.as_str(), [name.as_str()]), Fingerprint::from_u128(v, 128))
        })
        .collect()
}

fn bench_candidates(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidates");
    group.sample_size(10);
    for size in [100usize, 500, 1000] {
        let entries = corpus(size);
        group.throughput(Throughput::Elements(size as u64));
        for parallel in [false, true] {
            let gen = CandidateGenerator::new(CandidateConfig::default().with_parallel(parallel))
                .expect("valid config");
            let id = BenchmarkId::new(if parallel { "par" } else { "seq" }, size);
            group.bench_with_input(id, &entries, |b, entries| {
                b.iter(|| gen.candidates(black_box(entries)).expect("sweep"));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_candidates);
criterion_main!(benches);
