use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use iqseg_core::{block_reader, complex_to_raw, raw_to_complex};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..len).map(|_| rng.gen()).collect()
}

fn bench_convert(c: &mut Criterion) {
    let raw = random_bytes(2 * 16_384);
    let samples = raw_to_complex(&raw);

    let mut group = c.benchmark_group("convert");
    group.throughput(Throughput::Elements(samples.len() as u64));
    group.bench_function("raw_to_complex", |b| b.iter(|| raw_to_complex(black_box(&raw))));
    group.bench_function("complex_to_raw", |b| {
        b.iter(|| complex_to_raw(black_box(&samples)))
    });
    group.finish();
}

fn bench_block_reader(c: &mut Criterion) {
    // ~1 с потока при 2.4 Msps
    let raw = random_bytes(2 * 2_400_000);

    let mut group = c.benchmark_group("block_reader");
    group.throughput(Throughput::Bytes(raw.len() as u64));
    group.sample_size(20);

    for (size, history) in [(16_384usize, 4_920usize), (16_384, 0), (131_072, 16_384)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}/{history}")),
            &(size, history),
            |b, &(size, history)| {
                b.iter(|| {
                    let reader = block_reader(black_box(&raw[..]), size, history).unwrap();
                    reader.map(|blk| blk.unwrap().data.len()).sum::<usize>()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_convert, bench_block_reader);
criterion_main!(benches);
