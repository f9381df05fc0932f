//! Store operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use monokv_bench::{sample_data, sample_entries};
use monokv_core::{compact, KeyIndex, Record, Store, StoreConfig};
use tempfile::TempDir;

/// Benchmark record encode/decode round-trips.
fn bench_record_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_codec");

    for size in [64, 1024, 16 * 1024].iter() {
        group.bench_with_input(BenchmarkId::new("encode", size), size, |b, &size| {
            let record = Record::new("bench-key", sample_data(size));
            b.iter(|| black_box(record.encode().unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("decode", size), size, |b, &size| {
            let payload = Record::new("bench-key", sample_data(size))
                .encode_payload()
                .unwrap();
            b.iter(|| black_box(Record::decode_payload(black_box(&payload)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark batch adds into a fresh store.
fn bench_store_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_add");
    group.sample_size(20);

    group.bench_function("100x256_no_sync", |b| {
        let entries = sample_entries(100, 256);

        b.iter(|| {
            let temp_dir = TempDir::new().unwrap();
            let config = StoreConfig::new(temp_dir.path().join("bench.kv")).sync_on_write(false);
            let mut store = Store::open(config).unwrap();
            let outcomes = store.add(entries.clone());
            black_box(outcomes);
        });
    });

    group.finish();
}

/// Benchmark loads against a populated store.
fn bench_store_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_load");
    group.sample_size(20);

    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig::new(temp_dir.path().join("bench.kv")).sync_on_write(false);
    let mut store = Store::open(config).unwrap();
    store.add(sample_entries(500, 256));

    group.bench_function("single_key_of_500", |b| {
        b.iter(|| black_box(store.load(black_box("key-000250"), true).unwrap()));
    });

    group.bench_function("batch_10_of_500", |b| {
        let keys: Vec<String> = (0..10).map(|i| format!("key-{:06}", i * 50)).collect();
        b.iter(|| black_box(store.loads(black_box(&keys), true).unwrap()));
    });

    group.finish();
}

/// Benchmark a full compaction pass over a half-dead log.
fn bench_compaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("compaction");
    group.sample_size(20);

    group.bench_function("500_records_half_live", |b| {
        let entries = sample_entries(500, 256);

        b.iter(|| {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("bench.kv");

            let mut data = Vec::new();
            let mut index = KeyIndex::new();
            for (i, (key, value)) in entries.iter().enumerate() {
                data.extend(Record::new(key.clone(), value.clone()).encode().unwrap());
                if i % 2 == 0 {
                    index.insert(key.clone());
                }
            }
            std::fs::write(&path, data).unwrap();

            black_box(compact(&path, &index).unwrap());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_record_codec,
    bench_store_add,
    bench_store_load,
    bench_compaction,
);

criterion_main!(benches);
