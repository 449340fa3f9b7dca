//! Benchmarks for array store read, write, and append paths

use criterion::{Criterion, criterion_group, criterion_main};
use memarray::{ArrayStore, ByteOrder, DType, Layout, MapMode};
use std::hint::black_box;
use tempfile::tempdir;

fn benchmark_write(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("write.marr");
    let mut store =
        ArrayStore::create(&path, DType::F64, ByteOrder::Little, Layout::RowMajor, &[1024, 64])
            .unwrap();
    let row = vec![0x5Au8; 64 * 8];

    c.bench_function("write_single_record", |b| {
        b.iter(|| {
            store.write(black_box(511..512), black_box(&row)).unwrap();
        });
    });
}

fn benchmark_read(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("read.marr");
    let store =
        ArrayStore::create(&path, DType::F64, ByteOrder::Little, Layout::RowMajor, &[1024, 64])
            .unwrap();

    c.bench_function("read_all_records", |b| {
        b.iter(|| {
            let bytes = store.read(black_box(0..1024)).unwrap();
            black_box(bytes);
        });
    });
}

fn benchmark_append(c: &mut Criterion) {
    let row = vec![0xA5u8; 64 * 8];

    c.bench_function("append_record", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let store = ArrayStore::create(
                    dir.path().join("append.marr"),
                    DType::F64,
                    ByteOrder::Little,
                    Layout::RowMajor,
                    &[0, 64],
                )
                .unwrap();
                (dir, store)
            },
            |(_dir, mut store)| {
                for _ in 0..16 {
                    store.append(black_box(&row)).unwrap();
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn benchmark_open(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("open.marr");
    ArrayStore::create(&path, DType::I32, ByteOrder::Little, Layout::RowMajor, &[4096, 16])
        .unwrap()
        .close()
        .unwrap();

    c.bench_function("open_read_only", |b| {
        b.iter(|| {
            let store = ArrayStore::open(black_box(&path), MapMode::ReadOnly).unwrap();
            black_box(store.record_count());
        });
    });
}

criterion_group!(
    benches,
    benchmark_write,
    benchmark_read,
    benchmark_append,
    benchmark_open
);
criterion_main!(benches);
