use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use lseqdb::{SledStore, Storage};

fn populated_storage(entries: usize) -> (Storage<SledStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();
    let storage = Storage::open(store, 0, 4).unwrap();
    for i in 0..entries {
        storage
            .put(format!("key-{i}").as_bytes(), format!("value-{i}").as_bytes())
            .unwrap();
    }
    (storage, dir)
}

fn bench_get_by_lseq(c: &mut Criterion) {
    let (storage, _dir) = populated_storage(10_000);
    c.bench_function("get_by_lseq full scan", |b| {
        b.iter(|| {
            let entries = storage
                .get_by_lseq(lseqdb::Lseq::new(0, 0), lseqdb::ScanMode::GreaterEqual, None)
                .unwrap();
            black_box(entries.len())
        })
    });
}

fn bench_point_get(c: &mut Criterion) {
    let (storage, _dir) = populated_storage(10_000);
    c.bench_function("point get", |b| {
        b.iter(|| black_box(storage.get(b"key-5000", 0).unwrap()))
    });
}

criterion_group!(benches, bench_get_by_lseq, bench_point_get);
criterion_main!(benches);
