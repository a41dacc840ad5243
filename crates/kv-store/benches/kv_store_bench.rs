use criterion::{Criterion, criterion_group, criterion_main};
use kv_store::{InMemoryKvStore, KvStore};

fn bench_set_if_absent(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("kv_store/set_if_absent", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryKvStore::new();
                store.set_if_absent("bench-key", b"value", None).await.unwrap();
            });
        });
    });
}

fn bench_get(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryKvStore::new();
    rt.block_on(async {
        store.set_if_absent("bench-key", b"value", None).await.unwrap();
    });

    c.bench_function("kv_store/get", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.get("bench-key").await.unwrap();
            });
        });
    });
}

fn bench_increment(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryKvStore::new();

    c.bench_function("kv_store/increment", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.increment("bench-counter", None).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_set_if_absent, bench_get, bench_increment);
criterion_main!(benches);
