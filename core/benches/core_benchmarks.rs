use criterion::{Criterion, black_box, criterion_group, criterion_main};

use uiframe_core::index::ObjectIndex;
use uiframe_core::pool::ResourcePool;

// ---------------------------------------------------------------------------
// Resource pool
// ---------------------------------------------------------------------------

fn bench_pool_claim_free(c: &mut Criterion) {
    c.bench_function("resource_pool_claim_free_64", |b| {
        let mut pool = ResourcePool::<u64>::new();
        pool.reserve(64, |slot| slot as u64);
        let mut claimed = Vec::with_capacity(64);
        b.iter(|| {
            for _ in 0..64 {
                claimed.push(pool.claim(|slot| slot as u64).0);
            }
            for resource in claimed.drain(..) {
                pool.free(black_box(&resource));
            }
        });
    });
}

fn bench_pool_growth(c: &mut Criterion) {
    c.bench_function("resource_pool_grow_to_1024", |b| {
        b.iter(|| {
            let mut pool = ResourcePool::<u64>::new();
            for _ in 0..1024 {
                black_box(pool.claim(|slot| slot as u64));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Object index
// ---------------------------------------------------------------------------

fn bench_index_churn(c: &mut Criterion) {
    c.bench_function("object_index_insert_remove_256", |b| {
        let mut index = ObjectIndex::new();
        let mut keys = Vec::with_capacity(256);
        b.iter(|| {
            for i in 0..256u32 {
                keys.push(index.insert(i));
            }
            for key in keys.drain(..) {
                black_box(index.remove(key));
            }
        });
    });
}

criterion_group!(pool_benches, bench_pool_claim_free, bench_pool_growth);
criterion_group!(index_benches, bench_index_churn);
criterion_main!(pool_benches, index_benches);
