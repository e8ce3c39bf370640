use criterion::{Criterion, black_box, criterion_group, criterion_main};
use indexed_store::runtime::{BaseObject, Representation, SlotValue};
use indexed_store::{Context, PromotionPolicy, StoreConfig, Value};

fn bench_sparse_put_get(c: &mut Criterion) {
    let ctx = Context::with_config(
        StoreConfig::default().with_promotion(PromotionPolicy::never()),
    );

    c.bench_function("sparse put 10k (stride 97)", |b| {
        b.iter(|| {
            let arr = ctx.new_sparse_array();
            for i in 0..10_000i64 {
                arr.put(&Value::int(i * 97), Value::int(i), true).unwrap();
            }
            black_box(arr)
        })
    });

    let arr = ctx.new_sparse_array();
    for i in 0..10_000i64 {
        arr.put(&Value::int(i * 97), Value::int(i), true).unwrap();
    }
    c.bench_function("sparse get 10k (stride 97)", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for i in 0..10_000i64 {
                sum += arr.get(&Value::int(i * 97)).unwrap().to_number();
            }
            black_box(sum)
        })
    });
}

fn bench_far_write(c: &mut Criterion) {
    let ctx = Context::new();
    c.bench_function("far write 1e6", |b| {
        b.iter(|| {
            let arr = ctx.new_sparse_array();
            arr.put_str("1000000", Value::int(5), true).unwrap();
            black_box(arr)
        })
    });
}

fn bench_promotion(c: &mut Criterion) {
    let ctx = Context::new();
    c.bench_function("fill 4k (promotes at 1024)", |b| {
        b.iter(|| {
            let arr = ctx.new_sparse_array();
            for i in 0..4096i64 {
                arr.put(&Value::int(i), Value::int(i), true).unwrap();
            }
            black_box(arr)
        })
    });

    let ctx = Context::with_config(
        StoreConfig::default().with_promotion(PromotionPolicy::never()),
    );
    c.bench_function("fill 4k (never promotes)", |b| {
        b.iter(|| {
            let arr = ctx.new_sparse_array();
            for i in 0..4096i64 {
                arr.put(&Value::int(i), Value::int(i), true).unwrap();
            }
            black_box(arr)
        })
    });
}

fn bench_shrink(c: &mut Criterion) {
    let ctx = Context::with_config(
        StoreConfig::default().with_promotion(PromotionPolicy::never()),
    );
    c.bench_function("shrink 1k slots to 0", |b| {
        b.iter(|| {
            let arr = ctx.new_sparse_array();
            for i in 0..1000i64 {
                arr.put(&Value::int(i * 3), Value::int(i), true).unwrap();
            }
            arr.put_str("length", Value::int(0), true).unwrap();
            black_box(arr)
        })
    });
}

fn bench_lazy(c: &mut Criterion) {
    let ctx = Context::new();
    c.bench_function("lazy materialize + get", |b| {
        b.iter(|| {
            let obj = ctx.new_lazy(|_| {
                let mut base = BaseObject::default();
                base.put_raw("x", SlotValue::Plain(Value::int(1)));
                Representation::Base(base)
            });
            black_box(obj.get_str("x").unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_sparse_put_get,
    bench_far_write,
    bench_promotion,
    bench_shrink,
    bench_lazy,
);
criterion_main!(benches);
