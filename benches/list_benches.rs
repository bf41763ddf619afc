use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::seq::SliceRandom;

use forward_collections::{BoxedForwardStorage, Cursor, ForwardList, OwnedForwardList};

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");

    group.bench_function("push_front_pop_front_1024", |b| {
        let mut list: OwnedForwardList<u64> = OwnedForwardList::with_capacity(1024);
        b.iter(|| {
            for i in 0..1024u64 {
                let _ = list.try_push_front(black_box(i));
            }
            while let Some(v) = list.pop_front() {
                black_box(v);
            }
        });
    });

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    let mut rng = rand::rng();

    for size in [64usize, 1024, 8192] {
        let mut values: Vec<u64> = (0..size as u64).collect();
        values.shuffle(&mut rng);

        group.bench_function(format!("shuffled_{size}"), |b| {
            b.iter_batched(
                || OwnedForwardList::<u64>::try_from_iter(size, values.iter().copied()).unwrap(),
                |mut list| {
                    list.sort();
                    black_box(list.front_key());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    let list = OwnedForwardList::<u64>::try_from_iter(8192, 0..8192).unwrap();

    group.bench_function("sum_8192", |b| {
        b.iter(|| {
            let sum: u64 = list.iter().sum();
            black_box(sum)
        });
    });

    group.finish();
}

fn bench_splice(c: &mut Criterion) {
    let mut group = c.benchmark_group("splice");

    group.bench_function("splice_after_1024_shared_storage", |b| {
        b.iter_batched(
            || {
                let mut storage: BoxedForwardStorage<u64> =
                    BoxedForwardStorage::with_capacity(2048);
                let mut a: ForwardList<u64, BoxedForwardStorage<u64>> = ForwardList::new();
                let mut b: ForwardList<u64, BoxedForwardStorage<u64>> = ForwardList::new();
                let _ = a.try_insert_iter_after(&mut storage, Cursor::Head, 0..1024u64);
                let _ = b.try_insert_iter_after(&mut storage, Cursor::Head, 0..1024u64);
                (storage, a, b)
            },
            |(mut storage, mut a, mut b)| {
                a.splice_after(&mut storage, Cursor::Head, &mut b);
                black_box(a.front_key());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_push_pop,
    bench_sort,
    bench_iterate,
    bench_splice
);
criterion_main!(benches);
