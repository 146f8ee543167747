use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;

use stashcan::{Action, MemoryStorage, StateCell, StoredReducer, StoredState};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn cell_read_benchmark(c: &mut Criterion) {
    let cell = StateCell::new(Some(42));

    c.bench_function("cell_read", |b| {
        b.iter(|| {
            black_box(cell.get());
        });
    });
}

fn cell_subscribe_benchmark(c: &mut Criterion) {
    #[derive(Clone)]
    struct State {
        value: usize,
    }

    let mut group = c.benchmark_group("cell_subscribe");

    for subscriber_count in [1, 10, 100].iter() {
        let cell = StateCell::new(Some(State { value: 0 }));
        let _subscriptions: Vec<_> = (0..*subscriber_count)
            .map(|_| {
                cell.subscribe(|_| {
                    // Empty subscriber
                })
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    cell.set(Some(State {
                        value: black_box(i),
                    }));
                    i += 1;
                });
            },
        );
    }
    group.finish();
}

fn state_write_benchmark(c: &mut Criterion) {
    let rt = runtime();
    let state = rt.block_on(async {
        let state = StoredState::open(Arc::new(MemoryStorage::new()), "bench", Some(0)).unwrap();
        state.wait_loaded().await;
        state
    });

    c.bench_function("state_write", |b| {
        let mut i = 0;
        b.iter(|| {
            rt.block_on(async {
                state.write(black_box(i)).unwrap().wait().await.unwrap();
            });
            i += 1;
        });
    });
}

fn reducer_dispatch_benchmark(c: &mut Criterion) {
    fn add(state: Option<&i64>, action: Action) -> Option<i64> {
        Some(state.copied().unwrap_or(0) + action.payload_as::<i64>().unwrap_or(0))
    }

    let rt = runtime();
    let counter = rt.block_on(async {
        let counter =
            StoredReducer::open(Arc::new(MemoryStorage::new()), "bench", add, Some(0)).unwrap();
        counter.wait_loaded().await;
        counter
    });

    c.bench_function("reducer_dispatch", |b| {
        b.iter(|| {
            rt.block_on(async {
                if let Some(write) = counter.dispatch(black_box(Action::new("inc", 1))).unwrap() {
                    write.wait().await.unwrap();
                }
            });
        });
    });
}

criterion_group!(
    benches,
    cell_read_benchmark,
    cell_subscribe_benchmark,
    state_write_benchmark,
    reducer_dispatch_benchmark,
);
criterion_main!(benches);
