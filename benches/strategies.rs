use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use async_conveyor::{
    CancelSignal,
    CancellableProcessor,
    Config,
    FanOutFanIn,
    Pipeline,
    ThrottledProcessor,
    WorkerPool,
};
use std::hint::black_box;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .unwrap()
}

// Benchmark 1: WorkerPool vs FanOutFanIn на одинаковой нагрузке
fn bench_worker_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_strategies");
    let rt = create_runtime();

    for size in [1_000u64, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size));

        group.bench_with_input(BenchmarkId::new("worker_pool", size), &size, |b, &size| {
            let pool = WorkerPool::with_config(&Config::cpu_bound()).unwrap();
            b.to_async(&rt).iter(|| {
                let pool = &pool;
                async move {
                    let jobs: Vec<u64> = (0..size).collect();
                    black_box(pool.run(jobs, |x| async move { black_box(x * 2) }).await.unwrap());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("fan_out_fan_in", size), &size, |b, &size| {
            let fan = FanOutFanIn::with_config(&Config::cpu_bound()).unwrap();
            b.to_async(&rt).iter(|| {
                let fan = &fan;
                async move {
                    let jobs: Vec<u64> = (0..size).collect();
                    black_box(fan.run(jobs, |x| async move { black_box(x * 2) }).await.unwrap());
                }
            });
        });
    }

    group.finish();
}

// Benchmark 2: стоимость стадии конвейера в зависимости от буфера каналов
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let rt = create_runtime();
    let size = 10_000u64;
    group.throughput(Throughput::Elements(size));

    for capacity in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::new("multiply_then_add", capacity), &capacity, |b, &capacity| {
            b.to_async(&rt).iter(|| async move {
                let jobs: Vec<u64> = (0..size).collect();
                let out = Pipeline::multiply_then_add(2u64, 1)
                    .with_channel_capacity(capacity)
                    .unwrap()
                    .run(jobs)
                    .await
                    .unwrap();
                black_box(out);
            });
        });
    }

    group.finish();
}

// Benchmark 3: throttle и cancellable без отмены
fn bench_throttled_and_cancellable(c: &mut Criterion) {
    let mut group = c.benchmark_group("throttled_cancellable");
    let rt = create_runtime();
    let size = 10_000u64;
    group.throughput(Throughput::Elements(size));

    for permits in [8usize, 64, 512] {
        group.bench_with_input(BenchmarkId::new("throttled", permits), &permits, |b, &permits| {
            let processor = ThrottledProcessor::new(permits).unwrap();
            b.to_async(&rt).iter(|| {
                let processor = &processor;
                async move {
                    let jobs: Vec<u64> = (0..size).collect();
                    black_box(processor.run(jobs, |x| async move { black_box(x + 1) }).await.unwrap());
                }
            });
        });
    }

    group.bench_function("cancellable_no_cancel", |b| {
        let processor = CancellableProcessor::with_config(&Config::cpu_bound()).unwrap();
        b.to_async(&rt).iter(|| {
            let processor = &processor;
            async move {
                let signal = CancelSignal::new();
                let jobs: Vec<u64> = (0..size).collect();
                black_box(processor.run(jobs, &signal, |x| async move { black_box(x + 1) }).await.unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_worker_strategies,
    bench_pipeline,
    bench_throttled_and_cancellable,
);
criterion_main!(benches);
