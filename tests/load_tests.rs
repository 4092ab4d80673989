#[cfg(test)]
mod tests {
    use async_conveyor::{
        CancelSignal,
        CancellableProcessor,
        Config,
        FanOutFanIn,
        Pipeline,
        ThrottledProcessor,
        WorkerPool,
    };
    use std::{
        future::Future,
        time::{Duration, Instant},
    };

    async fn measure<F, Fut, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let start = Instant::now();
        let result = f().await;
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        result
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_1_worker_pool_fast_jobs() {
        println!("\n=== LOAD TEST 1: WorkerPool, 50k быстрых задач ===");
        let pool = WorkerPool::with_config(&Config::io_bound()).unwrap();
        let jobs: Vec<u64> = (0..50_000).collect();

        let results = measure("50k jobs", || async {
            pool.run(jobs, |x| async move { x * 2 }).await
        }).await.unwrap();

        assert_eq!(results.len(), 50_000);
        assert_eq!(results.iter().sum::<u64>(), (0..50_000u64).map(|x| x * 2).sum());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_2_pipeline_long_stream() {
        println!("\n=== LOAD TEST 2: Pipeline, 20k элементов через 4 стадии ===");
        let jobs: Vec<i64> = (0..20_000).collect();

        let out = measure("20k through 4 stages", || async {
            Pipeline::new()
                .stage(|x: i64| x * 2)
                .stage(|x| x + 1)
                .stage_async(|x| async move {
                    tokio::task::yield_now().await;
                    x
                })
                .stage(|x| x - 1)
                .with_config(&Config::cpu_bound())
                .unwrap()
                .run(jobs.clone())
                .await
        }).await.unwrap();

        let expected: Vec<i64> = jobs.iter().map(|x| x * 2).collect();
        assert_eq!(out, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_3_fan_out_medium_jobs() {
        println!("\n=== LOAD TEST 3: FanOutFanIn, 2k задач по 1ms ===");
        let fan = FanOutFanIn::new(64).unwrap();
        let jobs: Vec<u32> = (0..2_000).collect();

        let results = measure("2k jobs @ 1ms / 64 workers", || async {
            fan.run(jobs, |x| async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                format!("result_{}", x)
            }).await
        }).await.unwrap();

        assert_eq!(results.len(), 2_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_4_throttled_many_units() {
        println!("\n=== LOAD TEST 4: Throttle, 10k юнитов, 100 токенов ===");
        let processor = ThrottledProcessor::new(100).unwrap();
        let jobs: Vec<u64> = (0..10_000).collect();

        let results = measure("10k units @ 100 permits", || async {
            processor.run(jobs, |x| async move {
                tokio::time::sleep(Duration::from_micros(100)).await;
                x % 1000
            }).await
        }).await.unwrap();

        let metrics = processor.metrics();
        println!("  Пик одновременных: {}/{}", metrics.peak, metrics.capacity);
        println!("  Пиковая утилизация: {:.1}%", metrics.peak_utilization() * 100.0);
        assert_eq!(metrics.utilization(), 0.0, "после run токены свободны");
        assert_eq!(results.len(), 10_000);
        assert!(metrics.peak <= 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_5_cancellable_shutdown_under_load() {
        println!("\n=== LOAD TEST 5: Graceful shutdown под нагрузкой ===");
        let processor = CancellableProcessor::with_config(
            &Config::io_bound().with_job_timeout(Some(Duration::from_millis(200))),
        ).unwrap();
        let signal = CancelSignal::with_timeout(Duration::from_millis(100));
        let jobs: Vec<u64> = (0..100_000).collect();

        let start = Instant::now();
        let report = processor.run_detailed(jobs, &signal, |x| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            x * 2
        }).await.unwrap();
        let elapsed = start.elapsed();

        println!("  Время: {:?}", elapsed);
        println!("  Подано: {}, получено: {}", report.submitted, report.results.len());
        assert!(report.cancelled);
        assert!(report.results.len() < 100_000);
        assert!(report.results.iter().all(|r| r % 2 == 0));
        // Дедлайн 100ms плюс не более одного шага с timeout
        assert!(elapsed < Duration::from_millis(100 + 200 + 100), "shutdown took {elapsed:?}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_6_parallel_runs_share_throttle() {
        println!("\n=== LOAD TEST 6: Параллельные run на одном семафоре ===");
        let processor = ThrottledProcessor::new(10).unwrap();

        let (r1, r2, r3) = measure("3 параллельных run по 500 задач", || async {
            tokio::join!(
                processor.run((0..500).collect::<Vec<u32>>(), |x| async move {
                    tokio::time::sleep(Duration::from_micros(200)).await;
                    x
                }),
                processor.run((0..500).collect::<Vec<u32>>(), |x| async move {
                    tokio::time::sleep(Duration::from_micros(200)).await;
                    x * 2
                }),
                processor.run((0..500).collect::<Vec<u32>>(), |x| async move {
                    tokio::time::sleep(Duration::from_micros(200)).await;
                    x * 3
                })
            )
        }).await;

        assert_eq!(r1.unwrap().len(), 500);
        assert_eq!(r2.unwrap().len(), 500);
        assert_eq!(r3.unwrap().len(), 500);
        assert!(processor.metrics().peak <= 10, "лимит общий для всех run");
    }
}
