use async_conveyor::{
    CancelSignal,
    CancellableProcessor,
    Config,
    FanOutFanIn,
    Pipeline,
    ThrottledProcessor,
    WorkerPool,
};
use tokio::{
    runtime::Builder,
    time::Duration,
};
use tracing_subscriber::EnvFilter;
use std::time::Instant;


fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        let config = Config::io_bound();
        let jobs: Vec<u64> = (0..100_000).collect();

        let now = Instant::now();
        let pool = WorkerPool::with_config(&config)?;
        let doubled = pool.run(jobs.clone(), |x| async move { x * 2 }).await?;
        tracing::info!(results = doubled.len(), elapsed = ?now.elapsed(), "worker pool");

        let now = Instant::now();
        let out = Pipeline::multiply_then_add(2u64, 1).run(jobs.clone()).await?;
        tracing::info!(results = out.len(), elapsed = ?now.elapsed(), "pipeline");

        let now = Instant::now();
        let fan = FanOutFanIn::with_config(&config)?;
        let merged = fan.run(jobs.clone(), |x| async move { x * 2 }).await?;
        tracing::info!(results = merged.len(), elapsed = ?now.elapsed(), "fan-out/fan-in");

        let now = Instant::now();
        let throttled = ThrottledProcessor::new(8)?;
        let slow: Vec<u64> = (0..64).collect();
        let out = throttled.run(slow.clone(), |x| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            x * 2
        }).await?;
        tracing::info!(results = out.len(), peak = throttled.metrics().peak, elapsed = ?now.elapsed(), "throttled");

        let now = Instant::now();
        let signal = CancelSignal::with_timeout(Duration::from_millis(100));
        let processor = CancellableProcessor::new(2)?.with_job_timeout(Some(Duration::from_millis(50)));
        let report = processor.run_detailed(slow, &signal, |x| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            x * 2
        }).await?;
        tracing::info!(
            results = report.results.len(),
            submitted = report.submitted,
            cancelled = report.cancelled,
            elapsed = ?now.elapsed(),
            "cancellable"
        );

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
