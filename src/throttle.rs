use super::{
    barrier::{join_handles, CompletionBarrier},
    config::Config,
    errors::ProcessError,
    model::{JoinOrdering, SemaphoreMetrics},
    result::ProcessResult,
    semaphore::Semaphore,
};
use std::{future::Future, sync::Arc};
use tokio::sync::mpsc;


/// Один юнит на задачу, параллелизм ограничен числом токенов семафора.
///
/// Семафор общий для всех `run` этого процессора: лимит действует
/// на процессор целиком, а не на отдельный вызов.
#[derive(Debug, Clone)]
pub struct ThrottledProcessor {
    semaphore: Semaphore,
    channel_capacity: usize,
    ordering: JoinOrdering,
}

impl ThrottledProcessor {
    pub fn new(max_concurrent: usize) -> ProcessResult<Self> {
        let semaphore = Semaphore::new(max_concurrent)?;
        let config = Config::default();
        Ok(Self {
            semaphore,
            channel_capacity: config.channel_capacity,
            ordering: config.ordering,
        })
    }

    pub fn with_config(config: &Config) -> ProcessResult<Self> {
        config.validate()?;
        Ok(Self {
            semaphore: Semaphore::new(config.max_concurrent)?,
            channel_capacity: config.channel_capacity,
            ordering: config.ordering,
        })
    }

    pub fn with_ordering(mut self, ordering: JoinOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    #[inline]
    pub fn max_concurrent(&self) -> usize {
        self.semaphore.capacity()
    }

    #[inline]
    pub fn metrics(&self) -> SemaphoreMetrics {
        self.semaphore.metrics()
    }

    #[tracing::instrument(name = "throttled", skip_all, fields(jobs = jobs.len(), max_concurrent = self.max_concurrent()))]
    pub async fn run<T, U, F, Fut>(&self, jobs: Vec<T>, transform: F) -> ProcessResult<Vec<U>>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (result_tx, mut result_rx) = mpsc::channel::<(usize, U)>(self.channel_capacity);
        let transform = Arc::new(transform);
        let barrier = CompletionBarrier::new();
        let mut handles = Vec::with_capacity(total);

        for (idx, job) in jobs.into_iter().enumerate() {
            let guard = barrier.enter();
            let semaphore = self.semaphore.clone();
            let result_tx = result_tx.clone();
            let transform = Arc::clone(&transform);

            handles.push(tokio::spawn(async move {
                let _guard = guard;
                let out = {
                    let _permit = semaphore.acquire().await?;
                    transform(job).await
                };
                // Токен уже отпущен: ожидание места в канале не держит слот
                let _ = result_tx.send((idx, out)).await;
                Ok::<(), ProcessError>(())
            }));
        }
        let closer = barrier.close_when_done(result_tx);

        let mut tagged = Vec::with_capacity(total);
        while let Some(item) = result_rx.recv().await {
            tagged.push(item);
        }

        join_handles(vec![closer]).await?;
        join_handles(handles)
            .await?
            .into_iter()
            .collect::<ProcessResult<Vec<()>>>()?;

        let metrics = self.semaphore.metrics();
        tracing::debug!(results = tagged.len(), peak = metrics.peak, "throttled run drained");
        Ok(self.ordering.collect(tagged))
    }
}
