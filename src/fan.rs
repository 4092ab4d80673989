use super::{
    barrier::{join_handles, CompletionBarrier},
    config::Config,
    errors::ProcessError,
    model::JoinOrdering,
    result::ProcessResult,
};
use std::{future::Future, sync::Arc};
use crossbeam::channel;
use tokio::sync::mpsc;


/// Fan-out по N воркерам с собственными выходными каналами и fan-in
/// в общий канал результатов.
#[derive(Debug, Clone)]
pub struct FanOutFanIn {
    workers: usize,
    channel_capacity: usize,
    ordering: JoinOrdering,
}

impl FanOutFanIn {
    pub fn new(workers: usize) -> ProcessResult<Self> {
        if workers == 0 {
            return Err(ProcessError::ZeroWorkers);
        }
        Self::with_config(&Config::default().with_workers(workers))
    }

    pub fn with_config(config: &Config) -> ProcessResult<Self> {
        config.validate()?;
        Ok(Self {
            workers: config.workers,
            channel_capacity: config.channel_capacity,
            ordering: config.ordering,
        })
    }

    pub fn with_ordering(mut self, ordering: JoinOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[tracing::instrument(name = "fan_out_fan_in", skip_all, fields(jobs = jobs.len(), workers = self.workers))]
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

        let (job_tx, job_rx) = channel::bounded::<(usize, T)>(total);
        for tagged in jobs.into_iter().enumerate() {
            let _ = job_tx.send(tagged);
        }
        drop(job_tx);

        let transform = Arc::new(transform);
        // Лишние воркеры увидели бы пустой источник и сразу вышли
        let workers = self.workers.min(total);
        let mut handles = Vec::with_capacity(workers * 2 + 1);

        // Fan-out: каждый воркер владеет своим выходом и закрывает его сам
        let mut outputs = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let (out_tx, out_rx) = mpsc::channel::<(usize, U)>(self.channel_capacity);
            let job_rx = job_rx.clone();
            let transform = Arc::clone(&transform);

            handles.push(tokio::spawn(async move {
                let mut processed = 0usize;
                while let Ok((idx, job)) = job_rx.try_recv() {
                    let out = transform(job).await;
                    if out_tx.send((idx, out)).await.is_err() {
                        break;
                    }
                    processed += 1;
                }
                tracing::trace!(worker_id, processed, "fan-out worker exited");
            }));
            outputs.push(out_rx);
        }
        drop(job_rx);

        // Fan-in: по одному merge-юниту на выход воркера
        let (merged_tx, mut merged_rx) = mpsc::channel::<(usize, U)>(self.channel_capacity);
        let barrier = CompletionBarrier::new();
        for (worker_id, mut out_rx) in outputs.into_iter().enumerate() {
            let guard = barrier.enter();
            let merged_tx = merged_tx.clone();

            handles.push(tokio::spawn(async move {
                let _guard = guard;
                while let Some(item) = out_rx.recv().await {
                    if merged_tx.send(item).await.is_err() {
                        break;
                    }
                }
                tracing::trace!(worker_id, "merger exited");
            }));
        }
        handles.push(barrier.close_when_done(merged_tx));

        let mut tagged = Vec::with_capacity(total);
        while let Some(item) = merged_rx.recv().await {
            tagged.push(item);
        }

        join_handles(handles).await?;
        tracing::debug!(results = tagged.len(), "fan-in drained");
        Ok(self.ordering.collect(tagged))
    }
}
