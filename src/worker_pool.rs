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


/// Пул из фиксированного числа воркеров поверх пары каналов задач/результатов.
///
/// Все задачи заранее кладутся в буферизованный источник размером с вход,
/// после чего источник закрывается. Воркеры читают его до исчерпания,
/// канал результатов закрывается барьером, когда вышел последний воркер.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    channel_capacity: usize,
    ordering: JoinOrdering,
}

impl WorkerPool {
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

    #[tracing::instrument(name = "worker_pool", skip_all, fields(jobs = jobs.len(), workers = self.workers))]
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

        // Емкость равна числу задач: загрузка не блокируется
        let (job_tx, job_rx) = channel::bounded::<(usize, T)>(total);
        for tagged in jobs.into_iter().enumerate() {
            let _ = job_tx.send(tagged);
        }
        drop(job_tx);

        let (result_tx, mut result_rx) = mpsc::channel::<(usize, U)>(self.channel_capacity);
        let transform = Arc::new(transform);
        let barrier = CompletionBarrier::new();
        // Лишние воркеры увидели бы пустой источник и сразу вышли
        let workers = self.workers.min(total);
        let mut handles = Vec::with_capacity(workers + 1);

        for worker_id in 0..workers {
            let guard = barrier.enter();
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let transform = Arc::clone(&transform);

            handles.push(tokio::spawn(async move {
                let _guard = guard;
                let mut processed = 0usize;
                // Источник закрыт заранее: Disconnected означает исчерпание
                while let Ok((idx, job)) = job_rx.try_recv() {
                    let out = transform(job).await;
                    if result_tx.send((idx, out)).await.is_err() {
                        break;
                    }
                    processed += 1;
                }
                tracing::trace!(worker_id, processed, "worker exited");
            }));
        }
        drop(job_rx);
        handles.push(barrier.close_when_done(result_tx));

        let mut tagged = Vec::with_capacity(total);
        while let Some(item) = result_rx.recv().await {
            tagged.push(item);
        }

        join_handles(handles).await?;
        tracing::debug!(results = tagged.len(), "worker pool drained");
        Ok(self.ordering.collect(tagged))
    }
}
