use super::{
    barrier::{join_handles, CompletionBarrier},
    config::Config,
    errors::ProcessError,
    model::CancelReport,
    result::ProcessResult,
    signal::CancelSignal,
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::{sync::mpsc, time::Duration};


/// Процессор с поддержкой отмены и graceful shutdown.
///
/// Три фазы: подача задач в очередь, работа воркеров и дренаж результатов.
/// Каждое ожидание, которое может заблокироваться надолго, гоняется
/// против сигнала отмены. При отмене дренаж сразу возвращает то, что
/// успело прийти, а юниты в полете бросаются.
#[derive(Debug, Clone)]
pub struct CancellableProcessor {
    workers: usize,
    channel_capacity: usize,
    job_timeout: Option<Duration>,
}

impl CancellableProcessor {
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
            job_timeout: config.job_timeout,
        })
    }

    /// Ограничение на один шаг обработки, независимое от дедлайна сигнала
    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[inline]
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout
    }

    pub async fn run<T, U, F, Fut>(
        &self,
        jobs: Vec<T>,
        signal: &CancelSignal,
        transform: F,
    ) -> ProcessResult<Vec<U>>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        self.run_detailed(jobs, signal, transform)
            .await
            .map(CancelReport::into_results)
    }

    #[tracing::instrument(name = "cancellable", skip_all, fields(jobs = jobs.len(), workers = self.workers))]
    pub async fn run_detailed<T, U, F, Fut>(
        &self,
        jobs: Vec<T>,
        signal: &CancelSignal,
        transform: F,
    ) -> ProcessResult<CancelReport<U>>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        let total = jobs.len();
        if total == 0 {
            return Ok(CancelReport {
                results: Vec::new(),
                submitted: 0,
                timed_out: 0,
                cancelled: false,
            });
        }

        let submitted = Arc::new(AtomicUsize::new(0));
        let timed_out = Arc::new(AtomicUsize::new(0));
        let workers = self.workers.min(total);
        let mut handles = Vec::with_capacity(workers + 2);

        // Подача: каждый send гоняется против отмены
        let (job_tx, job_rx) = async_channel::bounded::<T>(self.channel_capacity);
        {
            let signal = signal.clone();
            let submitted = submitted.clone();
            handles.push(tokio::spawn(async move {
                for job in jobs {
                    tokio::select! {
                        biased;
                        _ = signal.cancelled() => {
                            tracing::debug!("feeding stopped by cancellation");
                            break;
                        }
                        sent = job_tx.send(job) => {
                            if sent.is_err() {
                                break;
                            }
                            submitted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                // job_tx дропается здесь: источник закрыт
            }));
        }

        let (result_tx, mut result_rx) = mpsc::channel::<U>(self.channel_capacity);
        let transform = Arc::new(transform);
        let barrier = CompletionBarrier::new();
        let job_timeout = self.job_timeout;

        for worker_id in 0..workers {
            let guard = barrier.enter();
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let transform = Arc::clone(&transform);
            let signal = signal.clone();
            let timed_out = timed_out.clone();

            handles.push(tokio::spawn(async move {
                let _guard = guard;
                loop {
                    let job = tokio::select! {
                        biased;
                        _ = signal.cancelled() => break,
                        job = job_rx.recv() => match job {
                            Ok(job) => job,
                            Err(_) => break,
                        },
                    };

                    let step = bounded_step(transform(job), job_timeout);
                    let out = tokio::select! {
                        biased;
                        _ = signal.cancelled() => break,
                        out = step => out,
                    };

                    let Some(out) = out else {
                        timed_out.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(worker_id, ?job_timeout, "job step timed out");
                        continue;
                    };

                    let sent = tokio::select! {
                        biased;
                        _ = signal.cancelled() => break,
                        sent = result_tx.send(out) => sent,
                    };
                    if sent.is_err() {
                        break;
                    }
                }
                tracing::trace!(worker_id, "worker exited");
            }));
        }
        drop(job_rx);
        handles.push(barrier.close_when_done(result_tx));

        let mut results = Vec::with_capacity(total);
        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    cancelled = true;
                    break;
                }
                item = result_rx.recv() => match item {
                    Some(out) => results.push(out),
                    None => break,
                },
            }
        }

        if cancelled {
            // Юниты в полете видят тот же сигнал и выходят сами,
            // их результаты никто не читает
            drop(result_rx);
            drop(handles);
            tracing::debug!(results = results.len(), "cancelled, returning partial results");
        } else {
            join_handles(handles).await?;
            tracing::debug!(results = results.len(), "cancellable run drained");
        }

        Ok(CancelReport {
            results,
            submitted: submitted.load(Ordering::Relaxed),
            timed_out: timed_out.load(Ordering::Relaxed),
            cancelled,
        })
    }
}


async fn bounded_step<Fut>(fut: Fut, timeout: Option<Duration>) -> Option<Fut::Output>
where
    Fut: Future,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}
