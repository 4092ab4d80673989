use super::{
    barrier::join_handles,
    config::Config,
    errors::ProcessError,
    result::ProcessResult,
};
use std::{
    future::Future,
    ops::{Add, Mul},
};
use futures::future;
use tokio::{sync::mpsc, task::JoinHandle};


/// Задачи стадий, собранные при подключении цепочки
struct StageSet {
    capacity: usize,
    handles: Vec<JoinHandle<()>>,
}

type Connect<I, O> = Box<dyn FnOnce(mpsc::Receiver<I>, &mut StageSet) -> mpsc::Receiver<O> + Send>;

/// Цепочка стадий, соединенных каналами.
///
/// Каждая стадия это отдельная задача с одним производителем и одним
/// потребителем на каждом канале, поэтому порядок задач сохраняется.
/// Стадия закрывает только свой выходной канал.
///
/// ```ignore
/// let out = Pipeline::new()
///     .stage(|x: i64| x * 2)
///     .stage(|x| x + 1)
///     .run(vec![1, 2, 3])
///     .await?;
/// assert_eq!(out, vec![3, 5, 7]);
/// ```
pub struct Pipeline<I, O> {
    connect: Connect<I, O>,
    stages: usize,
    channel_capacity: usize,
}

impl<T: Send + 'static> Pipeline<T, T> {
    pub fn new() -> Self {
        Self {
            connect: Box::new(|rx: mpsc::Receiver<T>, _: &mut StageSet| rx),
            stages: 0,
            channel_capacity: Config::default().channel_capacity,
        }
    }
}

impl<T: Send + 'static> Default for Pipeline<T, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pipeline<T, T>
where
    T: Mul<Output = T> + Add<Output = T> + Copy + Send + Sync + 'static,
{
    /// Две стадии: «×factor», затем «+addend»
    pub fn multiply_then_add(factor: T, addend: T) -> Self {
        Self::new()
            .stage(move |x| x * factor)
            .stage(move |x| x + addend)
    }
}

impl<I, O> Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn with_channel_capacity(mut self, capacity: usize) -> ProcessResult<Self> {
        if capacity == 0 {
            return Err(ProcessError::ZeroCapacity);
        }
        self.channel_capacity = capacity;
        Ok(self)
    }

    pub fn with_config(self, config: &Config) -> ProcessResult<Self> {
        self.with_channel_capacity(config.channel_capacity)
    }

    #[inline]
    pub fn stages(&self) -> usize {
        self.stages
    }

    pub fn stage<V, F>(self, mut f: F) -> Pipeline<I, V>
    where
        V: Send + 'static,
        F: FnMut(O) -> V + Send + 'static,
    {
        self.stage_async(move |item| future::ready(f(item)))
    }

    pub fn stage_async<V, F, Fut>(self, mut f: F) -> Pipeline<I, V>
    where
        V: Send + 'static,
        F: FnMut(O) -> Fut + Send + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        let prev = self.connect;
        let stage_no = self.stages;

        Pipeline {
            connect: Box::new(move |rx: mpsc::Receiver<I>, set: &mut StageSet| {
                let mut input = prev(rx, set);
                let (tx, output) = mpsc::channel::<V>(set.capacity);

                set.handles.push(tokio::spawn(async move {
                    let mut forwarded = 0usize;
                    while let Some(item) = input.recv().await {
                        if tx.send(f(item).await).await.is_err() {
                            break;
                        }
                        forwarded += 1;
                    }
                    tracing::trace!(stage = stage_no, forwarded, "stage exited");
                }));
                output
            }),
            stages: self.stages + 1,
            channel_capacity: self.channel_capacity,
        }
    }

    #[tracing::instrument(name = "pipeline", skip_all, fields(jobs = jobs.len(), stages = self.stages))]
    pub async fn run(self, jobs: Vec<I>) -> ProcessResult<Vec<O>> {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut set = StageSet {
            capacity: self.channel_capacity,
            handles: Vec::with_capacity(self.stages + 1),
        };

        let (source_tx, source_rx) = mpsc::channel::<I>(self.channel_capacity);
        set.handles.push(tokio::spawn(async move {
            for job in jobs {
                if source_tx.send(job).await.is_err() {
                    break;
                }
            }
        }));

        let mut output = (self.connect)(source_rx, &mut set);
        let mut results = Vec::with_capacity(total);
        while let Some(out) = output.recv().await {
            results.push(out);
        }

        join_handles(set.handles).await?;
        tracing::debug!(results = results.len(), "pipeline drained");
        Ok(results)
    }
}
