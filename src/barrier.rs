use super::{
    errors::ProcessError,
    result::ProcessResult,
};
use std::{
    any::Any,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::{
    sync::Notify,
    task::{JoinError, JoinHandle},
};


/// Барьер завершения: ждет, пока все зарегистрированные юниты не выйдут.
///
/// Каждый юнит держит [`BarrierGuard`]; guard уменьшает счетчик в `Drop`,
/// поэтому барьер срабатывает и если юнит завершился паникой.
#[derive(Clone, Default)]
pub struct CompletionBarrier {
    counter: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует юнит. Вызывать до того, как кто-то начнет `wait`.
    #[inline]
    pub fn enter(&self) -> BarrierGuard {
        self.counter.fetch_add(1, Ordering::Relaxed);
        BarrierGuard {
            counter: self.counter.clone(),
            notify: self.notify.clone(),
        }
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.counter.load(Ordering::Acquire)
    }

    pub async fn wait(&self) {
        loop {
            // Notified подписан на notify_waiters с момента создания
            let notified = self.notify.notified();
            if self.counter.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Запускает задачу, которая дропнет `sender` только после барьера.
    /// Так канал результатов закрывается ровно один раз, когда все
    /// производители вышли.
    pub(crate) fn close_when_done<S>(&self, sender: S) -> JoinHandle<()>
    where
        S: Send + 'static,
    {
        let barrier = self.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            drop(sender);
            tracing::trace!("barrier passed, sink closed");
        })
    }
}

impl std::fmt::Debug for CompletionBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionBarrier")
            .field("pending", &self.pending())
            .finish()
    }
}


pub struct BarrierGuard {
    counter: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        if self.counter.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify.notify_waiters();
        }
    }
}


pub(crate) fn map_join_error(join_err: JoinError) -> ProcessError {
    if join_err.is_panic() {
        ProcessError::WorkerPanicked(panic_message(join_err.into_panic()))
    } else {
        ProcessError::JoinFailed(join_err.to_string())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in spawned task".into()
    }
}

/// Дожидается всех handles и возвращает первую ошибку, если была.
/// Ошибка не прерывает ожидание остальных задач.
pub(crate) async fn join_handles<T>(handles: Vec<JoinHandle<T>>) -> ProcessResult<Vec<T>>
where
    T: Send + 'static,
{
    if handles.is_empty() {
        return Ok(Vec::new());
    }

    let len = handles.len();
    let mut futures = FuturesUnordered::from_iter(handles);
    let mut outputs = Vec::with_capacity(len);
    let mut first_err = None;

    while let Some(res) = futures.next().await {
        match res {
            Ok(out) => outputs.push(out),
            Err(join_err) => {
                let err = map_join_error(join_err);
                tracing::warn!(error = %err, "task failed");
                first_err.get_or_insert(err);
            }
        }
    }

    match first_err {
        Some(err) => Err(err),
        None => Ok(outputs),
    }
}
