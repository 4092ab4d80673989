use thiserror::Error;

/// Ошибки запуска стратегий обработки.
///
/// Частичный результат при отмене ошибкой не считается.
#[derive(Debug, Error, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub enum ProcessError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("semaphore needs at least one permit")]
    ZeroPermits,
    #[error("channel capacity must be at least 1")]
    ZeroCapacity,
    #[error("semaphore closed")]
    SemaphoreClosed,
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
    #[error("join failed: {0}")]
    JoinFailed(String),
}
