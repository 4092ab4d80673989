//! Компонуемые примитивы конкурентной обработки задач поверх tokio
//!
//! # Стратегии
//! - [`WorkerPool`]: фиксированное число воркеров и барьер завершения
//! - [`Pipeline`]: цепочка стадий, соединенных каналами, с сохранением порядка
//! - [`FanOutFanIn`]: воркеры с собственными выходами, слитые в один канал
//! - [`ThrottledProcessor`]: юнит на задачу, параллелизм ограничен семафором
//! - [`CancellableProcessor`]: отмена, дедлайн и timeout на задачу
//!
//! Все стратегии независимы и работают над одной формой задача/результат.
//! Трансформ передается замыканием `Fn(T) -> Future<Output = U>`; ошибочный
//! трансформ выражается через `U = Result<V, E>`.

pub mod barrier;
pub mod cancellable;
pub mod config;
pub mod errors;
pub mod fan;
pub mod model;
pub mod pipeline;
pub mod result;
pub mod semaphore;
pub mod signal;
pub mod throttle;
pub mod worker_pool;

pub use barrier::CompletionBarrier;
pub use cancellable::CancellableProcessor;
pub use config::Config;
pub use errors::ProcessError;
pub use fan::FanOutFanIn;
pub use model::{CancelReport, JoinOrdering, SemaphoreMetrics};
pub use pipeline::Pipeline;
pub use result::ProcessResult;
pub use semaphore::{Permit, Semaphore};
pub use signal::CancelSignal;
pub use throttle::ThrottledProcessor;
pub use worker_pool::WorkerPool;

use std::{
    future::Future,
    ops::{Add, Mul},
};


pub async fn worker_pool<T, U, F, Fut>(jobs: Vec<T>, workers: usize, transform: F) -> ProcessResult<Vec<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    WorkerPool::new(workers)?.run(jobs, transform).await
}

/// Эталонный конвейер: каждый элемент `x` превращается в `x * factor + addend`
pub async fn pipeline<T>(jobs: Vec<T>, factor: T, addend: T) -> ProcessResult<Vec<T>>
where
    T: Mul<Output = T> + Add<Output = T> + Copy + Send + Sync + 'static,
{
    Pipeline::multiply_then_add(factor, addend).run(jobs).await
}

pub async fn fan_out_fan_in<T, U, F, Fut>(jobs: Vec<T>, workers: usize, transform: F) -> ProcessResult<Vec<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    FanOutFanIn::new(workers)?.run(jobs, transform).await
}

pub async fn throttled<T, U, F, Fut>(jobs: Vec<T>, max_concurrent: usize, transform: F) -> ProcessResult<Vec<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    ThrottledProcessor::new(max_concurrent)?.run(jobs, transform).await
}

/// Один воркер, timeout на задачу из `Config::default()`
pub async fn cancellable<T, U, F, Fut>(jobs: Vec<T>, signal: &CancelSignal, transform: F) -> ProcessResult<Vec<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    CancellableProcessor::new(1)?
        .run(jobs, signal, transform)
        .await
}
