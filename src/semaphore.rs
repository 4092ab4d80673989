use super::{
    errors::ProcessError,
    model::SemaphoreMetrics,
    result::ProcessResult,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::{OwnedSemaphorePermit, TryAcquireError};


/// Счетный семафор с гарантированным освобождением токена.
///
/// Токен освобождается в `Drop` у [`Permit`], поэтому пара acquire/release
/// сохраняется и при панике, и при отмене future на любом await.
#[derive(Clone)]
pub struct Semaphore {
    inner: Arc<SemaphoreInner>,
}

struct SemaphoreInner {
    permits: Arc<tokio::sync::Semaphore>,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Semaphore {
    /// Емкость выше `MAX_PERMITS` tokio урезается до него
    pub fn new(capacity: usize) -> ProcessResult<Self> {
        if capacity == 0 {
            return Err(ProcessError::ZeroPermits);
        }
        let capacity = capacity.min(tokio::sync::Semaphore::MAX_PERMITS);
        Ok(Self {
            inner: Arc::new(SemaphoreInner {
                permits: Arc::new(tokio::sync::Semaphore::new(capacity)),
                capacity,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Ждет свободный токен
    pub async fn acquire(&self) -> ProcessResult<Permit> {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ProcessError::SemaphoreClosed)?;
        Ok(self.track(permit))
    }

    /// `Ok(None)` если все токены заняты
    pub fn try_acquire(&self) -> ProcessResult<Option<Permit>> {
        match self.inner.permits.clone().try_acquire_owned() {
            Ok(permit) => Ok(Some(self.track(permit))),
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(ProcessError::SemaphoreClosed),
        }
    }

    pub fn close(&self) {
        self.inner.permits.close();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.permits.is_closed()
    }

    pub fn metrics(&self) -> SemaphoreMetrics {
        SemaphoreMetrics {
            capacity: self.inner.capacity,
            available: self.available(),
            in_flight: self.inner.in_flight.load(Ordering::Acquire),
            peak: self.inner.peak.load(Ordering::Acquire),
        }
    }

    fn track(&self, permit: OwnedSemaphorePermit) -> Permit {
        let now = self.inner.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.peak.fetch_max(now, Ordering::AcqRel);
        Permit {
            inner: self.inner.clone(),
            _permit: permit,
        }
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("metrics", &self.metrics())
            .finish()
    }
}


/// Токен семафора. Освобождается при drop.
pub struct Permit {
    inner: Arc<SemaphoreInner>,
    // Поле дропается после `Drop::drop`, так что in_flight уменьшается
    // раньше, чем токен возвращается в семафор
    _permit: OwnedSemaphorePermit,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
