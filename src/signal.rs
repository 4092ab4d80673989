use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;


/// Односторонний сигнал отмены с необязательным дедлайном.
///
/// После срабатывания (явный `cancel()` или истекший дедлайн) сигнал
/// больше никогда не сбрасывается.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Дочерний сигнал: видит отмену родителя, но не наоборот
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    #[inline]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Завершается, когда сигнал сработал
    pub async fn cancelled(&self) {
        match self.deadline {
            None => self.token.cancelled().await,
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {
                        self.token.cancel();
                    }
                }
            }
        }
    }
}
