#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaphoreMetrics {
    pub capacity: usize,
    pub available: usize,
    pub in_flight: usize,
    pub peak: usize,
}

impl SemaphoreMetrics {
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.in_flight as f64 / self.capacity as f64
    }

    pub fn peak_utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.peak as f64 / self.capacity as f64
    }
}


/// Итог работы `CancellableProcessor::run_detailed`
#[derive(Debug, Clone)]
pub struct CancelReport<U> {
    pub results: Vec<U>,
    /// Сколько задач успело попасть в очередь до отмены
    pub submitted: usize,
    pub timed_out: usize,
    /// `true`, если дренаж остановлен сигналом отмены
    pub cancelled: bool,
}

impl<U> CancelReport<U> {
    pub fn is_complete(&self, total_jobs: usize) -> bool {
        !self.cancelled && self.results.len() == total_jobs
    }

    pub fn into_results(self) -> Vec<U> {
        self.results
    }
}


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinOrdering {
    Ordered,
    #[default]
    UnOrdered,
}

impl JoinOrdering {
    /// Собирает результаты, помеченные индексом задачи
    pub(crate) fn collect<U>(self, mut tagged: Vec<(usize, U)>) -> Vec<U> {
        if self == JoinOrdering::Ordered {
            tagged.sort_unstable_by_key(|(idx, _)| *idx);
        }
        tagged.into_iter().map(|(_, out)| out).collect()
    }
}
