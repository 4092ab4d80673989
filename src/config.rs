use super::{
    errors::ProcessError,
    model::JoinOrdering,
    result::ProcessResult,
};
use tokio::time::Duration;


/// Общая конфигурация стратегий обработки
#[derive(Debug, Clone)]
pub struct Config {
    pub workers: usize,
    pub max_concurrent: usize,
    pub channel_capacity: usize,
    pub job_timeout: Option<Duration>,
    pub ordering: JoinOrdering,
}

impl Default for Config {
    fn default() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            workers: num_cpus,
            max_concurrent: num_cpus * 2,
            channel_capacity: 1,
            job_timeout: Some(Duration::from_secs(30)),
            ordering: JoinOrdering::UnOrdered,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            workers: num_cpus,
            max_concurrent: num_cpus,
            channel_capacity: num_cpus,
            job_timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            workers: num_cpus * 2, // Для I/O-bound задач
            max_concurrent: num_cpus * 20,
            channel_capacity: num_cpus * 4,
            job_timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_ordering(mut self, ordering: JoinOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn validate(&self) -> ProcessResult<()> {
        if self.workers == 0 {
            return Err(ProcessError::ZeroWorkers);
        }
        if self.max_concurrent == 0 {
            return Err(ProcessError::ZeroPermits);
        }
        if self.channel_capacity == 0 {
            return Err(ProcessError::ZeroCapacity);
        }
        Ok(())
    }
}
