//! Orchestrator tuning knobs.

/// Concurrency and background-processing settings for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Writes in flight at once within a single stage.
    pub max_concurrency: usize,
    /// Onboarding horizons longer than this many nights run in the background.
    pub background_threshold_nights: u32,
    /// Background worker tasks. Zero disables background sync, so every
    /// onboarding runs inline.
    pub worker_count: usize,
    /// Background jobs that may wait in the queue.
    pub queue_capacity: usize,
    /// Times a background job replays its failed writes before dead-lettering them.
    pub job_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            background_threshold_nights: 30,
            worker_count: 2,
            queue_capacity: 64,
            job_retries: 2,
        }
    }
}

impl SyncConfig {
    /// Runs every write of a stage one after another.
    pub fn sequential() -> Self {
        Self {
            max_concurrency: 1,
            ..Self::default()
        }
    }

    pub(crate) fn effective_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}
