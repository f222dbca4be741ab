//! Background workers for large onboarding horizons.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use common::EventId;
use domain::ReservationLifecycleEvent;
use projection_store::ProjectionStore;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::config::SyncConfig;
use crate::executor::{SyncExecutor, WriteContext};
use crate::report::{FailedWrite, SyncReport};

/// Finished jobs kept for status lookups; older ones are forgotten first.
const FINISHED_JOBS_RETAINED: usize = 1024;

/// Identifier of a background sync job, sequential per pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{:04}", self.0)
    }
}

/// Handle to a submitted job.
#[derive(Debug)]
pub struct JobTicket {
    job_id: JobId,
    completion: oneshot::Receiver<SyncReport>,
}

impl JobTicket {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Waits for the job to finish.
    ///
    /// Returns `None` if the pool shut down before the job ran.
    pub async fn wait(self) -> Option<SyncReport> {
        self.completion.await.ok()
    }
}

/// A write abandoned after every replay failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub job_id: JobId,
    pub event_id: EventId,
    pub failed: FailedWrite,
    /// Times the write was tried, including the first run.
    pub attempts: u32,
}

/// Where a background job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Finished { report: SyncReport },
}

/// Status of recent jobs, shared between the pool handle and its workers.
#[derive(Default)]
struct JobRegistry {
    jobs: BTreeMap<JobId, JobStatus>,
    finished: usize,
}

impl JobRegistry {
    fn set(&mut self, id: JobId, status: JobStatus) {
        if matches!(status, JobStatus::Finished { .. }) {
            self.finished += 1;
        }
        self.jobs.insert(id, status);

        while self.finished > FINISHED_JOBS_RETAINED {
            let oldest = self
                .jobs
                .iter()
                .find(|(_, status)| matches!(status, JobStatus::Finished { .. }))
                .map(|(id, _)| *id);
            let Some(oldest) = oldest else {
                break;
            };
            self.jobs.remove(&oldest);
            self.finished -= 1;
        }
    }
}

type SharedRegistry = Arc<Mutex<JobRegistry>>;

fn update(registry: &SharedRegistry, id: JobId, status: JobStatus) {
    registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .set(id, status);
}

struct Job {
    id: JobId,
    event: ReservationLifecycleEvent,
    completion: oneshot::Sender<SyncReport>,
}

/// A bounded queue of sync jobs drained by a fixed set of tokio tasks.
///
/// A pool started with zero workers accepts no jobs, so every submission is
/// handed back to the caller.
pub struct SyncWorkerPool {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: tokio::sync::Mutex<JoinSet<()>>,
    dead_letters: Arc<Mutex<Vec<DeadLetter>>>,
    registry: SharedRegistry,
    next_job: AtomicU64,
}

impl SyncWorkerPool {
    /// Spawns the workers. Must be called from within a tokio runtime.
    pub fn start<S>(executor: SyncExecutor<S>, config: &SyncConfig) -> Self
    where
        S: ProjectionStore + Clone + 'static,
    {
        let dead_letters = Arc::new(Mutex::new(Vec::new()));
        let registry = SharedRegistry::default();
        let mut workers = JoinSet::new();

        let sender = if config.worker_count == 0 {
            tracing::info!("no sync workers configured, background sync disabled");
            None
        } else {
            let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
            let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
            for worker in 0..config.worker_count {
                workers.spawn(run_worker(
                    worker,
                    executor.clone(),
                    receiver.clone(),
                    config.job_retries,
                    dead_letters.clone(),
                    registry.clone(),
                ));
            }
            tracing::info!(
                workers = config.worker_count,
                queue_capacity = config.queue_capacity,
                "sync worker pool started"
            );
            Some(sender)
        };

        Self {
            sender: Mutex::new(sender),
            workers: tokio::sync::Mutex::new(workers),
            dead_letters,
            registry,
            next_job: AtomicU64::new(0),
        }
    }

    /// Queues an event for background sync.
    ///
    /// Hands the event back if the queue is full or the pool is shut down.
    pub fn submit(
        &self,
        event: ReservationLifecycleEvent,
    ) -> Result<JobTicket, ReservationLifecycleEvent> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            return Err(event);
        };

        let id = JobId(self.next_job.fetch_add(1, Ordering::Relaxed) + 1);
        let (completion, receiver) = oneshot::channel();
        // Registered before sending so a fast worker cannot be overwritten.
        update(&self.registry, id, JobStatus::Queued);
        match sender.try_send(Job {
            id,
            event,
            completion,
        }) {
            Ok(()) => {
                metrics::gauge!("sync_jobs_queued").increment(1.0);
                tracing::debug!(job_id = %id, "sync job queued");
                Ok(JobTicket {
                    job_id: id,
                    completion: receiver,
                })
            }
            Err(TrySendError::Full(job) | TrySendError::Closed(job)) => {
                self.registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .jobs
                    .remove(&id);
                Err(job.event)
            }
        }
    }

    /// Status of a submitted job, or `None` if the id is unknown or was
    /// finished long enough ago to be forgotten.
    pub fn job_status(&self, id: JobId) -> Option<JobStatus> {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .jobs
            .get(&id)
            .cloned()
    }

    /// Returns true while the pool accepts new jobs.
    pub fn is_accepting(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Writes abandoned after all replays, oldest first.
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stops accepting jobs and waits for the workers to drain the queue.
    pub async fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        let mut workers = self.workers.lock().await;
        while let Some(result) = workers.join_next().await {
            if let Err(err) = result {
                tracing::error!(error = %err, "sync worker terminated abnormally");
            }
        }
        tracing::info!("sync worker pool stopped");
    }
}

async fn run_worker<S>(
    worker: usize,
    executor: SyncExecutor<S>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    retries: u32,
    dead_letters: Arc<Mutex<Vec<DeadLetter>>>,
    registry: SharedRegistry,
) where
    S: ProjectionStore + Clone + 'static,
{
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        metrics::gauge!("sync_jobs_queued").decrement(1.0);
        update(&registry, job.id, JobStatus::Running);

        let report = process_job(worker, &executor, &job, retries, &dead_letters).await;
        update(
            &registry,
            job.id,
            JobStatus::Finished {
                report: report.clone(),
            },
        );
        // Deferred events drop their ticket; the registry is their completion record.
        let _ = job.completion.send(report);
    }
    tracing::debug!(worker, "sync worker stopped");
}

#[tracing::instrument(skip_all, fields(job_id = %job.id, event_id = %job.event.event_id))]
async fn process_job<S>(
    worker: usize,
    executor: &SyncExecutor<S>,
    job: &Job,
    retries: u32,
    dead_letters: &Mutex<Vec<DeadLetter>>,
) -> SyncReport
where
    S: ProjectionStore + Clone,
{
    let start = Instant::now();
    let ctx = WriteContext::of(&job.event);
    let mut report = executor.execute(&job.event).await;

    let mut attempts = 1;
    while !report.failed.is_empty() && attempts <= retries {
        tracing::warn!(
            attempt = attempts,
            failed = report.failed.len(),
            "replaying failed writes"
        );
        let pending = std::mem::take(&mut report.failed);
        report.failed = executor.replay(pending, &ctx).await;
        attempts += 1;
    }
    report.settle();

    if !report.failed.is_empty() {
        let mut letters = dead_letters.lock().unwrap_or_else(PoisonError::into_inner);
        for failed in &report.failed {
            tracing::error!(
                date = %failed.date(),
                operation = failed.operation(),
                error = %failed.error,
                attempts,
                "projection write abandoned"
            );
            letters.push(DeadLetter {
                job_id: job.id,
                event_id: job.event.event_id,
                failed: failed.clone(),
                attempts,
            });
        }
        metrics::counter!("sync_dead_letters_total").increment(report.failed.len() as u64);
    }

    let duration = start.elapsed().as_secs_f64();
    metrics::histogram!("sync_job_duration_seconds").record(duration);
    tracing::info!(
        worker,
        nights = report.nights,
        failed = report.failed.len(),
        duration,
        "sync job finished"
    );
    report
}
