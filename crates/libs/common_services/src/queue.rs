use async_trait::async_trait;
use common_types::ImageBatch;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Executes one admitted batch to completion.
///
/// Implementations absorb their own per-image problems; a returned error means
/// the whole batch failed and is logged by the runner, which then moves on to
/// the next queued batch for the job.
#[async_trait]
pub trait BatchProcessor: Send + Sync + 'static {
    async fn process(&self, job_id: &str, batch: ImageBatch) -> color_eyre::Result<()>;
}

/// Admission outcome returned to the submitting caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The batch went straight to the running slot; a runner was spawned.
    Started,
    /// The batch joined the backlog at the given 1-based position.
    Queued { position: usize },
}

/// Point-in-time view of one job's processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobQueueState {
    pub is_active: bool,
    pub pending_count: usize,
}

#[derive(Default)]
struct QueueState {
    /// True iff a batch for this job is currently executing the pipeline.
    active: bool,
    backlog: VecDeque<ImageBatch>,
    /// Batches admitted but not yet started; mirrors `backlog.len()`.
    pending: usize,
    /// Handle of the current activation's runner, retained so shutdown and
    /// tests can deterministically wait for the backlog to drain.
    runner: Option<JoinHandle<()>>,
}

/// Per-job admission state: owns the backlog and the exclusion primitive for
/// exactly one job. The mutex is only ever held for non-await bookkeeping.
struct JobQueue {
    job_id: String,
    state: Mutex<QueueState>,
}

impl JobQueue {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().expect("job queue state lock poisoned")
    }
}

/// Serializes batch processing per job while letting distinct jobs proceed
/// fully in parallel.
///
/// Per-job entries are created lazily on first reference. Admission and the
/// runner's drain step synchronize on the same per-job mutex, so a finishing
/// runner can never race a new `submit` into starting a second runner.
pub struct JobRegistry {
    jobs: DashMap<String, Arc<JobQueue>>,
    processor: Arc<dyn BatchProcessor>,
}

impl JobRegistry {
    #[must_use]
    pub fn new(processor: Arc<dyn BatchProcessor>) -> Self {
        Self {
            jobs: DashMap::new(),
            processor,
        }
    }

    /// Admits a batch for the job and returns immediately.
    ///
    /// If the job is idle the batch starts processing on a freshly spawned
    /// runner task; otherwise it is appended to the job's FIFO backlog and the
    /// caller learns its 1-based queue position at admission time.
    pub fn submit(&self, job_id: &str, batch: ImageBatch) -> Admission {
        let queue = self
            .jobs
            .entry(job_id.to_string())
            .or_insert_with(|| {
                Arc::new(JobQueue {
                    job_id: job_id.to_string(),
                    state: Mutex::new(QueueState::default()),
                })
            })
            .clone();

        let mut state = queue.lock();
        if state.active || !state.backlog.is_empty() {
            state.backlog.push_back(batch);
            state.pending += 1;
            return Admission::Queued {
                position: state.pending,
            };
        }

        state.active = true;
        state.pending = 0;
        let handle = tokio::spawn(run_job(
            Arc::clone(&queue),
            Arc::clone(&self.processor),
            batch,
        ));
        state.runner = Some(handle);
        Admission::Started
    }

    /// Current `{is_active, pending_count}` for a job, if it has ever been
    /// submitted to.
    #[must_use]
    pub fn snapshot(&self, job_id: &str) -> Option<JobQueueState> {
        self.jobs.get(job_id).map(|queue| {
            let state = queue.lock();
            JobQueueState {
                is_active: state.active,
                pending_count: state.pending,
            }
        })
    }

    /// Waits until the job has no running batch and an empty backlog.
    ///
    /// Awaits the retained runner handle rather than polling; the sleep only
    /// covers the case where another waiter already took the handle.
    pub async fn wait_until_idle(&self, job_id: &str) {
        loop {
            let handle = {
                let Some(queue) = self.jobs.get(job_id) else {
                    return;
                };
                let mut state = queue.lock();
                if !state.active && state.backlog.is_empty() {
                    return;
                }
                state.runner.take()
            };
            match handle {
                Some(handle) => {
                    if let Err(error) = handle.await {
                        warn!(job_id, %error, "job runner task failed");
                    }
                }
                None => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
    }

    /// Drains every known job; used on shutdown.
    pub async fn wait_all_idle(&self) {
        let job_ids: Vec<String> = self.jobs.iter().map(|entry| entry.key().clone()).collect();
        for job_id in job_ids {
            self.wait_until_idle(&job_id).await;
        }
    }
}

/// One activation's runner: processes the starting batch, then drains the
/// backlog in admission order. Exactly one runner owns a job at a time.
async fn run_job(queue: Arc<JobQueue>, processor: Arc<dyn BatchProcessor>, first: ImageBatch) {
    let mut batch = first;
    loop {
        if let Err(error) = processor.process(&queue.job_id, batch).await {
            warn!(job_id = %queue.job_id, %error, "batch failed, continuing with backlog");
        }

        // Atomically either pick up the next batch or go idle; submit holds
        // the same lock when deciding whether to start a new runner.
        let next = {
            let mut state = queue.lock();
            match state.backlog.pop_front() {
                Some(next) => {
                    state.pending = state.pending.saturating_sub(1);
                    Some(next)
                }
                None => {
                    state.active = false;
                    state.pending = 0;
                    None
                }
            }
        };

        match next {
            Some(next) => batch = next,
            None => {
                debug!(job_id = %queue.job_id, "backlog drained, job idle");
                break;
            }
        }
    }
}
