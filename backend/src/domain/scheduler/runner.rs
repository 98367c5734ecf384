//! Tick loop that fires registered jobs on their schedules.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::domain::{Error, TraceId};

use super::Schedule;

/// A unit of periodic work.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Stable name used in log fields.
    fn name(&self) -> &'static str;

    /// When the job fires.
    fn schedule(&self) -> Schedule;

    /// Run once at `now`, returning the number of affected rows.
    async fn run(&self, now: DateTime<Utc>) -> Result<usize, Error>;
}

/// Async sleeping abstraction so tests can skip wall-clock waits.
#[async_trait]
pub trait JobSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl JobSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Outcome of one scheduled tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Instant the job was due.
    pub due: DateTime<Utc>,
    /// Rows affected, or `None` when the run failed.
    pub affected: Option<usize>,
}

/// Runs jobs independently; a failing job waits for its next tick and never
/// blocks the others.
#[derive(Clone)]
pub struct Scheduler {
    jobs: Vec<Arc<dyn ScheduledJob>>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn JobSleeper>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new(clock: Arc<dyn Clock>, sleeper: Arc<dyn JobSleeper>) -> Self {
        Self {
            jobs: Vec::new(),
            clock,
            sleeper,
        }
    }

    /// Register a job.
    #[must_use]
    pub fn with_job(mut self, job: Arc<dyn ScheduledJob>) -> Self {
        self.jobs.push(job);
        self
    }

    /// Names of the registered jobs.
    pub fn job_names(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|job| job.name()).collect()
    }

    /// Sleep until the job's next fire time, then run it once.
    ///
    /// `previous` is the due time of the last tick for this job. The next
    /// fire time is always strictly after it, so a wall clock that lags the
    /// sleep timer cannot fire the same slot twice. The job sees the later
    /// of the wake-up time and `due`.
    ///
    /// The run happens inside a fresh [`TraceId`] scope. Failures are logged
    /// and reported, never retried.
    pub async fn tick(
        &self,
        job: &dyn ScheduledJob,
        previous: Option<DateTime<Utc>>,
    ) -> TickReport {
        let now = self.clock.utc();
        let from = previous.map_or(now, |previous| previous.max(now));
        let due = job.schedule().next_after(from);
        let wait = (due - now).to_std().unwrap_or(Duration::ZERO);
        self.sleeper.sleep(wait).await;

        let run_at = self.clock.utc().max(due);
        let job_name = job.name();
        let trace_id = TraceId::generate();
        let affected = TraceId::scope(trace_id, async {
            info!(job = job_name, %trace_id, %due, "scheduled job started");
            match job.run(run_at).await {
                Ok(affected) => {
                    info!(job = job_name, %trace_id, affected, "scheduled job finished");
                    Some(affected)
                }
                Err(err) => {
                    error!(
                        job = job_name,
                        %trace_id,
                        code = ?err.code(),
                        error = %err,
                        "scheduled job failed"
                    );
                    None
                }
            }
        })
        .await;
        TickReport { due, affected }
    }

    /// Spawn one loop per registered job on the current runtime.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        self.jobs
            .iter()
            .map(|job| {
                let scheduler = self.clone();
                let job = Arc::clone(job);
                tokio::spawn(async move {
                    let mut previous = None;
                    loop {
                        let report = scheduler.tick(job.as_ref(), previous).await;
                        previous = Some(report.due);
                    }
                })
            })
            .collect()
    }
}
