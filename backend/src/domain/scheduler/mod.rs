//! Scheduled maintenance: heart refill, streaks, league settlement and the
//! expiry sweeps.
//!
//! Each job registers with a [`Scheduler`] that reads the injected clock,
//! sleeps through an injected [`JobSleeper`] and runs the job on its own
//! loop. Runs are at-most-once: a failure is logged and the job waits for
//! its next tick.

mod jobs;
mod runner;
mod schedule;

pub use jobs::{
    BoosterSweepJob, FlashQuestSweepJob, HeartRefillJob, LeagueSettlementJob, StreakJob, yesterday,
};
pub use runner::{JobSleeper, ScheduledJob, Scheduler, TickReport, TokioSleeper};
pub use schedule::Schedule;
