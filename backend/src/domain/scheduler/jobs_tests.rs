//! Tests for the maintenance jobs.

use std::sync::Arc;

use chrono::TimeZone;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockBadgeRepository, MockEventLog, MockLeagueRepository, MockMaintenanceRepository,
    StreakSweep,
};
use crate::domain::{ErrorCode, UserId};
use crate::test_support::{MutableClock, fixed_now};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    on(3, day, hour)
}

fn quiet_awarder(evaluations: usize) -> BadgeAwarder {
    let mut badges = MockBadgeRepository::new();
    badges
        .expect_stats()
        .times(evaluations)
        .returning(|_| Ok(None));
    BadgeAwarder::new(
        Arc::new(badges),
        Arc::new(MockEventLog::new()),
        Arc::new(MutableClock::new(fixed_now())),
        100,
    )
}

fn on(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, hour, 0, 0)
        .single()
        .expect("valid instant")
}

#[rstest]
#[case(on(3, 12, 1), on(3, 11, 0), on(3, 12, 0))]
#[case(on(3, 12, 0), on(3, 11, 0), on(3, 12, 0))]
#[case(on(3, 1, 23), on(2, 28, 0), on(3, 1, 0))]
fn yesterday_covers_the_previous_calendar_day(
    #[case] now: DateTime<Utc>,
    #[case] start: DateTime<Utc>,
    #[case] end: DateTime<Utc>,
) {
    assert_eq!(yesterday(now), ActivityWindow { start, end });
}

#[tokio::test]
async fn heart_refill_uses_the_configured_maximum() {
    let mut repo = MockMaintenanceRepository::new();
    repo.expect_refill_hearts()
        .withf(|max| *max == 5)
        .times(1)
        .return_once(|_| Ok(42));

    let affected = HeartRefillJob::new(Arc::new(repo), 5)
        .run(at(12, 0))
        .await
        .expect("refilled");

    assert_eq!(affected, 42);
}

#[tokio::test]
async fn streak_job_sweeps_yesterday_and_logs_milestones() {
    let now = at(12, 1);
    let milestone_user = UserId::random();
    let plain_user = UserId::random();
    let mut repo = MockMaintenanceRepository::new();
    repo.expect_update_streaks()
        .withf(move |window, sweep_now| *window == yesterday(now) && *sweep_now == now)
        .times(1)
        .return_once(move |_, _| {
            Ok(StreakSweep {
                extended: vec![(milestone_user, 7), (plain_user, 4)],
                reset: 3,
            })
        });
    let mut events = MockEventLog::new();
    events
        .expect_append()
        .withf(move |event, logged_at| {
            event.user_id == Some(milestone_user)
                && event.payload == EventPayload::StreakMilestone { streak: 7 }
                && *logged_at == now
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let affected = StreakJob::new(Arc::new(repo), Arc::new(events), quiet_awarder(2))
        .run(now)
        .await
        .expect("streaks updated");

    assert_eq!(affected, 5);
}

#[tokio::test]
async fn streak_follow_ups_are_best_effort() {
    let user = UserId::random();
    let mut repo = MockMaintenanceRepository::new();
    repo.expect_update_streaks().return_once(move |_, _| {
        Ok(StreakSweep {
            extended: vec![(user, 3)],
            reset: 0,
        })
    });
    let mut events = MockEventLog::new();
    events
        .expect_append()
        .returning(|_, _| Err(crate::domain::ports::EventLogError::query("insert failed")));
    let mut badges = MockBadgeRepository::new();
    badges.expect_stats().returning(|_| {
        Err(crate::domain::ports::BadgeRepositoryError::connection(
            "pool exhausted",
        ))
    });
    let awarder = BadgeAwarder::new(
        Arc::new(badges),
        Arc::new(MockEventLog::new()),
        Arc::new(MutableClock::new(fixed_now())),
        100,
    );

    let affected = StreakJob::new(Arc::new(repo), Arc::new(events), awarder)
        .run(at(12, 1))
        .await
        .expect("sweep committed");

    assert_eq!(affected, 1);
}

#[tokio::test]
async fn streak_sweep_failures_are_reported() {
    let mut repo = MockMaintenanceRepository::new();
    repo.expect_update_streaks()
        .return_once(|_, _| Err(MaintenanceRepositoryError::connection("database down")));

    let error = StreakJob::new(
        Arc::new(repo),
        Arc::new(MockEventLog::new()),
        quiet_awarder(0),
    )
    .run(at(12, 1))
    .await
    .expect_err("sweep failed");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn sweeps_pass_the_run_time_through() {
    let now = at(12, 10);
    let mut repo = MockMaintenanceRepository::new();
    repo.expect_purge_expired_boosters()
        .withf(move |at| *at == now)
        .times(1)
        .return_once(|_| Ok(2));
    repo.expect_deactivate_expired_flash_quests()
        .withf(move |at| *at == now)
        .times(1)
        .return_once(|_| Ok(1));
    let repo: Arc<dyn MaintenanceRepository> = Arc::new(repo);

    let boosters = BoosterSweepJob::new(Arc::clone(&repo))
        .run(now)
        .await
        .expect("boosters purged");
    let quests = FlashQuestSweepJob::new(repo)
        .run(now)
        .await
        .expect("quests closed");

    assert_eq!((boosters, quests), (2, 1));
}

#[tokio::test]
async fn league_job_counts_moves() {
    let mut repo = MockLeagueRepository::new();
    repo.expect_standings().return_once(|| Ok(Vec::new()));
    repo.expect_apply_settlement()
        .times(1)
        .return_once(|_, _| Ok(()));
    let leagues = LeagueServiceImpl::new(
        Arc::new(repo),
        Arc::new(MutableClock::new(fixed_now())),
        20,
    );

    let moves = LeagueSettlementJob::new(leagues)
        .run(fixed_now())
        .await
        .expect("settled");

    assert_eq!(moves, 0);
}

#[test]
fn jobs_follow_the_published_timetable() {
    let repo: Arc<dyn MaintenanceRepository> = Arc::new(MockMaintenanceRepository::new());
    assert_eq!(
        HeartRefillJob::new(Arc::clone(&repo), 5).schedule(),
        Schedule::daily_at(0, 0)
    );
    assert_eq!(
        BoosterSweepJob::new(Arc::clone(&repo)).schedule(),
        Schedule::hourly()
    );
    assert_eq!(
        FlashQuestSweepJob::new(repo).schedule(),
        Schedule::every_minutes(10)
    );
}
