//! Tests for badge awarding.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{MockBadgeRepository, MockEventLog};
use crate::domain::{BadgeCriteria, BadgeStats, ErrorCode, NirdDomain};
use crate::test_support::{MutableClock, fixed_now, sample_badge};

fn progress(xp: u64) -> DomainProgress {
    DomainProgress {
        domain: NirdDomain::Accessibility,
        xp,
        level: 1,
        lessons_completed: 1,
        missions_completed: 0,
    }
}

fn awarder(badges: MockBadgeRepository, events: MockEventLog) -> BadgeAwarder {
    BadgeAwarder::new(
        Arc::new(badges),
        Arc::new(events),
        Arc::new(MutableClock::new(fixed_now())),
        100,
    )
}

#[tokio::test]
async fn evaluate_awards_met_badges_the_user_does_not_hold() {
    let user = UserId::random();
    let first_lesson = sample_badge(BadgeCriteria::LessonsCompleted {
        count: 1,
        domain: None,
    });
    let already_held = sample_badge(BadgeCriteria::XpThreshold { xp: 10 });
    let out_of_reach = sample_badge(BadgeCriteria::Streak { days: 30 });
    let held_id = already_held.id;
    let expected_id = first_lesson.id;
    let catalog = vec![first_lesson.clone(), already_held, out_of_reach];

    let mut badges = MockBadgeRepository::new();
    badges.expect_stats().times(1).return_once(|_| {
        Ok(Some(BadgeStats::new(2, 40, vec![progress(40)])))
    });
    badges.expect_catalog().times(1).return_once(move || Ok(catalog));
    badges
        .expect_held_badge_ids()
        .times(1)
        .return_once(move |_| Ok(vec![held_id]));
    badges
        .expect_award()
        .withf(move |_, badge, at| badge.id == expected_id && *at == fixed_now())
        .times(1)
        .return_once(|_, _, _| Ok(true));

    let awarded = awarder(badges, MockEventLog::new())
        .evaluate(&user)
        .await
        .expect("evaluation succeeds");

    assert_eq!(awarded, vec![first_lesson]);
}

#[tokio::test]
async fn evaluate_skips_badges_awarded_concurrently() {
    let badge = sample_badge(BadgeCriteria::XpThreshold { xp: 10 });
    let catalog = vec![badge];

    let mut badges = MockBadgeRepository::new();
    badges
        .expect_stats()
        .times(1)
        .return_once(|_| Ok(Some(BadgeStats::new(0, 50, Vec::new()))));
    badges.expect_catalog().times(1).return_once(move || Ok(catalog));
    badges
        .expect_held_badge_ids()
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    badges
        .expect_award()
        .times(1)
        .return_once(|_, _, _| Ok(false));

    let awarded = awarder(badges, MockEventLog::new())
        .evaluate(&UserId::random())
        .await
        .expect("evaluation succeeds");

    assert!(awarded.is_empty());
}

#[tokio::test]
async fn evaluate_is_empty_for_unknown_users() {
    let mut badges = MockBadgeRepository::new();
    badges.expect_stats().times(1).return_once(|_| Ok(None));
    badges.expect_catalog().times(0);

    let awarded = awarder(badges, MockEventLog::new())
        .evaluate(&UserId::random())
        .await
        .expect("evaluation succeeds");

    assert!(awarded.is_empty());
}

#[tokio::test]
async fn evaluate_maps_connection_errors() {
    let mut badges = MockBadgeRepository::new();
    badges
        .expect_stats()
        .times(1)
        .return_once(|_| Err(BadgeRepositoryError::connection("pool closed")));

    let error = awarder(badges, MockEventLog::new())
        .evaluate(&UserId::random())
        .await
        .expect_err("repository unavailable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[case(105, 10, true)]
#[case(150, 10, false)]
#[tokio::test]
async fn record_level_up_logs_only_boundary_crossings(
    #[case] xp: u64,
    #[case] gained: u32,
    #[case] crosses: bool,
) {
    let mut events = MockEventLog::new();
    events
        .expect_append()
        .withf(|event, _| matches!(event.payload, EventPayload::LevelUp { level: 2, .. }))
        .times(usize::from(crosses))
        .returning(|_, _| Ok(()));

    let delta = DomainDelta::lesson(NirdDomain::Accessibility, gained);
    let level = awarder(MockBadgeRepository::new(), events)
        .record_level_up(&UserId::random(), &progress(xp), &delta)
        .await
        .expect("level up recorded");

    assert_eq!(level.is_some(), crosses);
}

#[tokio::test]
async fn after_progress_swallows_follow_up_failures() {
    let mut badges = MockBadgeRepository::new();
    badges
        .expect_stats()
        .times(1)
        .return_once(|_| Err(BadgeRepositoryError::query("boom")));
    let mut events = MockEventLog::new();
    events
        .expect_append()
        .times(1)
        .return_once(|_, _| Err(EventLogError::query("insert failed")));

    let delta = DomainDelta::lesson(NirdDomain::Accessibility, 10);
    let awarded = awarder(badges, events)
        .after_progress(&UserId::random(), Some((&progress(100), &delta)))
        .await;

    assert!(awarded.is_empty());
}
