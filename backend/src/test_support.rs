//! Shared doubles and fixtures for unit tests inside the crate.
//!
//! Only compiled for `cfg(test)`; integration tests under `tests/` carry their
//! own support modules.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    AccessibilityPreferences, Badge, BadgeCriteria, BadgeId, DisplayName, Email, InviteCode, Lesson,
    LessonContent, LessonId, LessonInDomain, Login, Mission, MissionId, MissionRequirement,
    MissionStatus, NirdDomain, Progression, Rarity, RoleSet, StoreItem, StoreItemId,
    StoreItemKind, Submission, SubmissionId, SubmissionStatus, Team, TeamId, TeamName, UnitId,
    User, UserId,
};

/// Clock whose time only moves when a test says so.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed instant used across fixtures: Wednesday 2026-03-11 10:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 11, 10, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("valid fixture instant"))
}

pub fn sample_user() -> User {
    User {
        id: UserId::random(),
        login: Login::new("ada_l").expect("fixture login"),
        name: DisplayName::new("Ada Lovelace").expect("fixture name"),
        email: Email::new("ada@example.org").expect("fixture email"),
        avatar: None,
        roles: RoleSet::newcomer(),
        progression: Progression {
            gems: 20,
            ..Progression::starting(5)
        },
        team_id: None,
        accessibility_prefs: AccessibilityPreferences::default(),
        created_at: fixed_now(),
    }
}

pub fn sample_lesson(heart_cost: u32, xp_reward: u32) -> LessonInDomain {
    LessonInDomain {
        lesson: Lesson {
            id: LessonId::random(),
            unit_id: UnitId::random(),
            title: "Alt text basics".into(),
            description: "Describe images for screen readers".into(),
            difficulty: 1,
            xp_reward,
            heart_cost,
            order: 1,
            content: LessonContent::Reading {
                body: "Every image needs an alternative.".into(),
            },
        },
        domain: NirdDomain::Accessibility,
    }
}

pub fn sample_mission() -> Mission {
    Mission {
        id: MissionId::random(),
        title: "Publish under a free licence".into(),
        description: "Add a LICENSE file to the team repository".into(),
        category: NirdDomain::OpenSource,
        points: 50,
        xp_reward: 120,
        gems_reward: 15,
        requirements: vec![MissionRequirement::ManualReview {
            criteria: "Licence file present".into(),
        }],
        difficulty: 2,
        status: MissionStatus::Active,
    }
}

pub fn sample_team() -> Team {
    Team {
        id: TeamId::random(),
        name: TeamName::new("Green Coders").expect("fixture team name"),
        description: None,
        total_points: 0,
        team_xp: 0,
        momentum_score: 0,
        invite_code: InviteCode::from_stored("ABCD2345".into()),
        created_at: fixed_now(),
    }
}

pub fn sample_submission(team_id: TeamId, mission_id: MissionId, user_id: UserId) -> Submission {
    Submission {
        id: SubmissionId::random(),
        team_id,
        mission_id,
        user_id,
        status: SubmissionStatus::Pending,
        repository_url: Some("https://git.example.org/green/site".into()),
        notes: None,
        ci_run_id: None,
        ci_result: None,
        verifier_id: None,
        verifier_notes: None,
        timestamp: fixed_now(),
        verified_at: None,
    }
}

pub fn sample_item(kind: StoreItemKind, cost_gems: u32) -> StoreItem {
    StoreItem {
        id: StoreItemId::random(),
        title: kind.as_str().to_lowercase(),
        description: String::new(),
        kind,
        cost_gems,
        icon: "star".into(),
        available: true,
    }
}

pub fn sample_badge(criteria: BadgeCriteria) -> Badge {
    Badge {
        id: BadgeId::random(),
        title: "First steps".into(),
        description: "Complete a lesson".into(),
        icon: "footprints".into(),
        criteria,
        rarity: Rarity::Common,
    }
}
