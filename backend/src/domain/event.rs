//! Append-only audit events.
//!
//! Every progress-affecting action records exactly one primary event. The
//! payload is a tagged union so each event kind carries statically known
//! fields; the storage tag is derived from the payload.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{BadgeId, LessonId, MissionId, StoreItemId, SubmissionId, TeamId, UserId};
use crate::domain::learning::NirdDomain;
use crate::domain::league::League;
use crate::domain::mission::SubmissionStatus;
use crate::domain::store::StoreItemKind;

/// Event payload; the variant names the event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum EventPayload {
    LessonCompleted {
        lesson_id: LessonId,
        domain: NirdDomain,
        xp_earned: u32,
    },
    LessonFailed {
        lesson_id: LessonId,
        errors_count: u32,
        hearts_used: u32,
    },
    BadgeEarned {
        badge_id: BadgeId,
        title: String,
    },
    LevelUp {
        domain: NirdDomain,
        level: u32,
    },
    StreakMilestone {
        streak: u32,
    },
    MissionSubmitted {
        submission_id: SubmissionId,
        mission_id: MissionId,
    },
    MissionVerified {
        submission_id: SubmissionId,
        mission_id: MissionId,
        status: SubmissionStatus,
        xp_earned: u32,
        gems_earned: u32,
        points_earned: u32,
    },
    LeaguePromoted {
        from: League,
        to: League,
    },
    LeagueDemoted {
        from: League,
        to: League,
    },
    TeamJoined {
        team_id: TeamId,
        team_name: String,
        created: bool,
    },
    ItemPurchased {
        item_id: StoreItemId,
        item_type: StoreItemKind,
        cost_gems: u32,
    },
    HeartRestored {
        gems_spent: u32,
    },
}

impl EventPayload {
    /// Storage tag of the event.
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::LessonCompleted { .. } => "LESSON_COMPLETED",
            Self::LessonFailed { .. } => "LESSON_FAILED",
            Self::BadgeEarned { .. } => "BADGE_EARNED",
            Self::LevelUp { .. } => "LEVEL_UP",
            Self::StreakMilestone { .. } => "STREAK_MILESTONE",
            Self::MissionSubmitted { .. } => "MISSION_SUBMITTED",
            Self::MissionVerified { .. } => "MISSION_VERIFIED",
            Self::LeaguePromoted { .. } => "LEAGUE_PROMOTED",
            Self::LeagueDemoted { .. } => "LEAGUE_DEMOTED",
            Self::TeamJoined { .. } => "TEAM_JOINED",
            Self::ItemPurchased { .. } => "ITEM_PURCHASED",
            Self::HeartRestored { .. } => "HEART_RESTORED",
        }
    }
}

/// Event to append to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
    pub payload: EventPayload,
}

impl NewEvent {
    /// Event about one user.
    pub fn for_user(user_id: UserId, payload: EventPayload) -> Self {
        Self {
            user_id: Some(user_id),
            team_id: None,
            payload,
        }
    }

    /// Attach the team the event concerns.
    #[must_use]
    pub fn with_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }
}

/// Streak lengths that earn a milestone event.
pub fn is_streak_milestone(streak: u32) -> bool {
    matches!(streak, 3 | 7 | 14 | 30 | 50 | 100 | 365)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn payload_tag_matches_event_type() {
        let payload = EventPayload::LevelUp {
            domain: NirdDomain::Sustainability,
            level: 4,
        };
        let value = serde_json::to_value(&payload).expect("serialise");
        assert_eq!(
            value,
            json!({ "type": "LEVEL_UP", "domain": "SUSTAINABILITY", "level": 4 })
        );
        assert_eq!(value["type"], payload.event_type());
    }

    #[rstest]
    fn fields_are_camel_cased() {
        let payload = EventPayload::HeartRestored { gems_spent: 10 };
        let value = serde_json::to_value(&payload).expect("serialise");
        assert_eq!(value["gemsSpent"], 10);
    }

    #[rstest]
    #[case(7, true)]
    #[case(8, false)]
    #[case(100, true)]
    fn milestones(#[case] streak: u32, #[case] expected: bool) {
        assert_eq!(is_streak_milestone(streak), expected);
    }
}
