//! Live notifications fanned out to every connected viewer.

use serde::{Deserialize, Serialize};

use crate::domain::ids::{MissionId, SubmissionId, TeamId, UserId};
use crate::domain::mission::SubmissionStatus;

/// Broadcast event; serialises as `{"type": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Notification {
    MissionSubmitted {
        submission_id: SubmissionId,
        mission_id: MissionId,
        mission_title: String,
        team_id: TeamId,
        user_id: UserId,
    },
    MissionVerified {
        submission_id: SubmissionId,
        mission_id: MissionId,
        team_id: TeamId,
        status: SubmissionStatus,
    },
    TeamCreated {
        team_id: TeamId,
        name: String,
        captain_id: UserId,
    },
    TeamMemberJoined {
        team_id: TeamId,
        team_name: String,
        user_id: UserId,
        user_name: String,
    },
    CiResult {
        submission_id: SubmissionId,
        ci_run_id: String,
        status: SubmissionStatus,
    },
}
