//! Missions and the submission verification state machine.
//!
//! A submission starts `PENDING` and moves exactly once to `APPROVED` or
//! `REJECTED`, either through a verifier decision or a CI webhook. Terminal
//! submissions never move again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{MissionId, SubmissionId, TeamId, UserId};
use crate::domain::learning::NirdDomain;

/// Lifecycle of a mission definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    Draft,
    Active,
    Archived,
}

impl MissionStatus {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl std::str::FromStr for MissionStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "ACTIVE" => Ok(Self::Active),
            "ARCHIVED" => Ok(Self::Archived),
            other => Err(UnknownLabel(other.to_owned())),
        }
    }
}

/// Error raised when a stored status label is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status label: {0}")]
pub struct UnknownLabel(pub String);

/// How a mission is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionRequirement {
    CiTest {
        criteria: String,
    },
    LighthouseScore {
        criteria: String,
        threshold: u32,
    },
    ManualReview {
        criteria: String,
    },
    CodeQuality {
        criteria: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<u32>,
    },
}

/// Real-world task verified by a reviewer or CI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: MissionId,
    pub title: String,
    pub description: String,
    #[serde(rename = "categoryNIRD")]
    pub category: NirdDomain,
    pub points: u32,
    pub xp_reward: u32,
    pub gems_reward: u32,
    pub requirements: Vec<MissionRequirement>,
    pub difficulty: u8,
    pub status: MissionStatus,
}

/// Mission list filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissionFilter {
    pub domain: Option<NirdDomain>,
    pub status: Option<MissionStatus>,
}

/// Verification state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether no further transition is allowed.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Apply a decision to the current status.
    ///
    /// # Examples
    /// ```
    /// use podium::domain::{SubmissionStatus, TransitionError, VerificationDecision};
    ///
    /// let next = SubmissionStatus::Pending.resolve(VerificationDecision::Approved);
    /// assert_eq!(next, Ok(SubmissionStatus::Approved));
    /// let again = SubmissionStatus::Approved.resolve(VerificationDecision::Rejected);
    /// assert_eq!(again, Err(TransitionError::AlreadyResolved));
    /// ```
    pub fn resolve(self, decision: VerificationDecision) -> Result<Self, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::AlreadyResolved);
        }
        Ok(decision.into())
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(UnknownLabel(other.to_owned())),
        }
    }
}

/// Illegal submission transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("submission already verified")]
    AlreadyResolved,
}

/// Terminal decision on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationDecision {
    Approved,
    Rejected,
}

impl VerificationDecision {
    /// Map a CI run status: only `passed` approves.
    pub fn from_ci_status(status: &str) -> Self {
        if status == "passed" {
            Self::Approved
        } else {
            Self::Rejected
        }
    }
}

impl From<VerificationDecision> for SubmissionStatus {
    fn from(value: VerificationDecision) -> Self {
        match value {
            VerificationDecision::Approved => Self::Approved,
            VerificationDecision::Rejected => Self::Rejected,
        }
    }
}

/// A team's attempt at a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub team_id: TeamId,
    pub mission_id: MissionId,
    pub user_id: UserId,
    pub status: SubmissionStatus,
    pub repository_url: Option<String>,
    pub notes: Option<String>,
    pub ci_run_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub ci_result: Option<serde_json::Value>,
    pub verifier_id: Option<UserId>,
    pub verifier_notes: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// New pending submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub team_id: TeamId,
    pub mission_id: MissionId,
    pub user_id: UserId,
    pub repository_url: Option<String>,
    pub notes: Option<String>,
}

/// Who resolved a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Verifier {
    /// A user holding VERIFIER or CAPTAIN.
    Reviewer {
        user_id: UserId,
        notes: Option<String>,
    },
    /// An external CI run reported through the webhook.
    Ci {
        run_id: String,
        result: Option<serde_json::Value>,
    },
}

/// Decision to persist for a pending submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub submission_id: SubmissionId,
    pub decision: VerificationDecision,
    pub verifier: Verifier,
    pub at: DateTime<Utc>,
}
