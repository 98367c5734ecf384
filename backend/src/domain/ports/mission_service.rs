//! Driving port for missions, submissions and verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, Mission, MissionFilter, MissionId, MissionReward, Submission, SubmissionId, User,
    VerificationDecision,
};

/// Submission payload.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMissionRequest {
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Verifier decision payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifySubmissionRequest {
    pub status: VerificationDecision,
    #[serde(default)]
    pub notes: Option<String>,
}

/// CI webhook payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CiReport {
    pub submission_id: SubmissionId,
    pub ci_run_id: String,
    /// `passed` approves; anything else rejects.
    #[schema(example = "passed")]
    pub status: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub result: Option<serde_json::Value>,
}

/// Resolved submission and what it paid out.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub submission: Submission,
    pub reward: MissionReward,
}

/// Domain use-case port for missions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MissionService: Send + Sync {
    /// Missions matching a filter.
    async fn list(&self, filter: MissionFilter) -> Result<Vec<Mission>, Error>;

    /// Submissions of the caller's team.
    async fn team_submissions(&self, user: &User) -> Result<Vec<Submission>, Error>;

    /// Submit the caller's team's work for a mission.
    async fn submit(
        &self,
        user: &User,
        mission: &MissionId,
        request: SubmitMissionRequest,
    ) -> Result<Submission, Error>;

    /// Decide a pending submission; verifiers and captains only.
    async fn verify(
        &self,
        user: &User,
        submission: &SubmissionId,
        request: VerifySubmissionRequest,
    ) -> Result<VerificationResult, Error>;

    /// Decide a pending submission from a CI run.
    async fn record_ci_result(&self, report: CiReport) -> Result<VerificationResult, Error>;
}
