//! Port for missions, submissions and reward disbursement.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    DomainProgress, Mission, MissionFilter, MissionId, MissionReward, NewSubmission, Submission,
    SubmissionId, TeamId, Verification,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by mission repository adapters.
    pub enum MissionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "mission repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "mission repository query failed: {message}",
        /// The submission left `PENDING` before this decision was applied.
        AlreadyResolved => "submission already verified",
    }
}

/// Result of resolving a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSubmission {
    pub submission: Submission,
    /// Updated aggregate of the mission's domain for approvals.
    pub domain_progress: Option<DomainProgress>,
}

/// Port for missions and submissions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MissionRepository: Send + Sync {
    /// Missions matching the filter.
    async fn list(&self, filter: &MissionFilter) -> Result<Vec<Mission>, MissionRepositoryError>;

    /// One mission.
    async fn find(&self, id: &MissionId) -> Result<Option<Mission>, MissionRepositoryError>;

    /// Submissions of a team, newest first.
    async fn team_submissions(
        &self,
        team: &TeamId,
    ) -> Result<Vec<Submission>, MissionRepositoryError>;

    /// Insert a pending submission with its MISSION_SUBMITTED event.
    async fn create_submission(
        &self,
        submission: &NewSubmission,
        at: DateTime<Utc>,
    ) -> Result<Submission, MissionRepositoryError>;

    /// One submission.
    async fn find_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Submission>, MissionRepositoryError>;

    /// Move a pending submission to its terminal status and disburse
    /// `reward` in the same transaction.
    ///
    /// The status change is conditional on the submission still being
    /// pending; a lost race yields [`MissionRepositoryError::AlreadyResolved`]
    /// and no reward.
    async fn resolve_submission(
        &self,
        verification: &Verification,
        mission: &Mission,
        reward: &MissionReward,
    ) -> Result<ResolvedSubmission, MissionRepositoryError>;
}
