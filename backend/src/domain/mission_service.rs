//! Mission submission and verification workflow.
//!
//! A submission moves PENDING to APPROVED or REJECTED exactly once. The
//! service validates the decision against the loaded snapshot; the repository
//! applies the status change with a conditional update in the same
//! transaction as the reward deltas, so two concurrent verifiers cannot both
//! disburse.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    CiReport, MissionRepository, MissionRepositoryError, MissionService, NotificationRelay,
    SubmitMissionRequest, VerificationResult, VerifySubmissionRequest,
};
use crate::domain::rewards::evaluate_mission_verification;
use crate::domain::{
    BadgeAwarder, DomainDelta, Error, Mission, MissionFilter, MissionId, NewSubmission,
    Notification, Submission, SubmissionId, SubmissionStatus, TeamId, User, Verification,
    VerificationDecision, Verifier,
};

const ALREADY_VERIFIED: &str = "Submission already verified";

fn map_repository_error(error: MissionRepositoryError) -> Error {
    match error {
        MissionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("mission repository unavailable: {message}"))
        }
        MissionRepositoryError::Query { message } => {
            Error::internal(format!("mission repository error: {message}"))
        }
        MissionRepositoryError::AlreadyResolved => Error::invalid_state(ALREADY_VERIFIED),
    }
}

fn require_team(user: &User) -> Result<TeamId, Error> {
    user.team_id
        .ok_or_else(|| Error::invalid_request("You must be in a team"))
}

/// Mission service implementing [`MissionService`].
#[derive(Clone)]
pub struct MissionServiceImpl<R> {
    repo: Arc<R>,
    relay: Arc<dyn NotificationRelay>,
    awarder: BadgeAwarder,
    clock: Arc<dyn Clock>,
}

impl<R> MissionServiceImpl<R> {
    /// Create the service.
    pub fn new(
        repo: Arc<R>,
        relay: Arc<dyn NotificationRelay>,
        awarder: BadgeAwarder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            relay,
            awarder,
            clock,
        }
    }
}

impl<R> MissionServiceImpl<R>
where
    R: MissionRepository,
{
    async fn mission(&self, id: &MissionId) -> Result<Mission, Error> {
        self.repo
            .find(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("Mission not found"))
    }

    async fn submission(&self, id: &SubmissionId) -> Result<Submission, Error> {
        self.repo
            .find_submission(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("Submission not found"))
    }

    /// Persist a decision, disburse rewards and run follow-up bookkeeping.
    async fn resolve(
        &self,
        submission: Submission,
        decision: VerificationDecision,
        verifier: Verifier,
    ) -> Result<VerificationResult, Error> {
        submission
            .status
            .resolve(decision)
            .map_err(|_| Error::invalid_state(ALREADY_VERIFIED))?;

        let mission = self.mission(&submission.mission_id).await?;
        let reward = evaluate_mission_verification(&mission, decision);
        let verification = Verification {
            submission_id: submission.id,
            decision,
            verifier,
            at: self.clock.utc(),
        };
        let resolved = self
            .repo
            .resolve_submission(&verification, &mission, &reward)
            .await
            .map_err(map_repository_error)?;

        let submission = resolved.submission;
        info!(
            submission_id = %submission.id,
            mission_id = %mission.id,
            team_id = %submission.team_id,
            status = submission.status.as_str(),
            "submission resolved"
        );

        if decision == VerificationDecision::Approved {
            let delta = DomainDelta::mission(mission.category, reward.user_xp);
            let update = resolved.domain_progress.as_ref().map(|p| (p, &delta));
            self.awarder.after_progress(&submission.user_id, update).await;
        }

        self.relay
            .broadcast(Notification::MissionVerified {
                submission_id: submission.id,
                mission_id: submission.mission_id,
                team_id: submission.team_id,
                status: submission.status,
            })
            .await;

        Ok(VerificationResult { submission, reward })
    }
}

#[async_trait]
impl<R> MissionService for MissionServiceImpl<R>
where
    R: MissionRepository,
{
    async fn list(&self, filter: MissionFilter) -> Result<Vec<Mission>, Error> {
        self.repo.list(&filter).await.map_err(map_repository_error)
    }

    async fn team_submissions(&self, user: &User) -> Result<Vec<Submission>, Error> {
        let team = require_team(user)?;
        self.repo
            .team_submissions(&team)
            .await
            .map_err(map_repository_error)
    }

    async fn submit(
        &self,
        user: &User,
        mission: &MissionId,
        request: SubmitMissionRequest,
    ) -> Result<Submission, Error> {
        let team_id = require_team(user)?;
        let mission = self.mission(mission).await?;

        let submission = self
            .repo
            .create_submission(
                &NewSubmission {
                    team_id,
                    mission_id: mission.id,
                    user_id: user.id,
                    repository_url: request.repository_url,
                    notes: request.notes,
                },
                self.clock.utc(),
            )
            .await
            .map_err(map_repository_error)?;

        info!(
            submission_id = %submission.id,
            mission_id = %mission.id,
            team_id = %team_id,
            "mission submitted"
        );
        self.relay
            .broadcast(Notification::MissionSubmitted {
                submission_id: submission.id,
                mission_id: mission.id,
                mission_title: mission.title,
                team_id,
                user_id: user.id,
            })
            .await;
        Ok(submission)
    }

    async fn verify(
        &self,
        user: &User,
        submission: &SubmissionId,
        request: VerifySubmissionRequest,
    ) -> Result<VerificationResult, Error> {
        if !user.roles.can_verify() {
            return Err(Error::forbidden("Only verifiers and captains can verify submissions"));
        }
        let submission = self.submission(submission).await?;
        self.resolve(
            submission,
            request.status,
            Verifier::Reviewer {
                user_id: user.id,
                notes: request.notes,
            },
        )
        .await
    }

    async fn record_ci_result(&self, report: CiReport) -> Result<VerificationResult, Error> {
        let submission = self.submission(&report.submission_id).await?;
        let decision = VerificationDecision::from_ci_status(&report.status);
        let result = self
            .resolve(
                submission,
                decision,
                Verifier::Ci {
                    run_id: report.ci_run_id.clone(),
                    result: report.result,
                },
            )
            .await?;

        self.relay
            .broadcast(Notification::CiResult {
                submission_id: result.submission.id,
                ci_run_id: report.ci_run_id,
                status: SubmissionStatus::from(decision),
            })
            .await;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "mission_service_tests.rs"]
mod tests;
