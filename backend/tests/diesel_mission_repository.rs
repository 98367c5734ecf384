//! Integration tests for `DieselMissionRepository` against embedded PostgreSQL.
//!
//! Resolution must update a submission only while it is `PENDING` and pay the
//! submitter and the team inside the same transaction.

#[allow(dead_code)]
#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;
#[allow(dead_code)]
#[path = "support/seed_rows.rs"]
mod seed_rows;

use chrono::Utc;
use podium::domain::ports::{MissionRepository, MissionRepositoryError, ResolvedSubmission};
use podium::domain::rewards::evaluate_mission_verification;
use podium::domain::{
    Mission, MissionId, NewSubmission, NirdDomain, SubmissionId, SubmissionStatus, TeamId, UserId,
    Verification, VerificationDecision, Verifier,
};
use podium::outbound::persistence::DieselMissionRepository;
use postgres::Client;
use rstest::{fixture, rstest};
use uuid::Uuid;

use embedded_postgres::{TestDatabase, test_database};
use seed_rows::{
    PlayerRow, balances, connect, count, format_postgres_error, insert_player, insert_team,
};

/// Seeded "Améliorer Lighthouse Accessibilité": 100 points, 50 XP, 25 gems.
const LIGHTHOUSE_MISSION: &str = "00000000-0000-4000-a000-000000000301";
const LEVEL_SIZE: u64 = 100;

struct MissionContext {
    db: TestDatabase,
    client: Client,
    repository: DieselMissionRepository,
    team: Uuid,
    submitter: Uuid,
    reviewer: Uuid,
}

impl MissionContext {
    fn mission(&self, id: &str) -> Mission {
        let id = MissionId::new(id).expect("mission id");
        self.db
            .runtime
            .block_on(self.repository.find(&id))
            .expect("find mission")
            .expect("mission seeded")
    }

    fn submit(&self, mission: &Mission) -> SubmissionId {
        let request = NewSubmission {
            team_id: TeamId::from_uuid(self.team),
            mission_id: mission.id,
            user_id: UserId::from_uuid(self.submitter),
            repository_url: Some("https://forge.example/podium/audit".to_owned()),
            notes: None,
        };
        self.db
            .runtime
            .block_on(self.repository.create_submission(&request, Utc::now()))
            .expect("submission created")
            .id
    }

    fn approve(
        &self,
        submission: SubmissionId,
        mission: &Mission,
    ) -> Result<ResolvedSubmission, MissionRepositoryError> {
        let verification = Verification {
            submission_id: submission,
            decision: VerificationDecision::Approved,
            verifier: Verifier::Reviewer {
                user_id: UserId::from_uuid(self.reviewer),
                notes: None,
            },
            at: Utc::now(),
        };
        let reward = evaluate_mission_verification(mission, verification.decision);
        self.db
            .runtime
            .block_on(self.repository.resolve_submission(&verification, mission, &reward))
    }

    fn team_totals(&mut self) -> (i64, i64) {
        let row = self
            .client
            .query_one(
                "SELECT total_points, team_xp FROM teams WHERE id = $1",
                &[&self.team],
            )
            .unwrap_or_else(|err| panic!("team totals: {}", format_postgres_error(&err)));
        (row.get(0), row.get(1))
    }
}

#[fixture]
fn mission_context() -> Option<MissionContext> {
    let db = test_database()?;
    let mut client = connect(&db.url);
    let team = insert_team(&mut client, "Les Sobres");
    let submitter = insert_player(
        &mut client,
        &PlayerRow {
            team_id: Some(team),
            ..PlayerRow::new("lin_t")
        },
    );
    let reviewer = insert_player(
        &mut client,
        &PlayerRow {
            team_id: Some(team),
            ..PlayerRow::new("kat_j")
        },
    );
    let repository = DieselMissionRepository::new(db.pool.clone(), LEVEL_SIZE);
    Some(MissionContext {
        db,
        client,
        repository,
        team,
        submitter,
        reviewer,
    })
}

#[rstest]
fn approval_pays_the_submitter_and_the_team(mission_context: Option<MissionContext>) {
    let Some(mut context) = mission_context else {
        eprintln!("SKIP-TEST-CLUSTER: approval_pays_the_submitter_and_the_team skipped");
        return;
    };
    let mission = context.mission(LIGHTHOUSE_MISSION);
    let submission = context.submit(&mission);

    let resolved = context.approve(submission, &mission).expect("approved");

    assert_eq!(resolved.submission.status, SubmissionStatus::Approved);
    let progress = resolved.domain_progress.expect("domain progress");
    assert_eq!(progress.domain, NirdDomain::Accessibility);
    assert_eq!((progress.xp, progress.missions_completed), (50, 1));
    let submitter = balances(&mut context.client, context.submitter);
    assert_eq!((submitter.xp_total, submitter.gems), (50, 25));
    assert_eq!(context.team_totals(), (100, 50));
}

#[rstest]
fn a_second_resolution_is_refused_and_pays_nothing(mission_context: Option<MissionContext>) {
    let Some(mut context) = mission_context else {
        eprintln!("SKIP-TEST-CLUSTER: a_second_resolution_is_refused_and_pays_nothing skipped");
        return;
    };
    let mission = context.mission(LIGHTHOUSE_MISSION);
    let submission = context.submit(&mission);
    context.approve(submission, &mission).expect("first approval");
    let paid = balances(&mut context.client, context.submitter);
    let team_paid = context.team_totals();

    let error = context
        .approve(submission, &mission)
        .expect_err("already resolved");

    assert_eq!(error, MissionRepositoryError::AlreadyResolved);
    assert_eq!(balances(&mut context.client, context.submitter), paid);
    assert_eq!(context.team_totals(), team_paid);
    let verified_events = count(
        &mut context.client,
        "SELECT COUNT(*) FROM event_log WHERE user_id = $1 AND event_type = 'MISSION_VERIFIED'",
        context.submitter,
    );
    assert_eq!(verified_events, 1);
}

#[rstest]
fn approving_a_zero_reward_mission_still_counts_it(mission_context: Option<MissionContext>) {
    let Some(mut context) = mission_context else {
        eprintln!("SKIP-TEST-CLUSTER: approving_a_zero_reward_mission_still_counts_it skipped");
        return;
    };
    let mission_id = Uuid::new_v4();
    context
        .client
        .execute(
            concat!(
                "INSERT INTO missions (id, title, description, category, points, xp_reward, ",
                "gems_reward) VALUES ($1, 'Relire la charte', 'Mission de bienvenue', ",
                "'OPEN_SOURCE', 0, 0, 0)"
            ),
            &[&mission_id],
        )
        .unwrap_or_else(|err| panic!("insert mission: {}", format_postgres_error(&err)));
    let mission = context.mission(&mission_id.to_string());
    let submission = context.submit(&mission);

    let resolved = context.approve(submission, &mission).expect("approved");

    let progress = resolved.domain_progress.expect("domain progress");
    assert_eq!(progress.domain, NirdDomain::OpenSource);
    assert_eq!((progress.xp, progress.missions_completed), (0, 1));
    assert_eq!(context.team_totals(), (0, 0));
}

#[rstest]
fn rejection_closes_the_submission_without_payout(mission_context: Option<MissionContext>) {
    let Some(mut context) = mission_context else {
        eprintln!("SKIP-TEST-CLUSTER: rejection_closes_the_submission_without_payout skipped");
        return;
    };
    let mission = context.mission(LIGHTHOUSE_MISSION);
    let submission = context.submit(&mission);
    let verification = Verification {
        submission_id: submission,
        decision: VerificationDecision::Rejected,
        verifier: Verifier::Ci {
            run_id: "run-7".to_owned(),
            result: None,
        },
        at: Utc::now(),
    };
    let reward = evaluate_mission_verification(&mission, verification.decision);

    let resolved = context
        .db
        .runtime
        .block_on(
            context
                .repository
                .resolve_submission(&verification, &mission, &reward),
        )
        .expect("rejected");

    assert_eq!(resolved.submission.status, SubmissionStatus::Rejected);
    assert!(resolved.domain_progress.is_none());
    let submitter = balances(&mut context.client, context.submitter);
    assert_eq!((submitter.xp_total, submitter.gems), (0, 0));
    assert_eq!(context.team_totals(), (0, 0));
}
