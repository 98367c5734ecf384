//! Port doubles for integration suites.
//!
//! `TokenAccounts` authenticates a fixed set of bearer tokens. `InMemoryTeams`
//! and `InMemoryMissions` keep just enough state for the real team and
//! mission services to run. `Unavailable` stands in for every port a suite
//! does not exercise.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use podium::domain::ports::{
    AccountService, AuthSession, BadgeRepository, BadgeRepositoryError, EventLog, EventLogError,
    HeartRestoreResult, LeaderboardService, LeagueOverview, LeagueService, LearningPathService,
    LessonSubmission, LessonSubmissionResult, LoginRequest, MissionRepository,
    MissionRepositoryError, ProgressService, PurchaseResult, RegisterRequest, ResolvedSubmission,
    SocialService, StoreService, TeamRepository, TeamRepositoryError, UserProfile,
};
use podium::domain::{
    AccessibilityPreferences, Badge, BadgeId, BadgeStats, DisplayName, Email, Error, FollowStats,
    InviteCode, League, LeaderboardEntry, Lesson, LessonId, Login, Mission, MissionFilter,
    MissionId, MissionReward, MissionStatus, NewEvent, NewSubmission, NirdDomain, NewTeam,
    PathUnit, ProgressOverview, Progression, Role, RoleSet, SettlementOutcome, StoreItem,
    StoreItemId, Submission, SubmissionId, SubmissionStatus, Team, TeamDetails, TeamId,
    TeamLeaderboardEntry, TeamListing, TeamMember, UnitId, User, UserId, Verification, Verifier,
};

pub(crate) const ADA_TOKEN: &str = "ada-token";
pub(crate) const GRACE_TOKEN: &str = "grace-token";
pub(crate) const LIN_TOKEN: &str = "lin-token";
pub(crate) const KAT_TOKEN: &str = "kat-token";

/// Team the mission players belong to.
pub(crate) const MISSION_TEAM_ID: &str = "5d1c0c1e-6b7a-4f0e-9a43-2f6d9c1b7e10";
/// The single mission held by [`InMemoryMissions`].
pub(crate) const MISSION_ID: &str = "8a0f3c52-2e4b-4d1a-b6f7-91c2d3e4f5a6";

fn fixture_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 11, 10, 0, 0)
        .single()
        .expect("valid fixture instant")
}

pub(crate) fn player(login: &str, name: &str) -> User {
    User {
        id: UserId::random(),
        login: Login::new(login).expect("fixture login"),
        name: DisplayName::new(name).expect("fixture name"),
        email: Email::new(format!("{login}@example.org")).expect("fixture email"),
        avatar: None,
        roles: RoleSet::newcomer(),
        progression: Progression::starting(5),
        team_id: None,
        accessibility_prefs: AccessibilityPreferences::default(),
        created_at: fixture_instant(),
    }
}

/// A player already in the mission team, holding `roles`.
pub(crate) fn team_player(login: &str, name: &str, roles: &[Role]) -> User {
    let mut user = player(login, name);
    user.team_id = Some(TeamId::new(MISSION_TEAM_ID).expect("fixture team id"));
    user.roles = RoleSet::new(roles.iter().copied()).expect("fixture roles");
    user
}

/// Accepts a fixed map of bearer tokens.
pub(crate) struct TokenAccounts {
    players: HashMap<String, User>,
}

impl TokenAccounts {
    pub(crate) fn new(players: impl IntoIterator<Item = (&'static str, User)>) -> Self {
        Self {
            players: players
                .into_iter()
                .map(|(token, user)| (token.to_owned(), user))
                .collect(),
        }
    }
}

fn unavailable() -> Error {
    Error::service_unavailable("not wired in this suite")
}

#[async_trait]
impl AccountService for TokenAccounts {
    async fn register(&self, _request: RegisterRequest) -> Result<AuthSession, Error> {
        Err(unavailable())
    }

    async fn login(&self, _request: LoginRequest) -> Result<AuthSession, Error> {
        Err(unavailable())
    }

    async fn authenticate(&self, token: &str) -> Result<User, Error> {
        self.players
            .get(token)
            .cloned()
            .ok_or_else(|| Error::unauthorized("Invalid token"))
    }

    async fn profile(&self, _user: &User) -> Result<UserProfile, Error> {
        Err(unavailable())
    }

    async fn update_accessibility(
        &self,
        _user: &User,
        _prefs: AccessibilityPreferences,
    ) -> Result<User, Error> {
        Err(unavailable())
    }
}

/// Teams held in memory; membership is not tracked.
#[derive(Default)]
pub(crate) struct InMemoryTeams {
    teams: Mutex<Vec<Team>>,
}

impl InMemoryTeams {
    pub(crate) fn invite_code_of(&self, name: &str) -> Option<String> {
        self.teams
            .lock()
            .expect("teams lock")
            .iter()
            .find(|team| team.name.as_ref() == name)
            .map(|team| team.invite_code.as_ref().to_owned())
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeams {
    async fn list(&self) -> Result<Vec<TeamListing>, TeamRepositoryError> {
        Ok(Vec::new())
    }

    async fn create(&self, team: &NewTeam, at: DateTime<Utc>) -> Result<Team, TeamRepositoryError> {
        let mut teams = self.teams.lock().expect("teams lock");
        if teams.iter().any(|existing| existing.name == team.name) {
            return Err(TeamRepositoryError::DuplicateName);
        }
        let created = Team {
            id: TeamId::random(),
            name: team.name.clone(),
            description: team.description.clone(),
            total_points: 0,
            team_xp: 0,
            momentum_score: 0,
            invite_code: team.invite_code.clone(),
            created_at: at,
        };
        teams.push(created.clone());
        Ok(created)
    }

    async fn find(&self, id: &TeamId) -> Result<Option<Team>, TeamRepositoryError> {
        Ok(self
            .teams
            .lock()
            .expect("teams lock")
            .iter()
            .find(|team| team.id == *id)
            .cloned())
    }

    async fn find_details(&self, _id: &TeamId) -> Result<Option<TeamDetails>, TeamRepositoryError> {
        Ok(None)
    }

    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Team>, TeamRepositoryError> {
        Ok(self
            .teams
            .lock()
            .expect("teams lock")
            .iter()
            .find(|team| team.invite_code == *code)
            .cloned())
    }

    async fn join(
        &self,
        _team: &Team,
        _user: &UserId,
        _at: DateTime<Utc>,
    ) -> Result<(), TeamRepositoryError> {
        Ok(())
    }

    async fn member(
        &self,
        _team: &TeamId,
        _user: &UserId,
    ) -> Result<Option<TeamMember>, TeamRepositoryError> {
        Ok(None)
    }

    async fn set_roles(
        &self,
        _team: &TeamId,
        _user: &UserId,
        _roles: &RoleSet,
    ) -> Result<TeamMember, TeamRepositoryError> {
        Err(TeamRepositoryError::query("roles are not tracked in memory"))
    }
}

/// Missions with a single seeded entry; rewards are recorded, not applied.
pub(crate) struct InMemoryMissions {
    mission: Mission,
    submissions: Mutex<Vec<Submission>>,
    payouts: Mutex<Vec<MissionReward>>,
}

impl InMemoryMissions {
    /// Seed the audit mission: 150 points, 75 XP, 40 gems.
    pub(crate) fn seeded() -> Self {
        Self {
            mission: Mission {
                id: MissionId::new(MISSION_ID).expect("fixture mission id"),
                title: "Audit RGAA de la page d'accueil".to_owned(),
                description: "Corriger les contrastes signalés par l'audit.".to_owned(),
                category: NirdDomain::Accessibility,
                points: 150,
                xp_reward: 75,
                gems_reward: 40,
                requirements: Vec::new(),
                difficulty: 2,
                status: MissionStatus::Active,
            },
            submissions: Mutex::new(Vec::new()),
            payouts: Mutex::new(Vec::new()),
        }
    }

    /// Identifier of the most recent submission.
    pub(crate) fn latest_submission(&self) -> Option<SubmissionId> {
        self.submissions
            .lock()
            .expect("submissions lock")
            .last()
            .map(|submission| submission.id)
    }

    /// Rewards disbursed so far, in order.
    pub(crate) fn payouts(&self) -> Vec<MissionReward> {
        self.payouts.lock().expect("payouts lock").clone()
    }
}

#[async_trait]
impl MissionRepository for InMemoryMissions {
    async fn list(&self, _filter: &MissionFilter) -> Result<Vec<Mission>, MissionRepositoryError> {
        Ok(vec![self.mission.clone()])
    }

    async fn find(&self, id: &MissionId) -> Result<Option<Mission>, MissionRepositoryError> {
        Ok((self.mission.id == *id).then(|| self.mission.clone()))
    }

    async fn team_submissions(
        &self,
        team: &TeamId,
    ) -> Result<Vec<Submission>, MissionRepositoryError> {
        let submissions = self.submissions.lock().expect("submissions lock");
        Ok(submissions
            .iter()
            .rev()
            .filter(|submission| submission.team_id == *team)
            .cloned()
            .collect())
    }

    async fn create_submission(
        &self,
        submission: &NewSubmission,
        at: DateTime<Utc>,
    ) -> Result<Submission, MissionRepositoryError> {
        let created = Submission {
            id: SubmissionId::random(),
            team_id: submission.team_id,
            mission_id: submission.mission_id,
            user_id: submission.user_id,
            status: SubmissionStatus::Pending,
            repository_url: submission.repository_url.clone(),
            notes: submission.notes.clone(),
            ci_run_id: None,
            ci_result: None,
            verifier_id: None,
            verifier_notes: None,
            timestamp: at,
            verified_at: None,
        };
        self.submissions
            .lock()
            .expect("submissions lock")
            .push(created.clone());
        Ok(created)
    }

    async fn find_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<Submission>, MissionRepositoryError> {
        Ok(self
            .submissions
            .lock()
            .expect("submissions lock")
            .iter()
            .find(|submission| submission.id == *id)
            .cloned())
    }

    async fn resolve_submission(
        &self,
        verification: &Verification,
        _mission: &Mission,
        reward: &MissionReward,
    ) -> Result<ResolvedSubmission, MissionRepositoryError> {
        let mut submissions = self.submissions.lock().expect("submissions lock");
        let submission = submissions
            .iter_mut()
            .find(|submission| submission.id == verification.submission_id)
            .ok_or_else(|| MissionRepositoryError::query("unknown submission"))?;
        if submission.status != SubmissionStatus::Pending {
            return Err(MissionRepositoryError::AlreadyResolved);
        }
        submission.status = verification.decision.into();
        submission.verified_at = Some(verification.at);
        match &verification.verifier {
            Verifier::Reviewer { user_id, notes } => {
                submission.verifier_id = Some(*user_id);
                submission.verifier_notes = notes.clone();
            }
            Verifier::Ci { run_id, result } => {
                submission.ci_run_id = Some(run_id.clone());
                submission.ci_result = result.clone();
            }
        }
        if submission.status == SubmissionStatus::Approved {
            self.payouts.lock().expect("payouts lock").push(*reward);
        }
        Ok(ResolvedSubmission {
            submission: submission.clone(),
            domain_progress: None,
        })
    }
}

/// Badge catalogue and event sink that hold nothing.
pub(crate) struct NoBadges;

#[async_trait]
impl BadgeRepository for NoBadges {
    async fn catalog(&self) -> Result<Vec<Badge>, BadgeRepositoryError> {
        Ok(Vec::new())
    }

    async fn held_badge_ids(&self, _user: &UserId) -> Result<Vec<BadgeId>, BadgeRepositoryError> {
        Ok(Vec::new())
    }

    async fn stats(&self, _user: &UserId) -> Result<Option<BadgeStats>, BadgeRepositoryError> {
        Ok(None)
    }

    async fn award(
        &self,
        _user: &UserId,
        _badge: &Badge,
        _at: DateTime<Utc>,
    ) -> Result<bool, BadgeRepositoryError> {
        Ok(false)
    }
}

#[async_trait]
impl EventLog for NoBadges {
    async fn append(&self, _event: &NewEvent, _at: DateTime<Utc>) -> Result<(), EventLogError> {
        Ok(())
    }
}

/// Every driving port a suite leaves unwired.
pub(crate) struct Unavailable;

#[async_trait]
impl SocialService for Unavailable {
    async fn follow_stats(&self, _user: &UserId) -> Result<FollowStats, Error> {
        Err(unavailable())
    }

    async fn is_following(&self, _follower: &UserId, _target: &UserId) -> Result<bool, Error> {
        Err(unavailable())
    }

    async fn follow(&self, _actor: &User, _target: &UserId) -> Result<(), Error> {
        Err(unavailable())
    }

    async fn unfollow(&self, _actor: &User, _target: &UserId) -> Result<(), Error> {
        Err(unavailable())
    }
}

#[async_trait]
impl LearningPathService for Unavailable {
    async fn path(&self, _user: &User) -> Result<Vec<PathUnit>, Error> {
        Err(unavailable())
    }

    async fn unit(&self, _user: &User, _unit: &UnitId) -> Result<PathUnit, Error> {
        Err(unavailable())
    }

    async fn start_lesson(&self, _user: &User, _lesson: &LessonId) -> Result<Lesson, Error> {
        Err(unavailable())
    }

    async fn submit_lesson(
        &self,
        _user: &User,
        _lesson: &LessonId,
        _submission: LessonSubmission,
    ) -> Result<LessonSubmissionResult, Error> {
        Err(unavailable())
    }
}

#[async_trait]
impl ProgressService for Unavailable {
    async fn overview(&self, _user: &User) -> Result<ProgressOverview, Error> {
        Err(unavailable())
    }

    async fn restore_heart(&self, _user: &User) -> Result<HeartRestoreResult, Error> {
        Err(unavailable())
    }
}

#[async_trait]
impl StoreService for Unavailable {
    async fn list(&self) -> Result<Vec<StoreItem>, Error> {
        Err(unavailable())
    }

    async fn purchase(&self, _user: &User, _item: &StoreItemId) -> Result<PurchaseResult, Error> {
        Err(unavailable())
    }
}

#[async_trait]
impl LeagueService for Unavailable {
    async fn overview(&self) -> Result<Vec<LeagueOverview>, Error> {
        Err(unavailable())
    }

    async fn settle_week(&self, _user: &User) -> Result<SettlementOutcome, Error> {
        Err(unavailable())
    }
}

#[async_trait]
impl LeaderboardService for Unavailable {
    async fn individual(
        &self,
        _league: Option<League>,
        _limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        Err(unavailable())
    }

    async fn teams(&self) -> Result<Vec<TeamLeaderboardEntry>, Error> {
        Err(unavailable())
    }
}
