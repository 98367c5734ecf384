//! Tests for the account service.

use std::sync::Arc;

use chrono::Duration;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    IssuedToken, MockPasswordHasher, MockProgressRepository, MockTeamRepository,
    MockTokenService, MockUserRepository, StoredCredentials,
};
use crate::domain::{ErrorCode, UserId};
use crate::test_support::{MutableClock, fixed_now, sample_team, sample_user};

struct Doubles {
    users: MockUserRepository,
    hasher: MockPasswordHasher,
    tokens: MockTokenService,
    progress: MockProgressRepository,
    teams: MockTeamRepository,
}

impl Doubles {
    fn new() -> Self {
        Self {
            users: MockUserRepository::new(),
            hasher: MockPasswordHasher::new(),
            tokens: MockTokenService::new(),
            progress: MockProgressRepository::new(),
            teams: MockTeamRepository::new(),
        }
    }

    fn issuing_tokens(mut self) -> Self {
        self.tokens.expect_issue().returning(|_, now| {
            Ok(IssuedToken {
                token: "signed.jwt.token".into(),
                expires_at: now + Duration::days(7),
            })
        });
        self
    }

    fn build(self) -> AccountServiceImpl<MockUserRepository> {
        AccountServiceImpl::new(
            Arc::new(self.users),
            AccountPorts {
                hasher: Arc::new(self.hasher),
                tokens: Arc::new(self.tokens),
                progress: Arc::new(self.progress),
                teams: Arc::new(self.teams),
            },
            Arc::new(MutableClock::new(fixed_now())),
            5,
        )
    }
}

fn register_request() -> RegisterRequest {
    RegisterRequest {
        login: "ada_l".into(),
        name: "Ada Lovelace".into(),
        email: "Ada@Example.org".into(),
        password: "correct horse".into(),
    }
}

#[tokio::test]
async fn register_hashes_password_and_starts_with_full_hearts() {
    let mut doubles = Doubles::new().issuing_tokens();
    doubles
        .hasher
        .expect_hash()
        .times(1)
        .return_once(|_| Ok("$argon2id$hash".into()));
    doubles
        .users
        .expect_create()
        .withf(|new_user| {
            new_user.hearts == 5
                && new_user.password_hash == "$argon2id$hash"
                && new_user.email.as_ref() == "ada@example.org"
        })
        .times(1)
        .return_once(|_| Ok(sample_user()));

    let session = doubles
        .build()
        .register(register_request())
        .await
        .expect("registration succeeds");

    assert_eq!(session.token, "signed.jwt.token");
    assert_eq!(session.expires_at, fixed_now() + Duration::days(7));
}

#[rstest]
#[case::short_login(RegisterRequest { login: "ab".into(), ..register_request() })]
#[case::bad_email(RegisterRequest { email: "not-an-email".into(), ..register_request() })]
#[case::short_password(RegisterRequest { password: "short".into(), ..register_request() })]
#[case::blank_name(RegisterRequest { name: "   ".into(), ..register_request() })]
#[tokio::test]
async fn register_rejects_invalid_input_before_hashing(#[case] request: RegisterRequest) {
    let mut doubles = Doubles::new();
    doubles.hasher.expect_hash().times(0);
    doubles.users.expect_create().times(0);

    let error = doubles
        .build()
        .register(request)
        .await
        .expect_err("invalid input");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(UserRepositoryError::duplicate_login(), "Username already exists")]
#[case(UserRepositoryError::duplicate_email(), "Email already exists")]
#[tokio::test]
async fn register_reports_duplicates(
    #[case] failure: UserRepositoryError,
    #[case] message: &str,
) {
    let mut doubles = Doubles::new();
    doubles
        .hasher
        .expect_hash()
        .return_once(|_| Ok("hash".into()));
    doubles
        .users
        .expect_create()
        .times(1)
        .return_once(move |_| Err(failure));

    let error = doubles
        .build()
        .register(register_request())
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), message);
}

#[tokio::test]
async fn login_touches_last_active_on_success() {
    let user = sample_user();
    let user_id = user.id;
    let mut doubles = Doubles::new().issuing_tokens();
    doubles
        .users
        .expect_find_credentials()
        .times(1)
        .return_once(move |_| {
            Ok(Some(StoredCredentials {
                user,
                password_hash: "hash".into(),
            }))
        });
    doubles.hasher.expect_verify().return_once(|_, _| Ok(true));
    doubles
        .users
        .expect_touch_last_active()
        .withf(move |id, at| *id == user_id && *at == fixed_now())
        .times(1)
        .return_once(|_, _| Ok(()));

    let session = doubles
        .build()
        .login(LoginRequest {
            login: "ada_l".into(),
            password: "correct horse".into(),
        })
        .await
        .expect("login succeeds");

    assert_eq!(session.user.progression.last_active_date, Some(fixed_now()));
}

#[rstest]
#[case::unknown_login(false)]
#[case::wrong_password(true)]
#[tokio::test]
async fn login_failures_share_one_message(#[case] known: bool) {
    let mut doubles = Doubles::new();
    doubles
        .users
        .expect_find_credentials()
        .return_once(move |_| {
            Ok(known.then(|| StoredCredentials {
                user: sample_user(),
                password_hash: "hash".into(),
            }))
        });
    doubles.hasher.expect_verify().returning(|_, _| Ok(false));
    doubles.users.expect_touch_last_active().times(0);

    let error = doubles
        .build()
        .login(LoginRequest {
            login: "ada_l".into(),
            password: "wrong".into(),
        })
        .await
        .expect_err("rejected");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "Invalid credentials");
}

#[rstest]
#[case(TokenError::expired())]
#[case(TokenError::invalid("bad signature"))]
#[tokio::test]
async fn authenticate_rejects_bad_tokens(#[case] failure: TokenError) {
    let mut doubles = Doubles::new();
    doubles
        .tokens
        .expect_verify()
        .return_once(move |_, _| Err(failure));
    doubles.users.expect_find_by_id().times(0);

    let error = doubles
        .build()
        .authenticate("token")
        .await
        .expect_err("unauthorised");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn authenticate_rejects_tokens_for_deleted_users() {
    let mut doubles = Doubles::new();
    doubles
        .tokens
        .expect_verify()
        .return_once(|_, _| Ok(UserId::random()));
    doubles
        .users
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(None));

    let error = doubles
        .build()
        .authenticate("token")
        .await
        .expect_err("unauthorised");

    assert_eq!(error.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn profile_includes_team_summary() {
    let team = sample_team();
    let mut user = sample_user();
    user.team_id = Some(team.id);
    let team_id = team.id;

    let mut doubles = Doubles::new();
    doubles
        .progress
        .expect_domain_progress()
        .return_once(|_| Ok(Vec::new()));
    doubles
        .progress
        .expect_earned_badges()
        .return_once(|_| Ok(Vec::new()));
    doubles
        .progress
        .expect_active_boosters()
        .withf(|_, now| *now == fixed_now())
        .return_once(|_, _| Ok(Vec::new()));
    doubles
        .teams
        .expect_find()
        .times(1)
        .return_once(move |_| Ok(Some(team)));

    let profile = doubles.build().profile(&user).await.expect("profile");

    let summary = profile.team.expect("team summary");
    assert_eq!(summary.id, team_id);
    assert_eq!(summary.name, "Green Coders");
}

#[tokio::test]
async fn profile_maps_unavailable_storage() {
    let mut doubles = Doubles::new();
    doubles
        .progress
        .expect_domain_progress()
        .return_once(|_| Err(ProgressRepositoryError::connection("down")));

    let error = doubles
        .build()
        .profile(&sample_user())
        .await
        .expect_err("unavailable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}
