//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, web};
use serde_json::Value;

use crate::domain::User;
use crate::domain::ports::{
    MockAccountService, MockLeaderboardService, MockLeagueService, MockLearningPathService,
    MockMissionService, MockProgressService, MockSocialService, MockStoreService,
    MockTeamService,
};

use super::error::{json_config, path_config, query_config};
use super::state::{HttpState, HttpStatePorts, WebhookSecret};

/// Token accepted by [`MockPorts::authenticate_as`].
pub const TEST_TOKEN: &str = "test-token";
/// Secret configured for the CI webhook in tests.
pub const TEST_WEBHOOK_SECRET: &str = "ci-webhook-secret";

/// `Authorization` header carrying [`TEST_TOKEN`].
pub fn bearer() -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
}

/// One mock per driving port; unused mocks panic if a handler calls them.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountService,
    pub social: MockSocialService,
    pub teams: MockTeamService,
    pub learning: MockLearningPathService,
    pub progress: MockProgressService,
    pub missions: MockMissionService,
    pub store: MockStoreService,
    pub leagues: MockLeagueService,
    pub leaderboard: MockLeaderboardService,
}

impl MockPorts {
    /// Resolve [`TEST_TOKEN`] to `user` for any number of requests.
    pub fn authenticate_as(&mut self, user: User) {
        self.accounts
            .expect_authenticate()
            .withf(|token| token == TEST_TOKEN)
            .returning(move |_| Ok(user.clone()));
    }

    /// Freeze the mocks into handler state.
    pub fn into_state(self) -> HttpState {
        HttpState::new(
            HttpStatePorts {
                accounts: Arc::new(self.accounts),
                social: Arc::new(self.social),
                teams: Arc::new(self.teams),
                learning: Arc::new(self.learning),
                progress: Arc::new(self.progress),
                missions: Arc::new(self.missions),
                store: Arc::new(self.store),
                leagues: Arc::new(self.leagues),
                leaderboard: Arc::new(self.leaderboard),
            },
            WebhookSecret::new(TEST_WEBHOOK_SECRET),
        )
    }
}

/// App carrying the state and extractor settings used in production.
pub fn test_app(
    ports: MockPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(ports.into_state()))
        .app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
}

/// Read a response body as JSON.
pub async fn read_json(response: ServiceResponse) -> Value {
    actix_web::test::read_body_json(response).await
}
