//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::domain::ports::{
    AccountService, LeaderboardService, LeagueService, LearningPathService, MissionService,
    ProgressService, SocialService, StoreService, TeamService,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountService>,
    pub social: Arc<dyn SocialService>,
    pub teams: Arc<dyn TeamService>,
    pub learning: Arc<dyn LearningPathService>,
    pub progress: Arc<dyn ProgressService>,
    pub missions: Arc<dyn MissionService>,
    pub store: Arc<dyn StoreService>,
    pub leagues: Arc<dyn LeagueService>,
    pub leaderboard: Arc<dyn LeaderboardService>,
}

/// Shared secret presented by the CI system on webhook calls.
#[derive(Clone)]
pub struct WebhookSecret(Arc<Zeroizing<String>>);

impl WebhookSecret {
    /// Wrap the configured secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::new(Zeroizing::new(secret.into())))
    }

    /// Compare `presented` against the secret without short-circuiting on the
    /// first differing byte.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        if expected.is_empty() || expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(..)")
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub social: Arc<dyn SocialService>,
    pub teams: Arc<dyn TeamService>,
    pub learning: Arc<dyn LearningPathService>,
    pub progress: Arc<dyn ProgressService>,
    pub missions: Arc<dyn MissionService>,
    pub store: Arc<dyn StoreService>,
    pub leagues: Arc<dyn LeagueService>,
    pub leaderboard: Arc<dyn LeaderboardService>,
    pub webhook_secret: WebhookSecret,
}

impl HttpState {
    /// Construct state from a ports bundle and the CI webhook secret.
    pub fn new(ports: HttpStatePorts, webhook_secret: WebhookSecret) -> Self {
        let HttpStatePorts {
            accounts,
            social,
            teams,
            learning,
            progress,
            missions,
            store,
            leagues,
            leaderboard,
        } = ports;
        Self {
            accounts,
            social,
            teams,
            learning,
            progress,
            missions,
            store,
            leagues,
            leaderboard,
            webhook_secret,
        }
    }
}
