//! Builders wiring Diesel repositories into domain services and adapter state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::warn;
use url::Url;

use podium::domain::ports::{EventLog, MaintenanceRepository, NotificationRelay};
use podium::domain::scheduler::{
    BoosterSweepJob, FlashQuestSweepJob, HeartRefillJob, LeagueSettlementJob, Scheduler,
    StreakJob, TokioSleeper,
};
use podium::domain::{
    AccountPorts, AccountServiceImpl, BadgeAwarder, LeaderboardServiceImpl,
    LearningPathServiceImpl, LeagueServiceImpl, MissionServiceImpl, ProgressServiceImpl,
    SocialServiceImpl, StoreServiceImpl, TeamServiceImpl,
};
use podium::inbound::http::state::{HttpState, HttpStatePorts, WebhookSecret};
use podium::inbound::ws::state::{WsRegistry, WsState};
use podium::outbound::persistence::{
    DbPool, DieselBadgeRepository, DieselEventLog, DieselLeagueRepository,
    DieselLearningRepository, DieselMaintenanceRepository, DieselMissionRepository,
    DieselProgressRepository, DieselSocialRepository, DieselStoreRepository,
    DieselTeamRepository, DieselUserRepository,
};
use podium::outbound::security::{Argon2PasswordHasher, JwtTokenService};
use podium::settings::RuntimeConfig;

use super::ServerConfig;

/// Adapter state and background jobs sharing one set of repositories.
pub(super) struct Components {
    pub(super) http_state: web::Data<HttpState>,
    pub(super) ws_state: web::Data<WsState>,
    pub(super) scheduler: Scheduler,
}

/// Repositories shared by the services and the scheduler.
struct Repositories {
    users: Arc<DieselUserRepository>,
    teams: Arc<DieselTeamRepository>,
    progress: Arc<DieselProgressRepository>,
    leagues: Arc<DieselLeagueRepository>,
    events: Arc<dyn EventLog>,
    maintenance: Arc<dyn MaintenanceRepository>,
}

impl Repositories {
    fn new(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            teams: Arc::new(DieselTeamRepository::new(pool.clone())),
            progress: Arc::new(DieselProgressRepository::new(pool.clone())),
            leagues: Arc::new(DieselLeagueRepository::new(pool.clone())),
            events: Arc::new(DieselEventLog::new(pool.clone())),
            maintenance: Arc::new(DieselMaintenanceRepository::new(pool.clone())),
        }
    }
}

fn parse_frontend_origin(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(error) => {
            warn!(
                origin = raw,
                error = %error,
                "frontend origin is not a URL; WebSocket accepts localhost only"
            );
            None
        }
    }
}

fn build_http_state(
    pool: &DbPool,
    repos: &Repositories,
    runtime: &RuntimeConfig,
    relay: Arc<dyn NotificationRelay>,
    awarder: &BadgeAwarder,
    clock: &Arc<dyn Clock>,
) -> HttpState {
    let rules = runtime.rules.clone();
    let accounts = AccountServiceImpl::new(
        repos.users.clone(),
        AccountPorts {
            hasher: Arc::new(Argon2PasswordHasher::default()),
            tokens: Arc::new(JwtTokenService::new(&runtime.jwt_secret, runtime.token_ttl)),
            progress: repos.progress.clone(),
            teams: repos.teams.clone(),
        },
        clock.clone(),
        rules.max_hearts,
    );
    let learning = LearningPathServiceImpl::new(
        Arc::new(DieselLearningRepository::new(pool.clone(), rules.level_size)),
        repos.progress.clone(),
        awarder.clone(),
        clock.clone(),
        rules.clone(),
    );
    let missions = MissionServiceImpl::new(
        Arc::new(DieselMissionRepository::new(pool.clone(), rules.level_size)),
        relay.clone(),
        awarder.clone(),
        clock.clone(),
    );

    let ports = HttpStatePorts {
        accounts: Arc::new(accounts),
        social: Arc::new(SocialServiceImpl::new(
            Arc::new(DieselSocialRepository::new(pool.clone())),
            repos.users.clone(),
            clock.clone(),
        )),
        teams: Arc::new(TeamServiceImpl::new(repos.teams.clone(), relay, clock.clone())),
        learning: Arc::new(learning),
        progress: Arc::new(ProgressServiceImpl::new(
            repos.progress.clone(),
            clock.clone(),
            rules.clone(),
        )),
        missions: Arc::new(missions),
        store: Arc::new(StoreServiceImpl::new(
            Arc::new(DieselStoreRepository::new(pool.clone())),
            clock.clone(),
            rules,
        )),
        leagues: Arc::new(LeagueServiceImpl::new(
            repos.leagues.clone(),
            clock.clone(),
            runtime.league_promotion_percent,
        )),
        leaderboard: Arc::new(LeaderboardServiceImpl::new(repos.leagues.clone())),
    };

    HttpState::new(
        ports,
        WebhookSecret::new(runtime.ci_webhook_secret.as_str()),
    )
}

fn build_scheduler(
    repos: &Repositories,
    runtime: &RuntimeConfig,
    awarder: BadgeAwarder,
    clock: Arc<dyn Clock>,
) -> Scheduler {
    let settlement = LeagueServiceImpl::new(
        repos.leagues.clone(),
        clock.clone(),
        runtime.league_promotion_percent,
    );
    Scheduler::new(clock, Arc::new(TokioSleeper))
        .with_job(Arc::new(HeartRefillJob::new(
            repos.maintenance.clone(),
            runtime.rules.max_hearts,
        )))
        .with_job(Arc::new(StreakJob::new(
            repos.maintenance.clone(),
            repos.events.clone(),
            awarder,
        )))
        .with_job(Arc::new(LeagueSettlementJob::new(settlement)))
        .with_job(Arc::new(BoosterSweepJob::new(repos.maintenance.clone())))
        .with_job(Arc::new(FlashQuestSweepJob::new(repos.maintenance.clone())))
}

/// Assemble every service against the configured pool.
pub(super) fn build_components(config: &ServerConfig) -> Components {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let pool = &config.db_pool;
    let runtime = &config.runtime;
    let repos = Repositories::new(pool);

    let awarder = BadgeAwarder::new(
        Arc::new(DieselBadgeRepository::new(pool.clone())),
        repos.events.clone(),
        clock.clone(),
        runtime.rules.level_size,
    );
    let registry = Arc::new(WsRegistry::new(clock.clone()));
    let relay: Arc<dyn NotificationRelay> = registry.clone();

    let http_state = build_http_state(pool, &repos, runtime, relay, &awarder, &clock);
    let scheduler = build_scheduler(&repos, runtime, awarder, clock);
    let ws_state = WsState::new(registry, parse_frontend_origin(&runtime.frontend_origin));

    Components {
        http_state: web::Data::new(http_state),
        ws_state: web::Data::new(ws_state),
        scheduler,
    }
}
