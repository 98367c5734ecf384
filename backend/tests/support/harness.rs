//! Server harness and shared world for the live relay suites.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. The `WorldFixture` stops the server
//! even if a scenario panics.

use std::cell::RefCell;
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use actix_codec::Framed;
use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, http::header, web};
use awc::{BoxedSocket, ws::Codec, ws::Frame};
use futures_util::StreamExt;
use mockable::{Clock, DefaultClock};
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

use crate::doubles::{
    ADA_TOKEN, GRACE_TOKEN, InMemoryMissions, InMemoryTeams, KAT_TOKEN, LIN_TOKEN, NoBadges,
    TokenAccounts, Unavailable, player, team_player,
};
use podium::Trace;
use podium::domain::{BadgeAwarder, MissionServiceImpl, Role, TRACE_ID_HEADER, TeamServiceImpl};
use podium::domain::ports::NotificationRelay;
use podium::inbound::http::configure_api;
use podium::inbound::http::error::{json_config, path_config, query_config};
use podium::inbound::http::state::{HttpState, HttpStatePorts, WebhookSecret};
use podium::inbound::http::webhooks::WEBHOOK_SECRET_HEADER;
use podium::inbound::ws;
use podium::inbound::ws::state::{WsRegistry, WsState};

pub(crate) type Socket = Framed<BoxedSocket, Codec>;

/// Shared secret the CI webhook accepts in these suites.
pub(crate) const WEBHOOK_SECRET: &str = "relay-suite-secret";

pub(crate) struct RelayWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    pub(crate) registry: Arc<WsRegistry>,
    pub(crate) teams: Arc<InMemoryTeams>,
    pub(crate) missions: Arc<InMemoryMissions>,
    pub(crate) viewer: Option<Socket>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_body: Option<Value>,
    pub(crate) last_trace_id: Option<String>,
    pub(crate) sent_message: Option<Value>,
}

pub(crate) type SharedWorld = Rc<RefCell<RelayWorld>>;

pub(crate) struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for WorldFixture {
    fn drop(&mut self) {
        let ctx = self.world.borrow();
        let server = ctx.server.clone();
        ctx.local.block_on(&ctx.runtime, async move {
            server.stop(true).await;
        });
    }
}

/// Drive `operation` on the world's runtime. The future must not borrow the world.
pub(crate) fn with_world_async<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

/// Run `operation` with the viewer socket checked out of the world.
pub(crate) fn with_viewer<R, F>(world: &SharedWorld, operation: impl FnOnce(Socket) -> F) -> R
where
    F: std::future::Future<Output = (Socket, R)>,
{
    let socket = world.borrow_mut().viewer.take().expect("viewer connected");
    let (socket, result) = with_world_async(world, |_| operation(socket));
    world.borrow_mut().viewer = Some(socket);
    result
}

/// Next text frame as JSON, skipping heartbeats.
pub(crate) async fn next_json(socket: &mut Socket) -> Value {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let frame = socket.next().await.expect("viewer frame").expect("frame");
            match frame {
                Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json frame"),
                Frame::Ping(_) | Frame::Pong(_) => continue,
                other => panic!("expected text frame, got {other:?}"),
            }
        }
    })
    .await
    .expect("viewer frame within timeout")
}

/// One JSON POST issued by a scenario step.
pub(crate) struct JsonPost {
    pub(crate) path: String,
    pub(crate) token: Option<&'static str>,
    pub(crate) webhook_secret: Option<&'static str>,
    pub(crate) payload: Value,
}

impl JsonPost {
    pub(crate) fn new(path: impl Into<String>, payload: Value) -> Self {
        Self {
            path: path.into(),
            token: None,
            webhook_secret: None,
            payload,
        }
    }

    pub(crate) fn bearer(mut self, token: &'static str) -> Self {
        self.token = Some(token);
        self
    }

    pub(crate) fn webhook_secret(mut self, secret: &'static str) -> Self {
        self.webhook_secret = Some(secret);
        self
    }
}

/// Send `post` and record status, trace id and body on the world.
pub(crate) fn post_json(world: &SharedWorld, post: JsonPost) {
    let JsonPost {
        path,
        token,
        webhook_secret,
        payload,
    } = post;
    let (status, trace_id, body) = with_world_async(world, |base_url| async move {
        let mut request = awc::Client::default().post(format!("{base_url}{path}"));
        if let Some(token) = token {
            request = request.insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
        }
        if let Some(secret) = webhook_secret {
            request = request.insert_header((WEBHOOK_SECRET_HEADER, secret));
        }
        let mut response = request.send_json(&payload).await.expect("request sent");
        let status = response.status().as_u16();
        let trace_id = response
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let bytes = response.body().await.expect("response body");
        let body: Value = serde_json::from_slice(&bytes).expect("json body");
        (status, trace_id, body)
    });

    let mut ctx = world.borrow_mut();
    ctx.last_status = Some(status);
    ctx.last_trace_id = trace_id;
    ctx.last_body = Some(body);
}

/// Next JSON frame delivered to the viewer.
pub(crate) fn viewer_receives(world: &SharedWorld) -> Value {
    with_viewer(world, |mut socket| async move {
        let frame = next_json(&mut socket).await;
        (socket, frame)
    })
}

fn http_state(
    teams: Arc<InMemoryTeams>,
    missions: Arc<InMemoryMissions>,
    relay: Arc<dyn NotificationRelay>,
) -> HttpState {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let unavailable = Arc::new(Unavailable);
    let accounts = TokenAccounts::new([
        (ADA_TOKEN, player("ada_l", "Ada Lovelace")),
        (GRACE_TOKEN, player("grace_h", "Grace Hopper")),
        (LIN_TOKEN, team_player("lin_t", "Lin Torvalds", &[Role::Developer])),
        (KAT_TOKEN, team_player("kat_j", "Katherine Johnson", &[Role::Verifier])),
    ]);
    let no_badges = Arc::new(NoBadges);
    let awarder = BadgeAwarder::new(no_badges.clone(), no_badges, clock.clone(), 100);
    HttpState::new(
        HttpStatePorts {
            accounts: Arc::new(accounts),
            social: unavailable.clone(),
            teams: Arc::new(TeamServiceImpl::new(teams, relay.clone(), clock.clone())),
            learning: unavailable.clone(),
            progress: unavailable.clone(),
            missions: Arc::new(MissionServiceImpl::new(missions, relay, awarder, clock)),
            store: unavailable.clone(),
            leagues: unavailable.clone(),
            leaderboard: unavailable,
        },
        WebhookSecret::new(WEBHOOK_SECRET),
    )
}

async fn spawn_server(
    http_state: HttpState,
    ws_state: WsState,
) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;

    let http_data = web::Data::new(http_state);
    let ws_data = web::Data::new(ws_state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(http_data.clone())
            .app_data(ws_data.clone())
            .app_data(json_config())
            .app_data(path_config())
            .app_data(query_config())
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api))
            .service(ws::ws_entry)
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}"), handle))
}

async fn connect_viewer(base_url: &str, registry: &WsRegistry) -> Socket {
    let (_response, socket) = awc::Client::default()
        .ws(format!("{base_url}/ws"))
        .set_header(header::ORIGIN, "http://localhost:5173")
        .connect()
        .await
        .expect("viewer connects");
    for _ in 0..100 {
        if !registry.is_empty().await {
            return socket;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("viewer never registered");
}

pub(crate) fn world() -> WorldFixture {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();

    let registry = Arc::new(WsRegistry::new(Arc::new(DefaultClock)));
    let teams = Arc::new(InMemoryTeams::default());
    let missions = Arc::new(InMemoryMissions::seeded());
    let relay: Arc<dyn NotificationRelay> = registry.clone();
    let ws_state = WsState::new(registry.clone(), None);

    let (base_url, server, viewer) = local.block_on(&runtime, {
        let http = http_state(teams.clone(), missions.clone(), relay);
        let registry = registry.clone();
        async move {
            let (base_url, server) = spawn_server(http, ws_state).await.expect("server starts");
            let viewer = connect_viewer(&base_url, &registry).await;
            (base_url, server, viewer)
        }
    });

    WorldFixture {
        world: Rc::new(RefCell::new(RelayWorld {
            runtime,
            local,
            base_url,
            server,
            registry,
            teams,
            missions,
            viewer: Some(viewer),
            last_status: None,
            last_body: None,
            last_trace_id: None,
            sent_message: None,
        })),
    }
}
