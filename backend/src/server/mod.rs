//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::{Components, build_components};

use actix_cors::Cors;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, web};
use tokio::task::JoinHandle;
use tracing::info;
use url::Url;

use podium::Trace;
#[cfg(debug_assertions)]
use podium::doc::ApiDoc;
use podium::domain::TRACE_ID_HEADER;
use podium::inbound::http::configure_api;
use podium::inbound::http::error::{json_config, path_config, query_config};
use podium::inbound::http::health::{HealthState, live, ready};
use podium::inbound::http::state::HttpState;
use podium::inbound::ws;
use podium::inbound::ws::state::WsState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
}

/// Browser access is limited to the configured frontend origin.
fn cors(frontend_origin: Option<&Url>) -> Cors {
    let cors = Cors::default()
        .allowed_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([TRACE_ID_HEADER])
        .max_age(3600);
    match frontend_origin {
        Some(origin) => cors.allowed_origin(&origin.origin().ascii_serialization()),
        None => cors,
    }
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
    } = deps;

    let cors = cors(ws_state.frontend_origin.as_ref());
    let api = web::scope("/api/v1").configure(configure_api);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .service(api)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.wrap(cors).wrap(Trace)
}

/// A bound server plus the scheduler loops started alongside it.
pub struct Running {
    pub server: Server,
    pub jobs: Vec<JoinHandle<()>>,
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `config`: validated runtime settings and the database pool.
///
/// # Returns
/// The bound [`Server`], which must be awaited to drive the listener, and the
/// scheduler handles when the scheduler is enabled.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Running> {
    let server_health_state = health_state.clone();
    let Components {
        http_state,
        ws_state,
        scheduler,
    } = build_components(&config);

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
        })
    })
    .bind(config.bind_addr())?
    .run();

    let jobs = if config.scheduler_enabled() {
        info!(jobs = ?scheduler.job_names(), "starting maintenance scheduler");
        scheduler.spawn()
    } else {
        info!("maintenance scheduler disabled");
        Vec::new()
    };

    health_state.mark_ready();
    Ok(Running { server, jobs })
}
