//! WebSocket inbound adapter relaying live notifications to viewers.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list)
//! - hand each upgraded connection to the session loop
//! - fan broadcast notifications out through [`state::WsRegistry`]

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use tracing::{error, warn};
use url::Url;

mod session;

pub mod messages;
pub mod state;

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(origin_header, state.frontend_origin.as_ref())?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    actix_web::rt::spawn(session::handle_ws_session(
        state.registry.clone(),
        session,
        msg_stream,
    ));
    Ok(response)
}

fn validate_origin(
    origin_header: &HeaderValue,
    frontend_origin: Option<&Url>,
) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin, frontend_origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

const LOCALHOST: &str = "localhost";

/// Returns true when a parsed Origin is the configured frontend or a local
/// development server.
///
/// The frontend matches on scheme, host and port. Local development accepts
/// plain HTTP from localhost with a non-zero explicit port.
fn is_allowed_origin(origin: &Url, frontend_origin: Option<&Url>) -> bool {
    let Some(host) = origin.host_str() else {
        return false;
    };

    if let Some(frontend) = frontend_origin {
        if origin.origin() == frontend.origin() {
            return true;
        }
    }

    origin.scheme() == "http"
        && host == LOCALHOST
        && matches!(origin.port(), Some(port) if port != 0)
}
