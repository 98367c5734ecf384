//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every `/api/v1` handler plus the health probes
//! - **Schemas**: the response envelopes; domain payloads are collected from
//!   the handler annotations
//! - **Security**: bearer token authentication scheme
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::schemas::{ErrorEnvelopeSchema, SuccessEnvelopeSchema};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Token issued by POST /api/v1/auth/register or /api/v1/auth/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Podium NIRD API",
        description = "Gamified learning, team missions and leagues for digital responsibility.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::accounts::update_accessibility,
        crate::inbound::http::social::follow_stats,
        crate::inbound::http::social::is_following,
        crate::inbound::http::social::follow,
        crate::inbound::http::social::unfollow,
        crate::inbound::http::teams::list_teams,
        crate::inbound::http::teams::create_team,
        crate::inbound::http::teams::join_team,
        crate::inbound::http::teams::get_team,
        crate::inbound::http::teams::update_member_roles,
        crate::inbound::http::learning::get_path,
        crate::inbound::http::learning::get_unit,
        crate::inbound::http::learning::start_lesson,
        crate::inbound::http::learning::submit_lesson,
        crate::inbound::http::progress::get_progress,
        crate::inbound::http::progress::restore_heart,
        crate::inbound::http::missions::list_missions,
        crate::inbound::http::missions::team_submissions,
        crate::inbound::http::missions::submit_mission,
        crate::inbound::http::missions::verify_submission,
        crate::inbound::http::webhooks::ci_webhook,
        crate::inbound::http::store::list_items,
        crate::inbound::http::store::purchase_item,
        crate::inbound::http::leagues::list_leagues,
        crate::inbound::http::leagues::settle_week,
        crate::inbound::http::leagues::individual_leaderboard,
        crate::inbound::http::leagues::team_leaderboard,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorEnvelopeSchema, SuccessEnvelopeSchema)),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "The signed-in player"),
        (name = "social", description = "Follow graph"),
        (name = "teams", description = "Teams, invite codes and roles"),
        (name = "path", description = "Learning path, units and lessons"),
        (name = "progress", description = "Per-domain progress and hearts"),
        (name = "missions", description = "Team missions and verification"),
        (name = "webhooks", description = "CI callbacks"),
        (name = "store", description = "Gem store and boosters"),
        (name = "leagues", description = "Weekly leagues"),
        (name = "leaderboard", description = "Rankings"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
