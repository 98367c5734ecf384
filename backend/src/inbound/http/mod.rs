//! HTTP inbound adapter exposing the REST API under `/api/v1`.

pub mod accounts;
pub mod auth;
pub mod envelope;
pub mod error;
pub mod health;
pub mod leagues;
pub mod learning;
pub mod missions;
pub mod progress;
pub mod schemas;
pub mod social;
pub mod state;
pub mod store;
pub mod teams;
#[cfg(test)]
pub mod test_utils;
pub mod webhooks;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::register)
        .service(accounts::login)
        .service(accounts::current_user)
        .service(accounts::update_accessibility)
        .service(social::follow_stats)
        .service(social::is_following)
        .service(social::follow)
        .service(social::unfollow)
        .service(teams::list_teams)
        .service(teams::create_team)
        .service(teams::join_team)
        .service(teams::get_team)
        .service(teams::update_member_roles)
        .service(learning::get_path)
        .service(learning::get_unit)
        .service(learning::start_lesson)
        .service(learning::submit_lesson)
        .service(progress::get_progress)
        .service(progress::restore_heart)
        .service(missions::list_missions)
        .service(missions::team_submissions)
        .service(missions::submit_mission)
        .service(missions::verify_submission)
        .service(webhooks::ci_webhook)
        .service(store::list_items)
        .service(store::purchase_item)
        .service(leagues::list_leagues)
        .service(leagues::settle_week)
        .service(leagues::individual_leaderboard)
        .service(leagues::team_leaderboard);
}
