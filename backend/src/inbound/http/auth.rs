//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers that need a caller take an [`AuthenticatedUser`] argument; the
//! extractor reads `Authorization: Bearer <token>` and resolves the token
//! through [`crate::domain::ports::AccountService::authenticate`], which loads
//! the full user record.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, User};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Caller resolved from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    /// The resolved user.
    pub fn user(&self) -> &User {
        &self.0
    }
}

/// Pull the raw token out of the `Authorization` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<String, Error> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("Authentication required"))?
        .to_str()
        .map_err(|_| Error::unauthorized("Invalid authorization header"))?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("Invalid authorization header"))?;
    Ok(token.to_owned())
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req.headers());
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token?;
            state.accounts.authenticate(&token).await.map(Self)
        })
    }
}
