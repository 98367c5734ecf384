//! Success envelope shared by every JSON endpoint.
//!
//! Successful responses serialise as `{ "success": true, "data": ... }`;
//! failures go through [`crate::domain::Error`]'s `ResponseError` impl.

use actix_web::HttpResponse;
use serde::Serialize;

/// Wire shape of a successful request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap `data` as a success.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `200 OK` with `data` in the envelope.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::success(data))
}

/// `201 Created` with `data` in the envelope.
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(Envelope::success(data))
}
