//! OpenAPI schema definitions for the response envelopes.
//!
//! Domain payloads derive `ToSchema` themselves; the envelopes wrapping them
//! are serialised ad hoc by the adapter, so their documented shape lives here.

use utoipa::ToSchema;

use crate::domain::ErrorCode;

/// OpenAPI schema for the failure envelope.
#[derive(ToSchema)]
#[schema(as = ErrorEnvelope, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorEnvelopeSchema {
    /// Always `false`.
    #[schema(example = false)]
    success: bool,
    /// Human-readable message; internal failures read "Internal server error".
    #[schema(example = "Not enough hearts")]
    error: String,
    /// Stable machine-readable error code.
    code: ErrorCode,
    /// Supplementary error details.
    details: Option<serde_json::Value>,
    /// Correlation identifier, also sent in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
}

/// OpenAPI schema for the success envelope.
#[derive(ToSchema)]
#[schema(as = SuccessEnvelope)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct SuccessEnvelopeSchema {
    /// Always `true`.
    #[schema(example = true)]
    success: bool,
    /// Endpoint-specific payload.
    data: serde_json::Value,
}
