//! OpenAPI-only schema for the error envelope.

use utoipa::ToSchema;

use super::envelope::EnvelopeStatus;
use crate::domain::ErrorCode;

/// Body of every failed request.
#[derive(ToSchema)]
#[schema(as = ErrorEnvelope, rename_all = "camelCase")]
#[expect(dead_code, reason = "used only for OpenAPI schema generation")]
pub struct ErrorEnvelopeSchema {
    /// Always `error`.
    status: EnvelopeStatus,
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    #[schema(example = "origin address must not be empty")]
    message: String,
    /// Correlates the failure with server logs; mirrors the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-level context, typically `{"field": …, "code": …}`.
    details: Option<serde_json::Value>,
}
