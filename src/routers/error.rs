//! Error responses for route handlers.
//!
//! Handlers and the `ValidatedJson` extractor share one envelope, so a caller
//! sees the same `type`/`code` layout whether a request failed decoding or
//! failed downstream.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lmg_protocols::{ErrorResponse, ErrorType, ERROR_CODE_HEADER};

pub fn internal_error(code: &'static str, message: impl Into<String>) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, code, message)
}

pub fn bad_request(code: &'static str, message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, code, message)
}

/// `type` is derived from the status class: 4xx is the caller's fault, 5xx
/// is the gateway's or a collaborator's.
pub fn error_response(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    let body = ErrorResponse::new(ErrorType::for_status(status.as_u16()), code, message);
    (status, [(ERROR_CODE_HEADER, code)], Json(body)).into_response()
}
