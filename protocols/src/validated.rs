// Validated JSON extractor for inbound gateway requests
//
// Malformed bodies and invalid fields are rejected here, before a handler
// (and therefore any backend collaborator) ever sees the request.

/// Trait for request types that need post-deserialization normalization
pub trait Normalizable {
    /// Apply defaults derived from other fields
    fn normalize(&mut self) {}
}

#[cfg(feature = "axum")]
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
#[cfg(feature = "axum")]
use serde::de::DeserializeOwned;
#[cfg(feature = "axum")]
use validator::Validate;

#[cfg(feature = "axum")]
use crate::error::{ErrorResponse, ErrorType, ERROR_CODE_HEADER};

/// A JSON extractor that decodes, normalizes and validates the request body.
///
/// The body is decoded regardless of the `Content-Type` header. A body that is
/// not valid JSON for `T` yields `400` with code `json_parse_error`; a body that
/// fails validation yields `400` with code `invalid_request`.
///
/// ```rust,ignore
/// async fn chat(ValidatedJson(request): ValidatedJson<ChatCompletionRequest>) -> Response {
///     // request.model is non-empty here
/// }
/// ```
#[cfg(feature = "axum")]
pub struct ValidatedJson<T>(pub T);

#[cfg(feature = "axum")]
fn rejection(message: String, code: &'static str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        [(ERROR_CODE_HEADER, code)],
        Json(ErrorResponse::new(
            ErrorType::InvalidRequestError,
            code,
            message,
        )),
    )
        .into_response()
}

#[cfg(feature = "axum")]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Normalizable + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Keeps axum's own status for oversized or unreadable bodies (413/400).
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let mut data: T = serde_json::from_slice(&body)
            .map_err(|err| rejection(format!("invalid JSON: {err}"), "json_parse_error"))?;

        data.normalize();

        data.validate()
            .map_err(|errors| rejection(errors.to_string(), "invalid_request"))?;

        Ok(ValidatedJson(data))
    }
}

#[cfg(feature = "axum")]
impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(feature = "axum")]
impl<T> std::ops::DerefMut for ValidatedJson<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
