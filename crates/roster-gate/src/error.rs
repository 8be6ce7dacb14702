//! Gate error type and axum `IntoResponse` implementation.
//!
//! Unauthenticated, denied and unavailable stay distinguishable on the wire:
//! 401, 403 and 503 respectively. Only the last one asks the client to retry.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use roster_core::DenyReason;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error("access denied: {0}")]
  Forbidden(DenyReason),

  #[error("directory unavailable: {0}")]
  Unavailable(String),

  #[error("authorization timed out")]
  Cancelled,
}

impl From<roster_core::Error> for GateError {
  fn from(err: roster_core::Error) -> Self {
    match err {
      roster_core::Error::InvalidRequest(m) => Self::InvalidRequest(m),
      roster_core::Error::Unauthenticated(m) => Self::Unauthenticated(m),
      roster_core::Error::DirectoryUnavailable(e) => {
        tracing::error!(error = %e, "directory unavailable during authorization");
        Self::Unavailable(e.to_string())
      }
      roster_core::Error::Cancelled => Self::Cancelled,
    }
  }
}

impl IntoResponse for GateError {
  fn into_response(self) -> Response {
    match self {
      GateError::InvalidRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      GateError::Unauthenticated(m) => {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": m }))).into_response()
      }
      GateError::Forbidden(reason) => (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "forbidden", "reason": reason })),
      )
        .into_response(),
      GateError::Unavailable(_) => {
        // The cause is logged, not leaked.
        let mut res = (
          StatusCode::SERVICE_UNAVAILABLE,
          Json(json!({ "error": "directory unavailable, try again" })),
        )
          .into_response();
        res
          .headers_mut()
          .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        res
      }
      GateError::Cancelled => (
        StatusCode::GATEWAY_TIMEOUT,
        Json(json!({ "error": "authorization timed out, try again" })),
      )
        .into_response(),
    }
  }
}
