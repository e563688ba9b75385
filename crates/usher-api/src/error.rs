//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every engine failure kind maps to a stable caller-visible code and an
//! HTTP status; the JSON body is `{"error": <message>, "code": <kind>}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use usher_core::Error as EngineError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Engine(#[from] EngineError),
}

impl ApiError {
  fn status_and_code(&self) -> (StatusCode, &'static str) {
    match self {
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
      ApiError::Engine(e) => match e {
        EngineError::SeatNotFound { .. } | EngineError::BookingNotFound(_) => {
          (StatusCode::NOT_FOUND, "NOT_FOUND")
        }
        EngineError::InvalidSeatState { .. }
        | EngineError::InvalidBookingState { .. } => {
          (StatusCode::BAD_REQUEST, "INVALID_STATE")
        }
        EngineError::HoldExpired { .. } => (StatusCode::BAD_REQUEST, "EXPIRED"),
        EngineError::AlreadyProvisioned(_) => {
          (StatusCode::CONFLICT, "ALREADY_EXISTS")
        }
        EngineError::Conflict { .. } | EngineError::BookingIdCollision(_) => {
          (StatusCode::CONFLICT, "CONFLICT")
        }
        EngineError::Storage(_) => {
          (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE")
        }
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = self.status_and_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed on storage");
    }
    (status, Json(json!({ "error": self.to_string(), "code": code })))
      .into_response()
  }
}
