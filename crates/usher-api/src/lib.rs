//! JSON REST API for the usher reservation engine.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`SeatStore`] + [`BookingLedger`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.

pub mod error;
pub mod seats;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use usher_core::{
  clock::Clock,
  engine::ReservationEngine,
  store::{BookingLedger, SeatStore},
};

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` plus
/// `USHER_`-prefixed environment overrides. Every field has a default so the
/// server runs out of the box.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "defaults::host")]
  pub host:               String,
  #[serde(default = "defaults::port")]
  pub port:               u16,
  #[serde(default = "defaults::store_path")]
  pub store_path:         PathBuf,
  /// The hold window, in seconds. A business knob, not a constant.
  #[serde(default = "defaults::hold_duration_secs")]
  pub hold_duration_secs: u64,
  /// Pool size used when a provision request does not specify one.
  #[serde(default = "defaults::seat_count")]
  pub seat_count:         u32,
}

mod defaults {
  use std::path::PathBuf;

  pub fn host() -> String {
    "127.0.0.1".to_string()
  }
  pub fn port() -> u16 {
    5000
  }
  pub fn store_path() -> PathBuf {
    PathBuf::from("usher.db")
  }
  pub fn hold_duration_secs() -> u64 {
    300
  }
  pub fn seat_count() -> u32 {
    30
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C> {
  pub engine:             Arc<ReservationEngine<S, C>>,
  pub default_seat_count: u32,
}

// Manual impl: `S` itself need not be `Clone` behind the `Arc`.
impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      engine:             self.engine.clone(),
      default_seat_count: self.default_seat_count,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the reservation API.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: SeatStore + BookingLedger + 'static,
  C: Clock + 'static,
{
  Router::new()
    .route("/api/seats/provision", post(seats::provision::<S, C>))
    .route("/api/seats", get(seats::list::<S, C>))
    .route("/api/seats/snapshot", get(seats::snapshot::<S, C>))
    .route("/api/seats/hold", post(seats::hold::<S, C>))
    .route("/api/seats/confirm", post(seats::confirm::<S, C>))
    .route("/api/seats/cancel", post(seats::cancel::<S, C>))
    .route("/api/health", get(health))
    .with_state(state)
}

/// `GET /api/health`
async fn health() -> Json<serde_json::Value> {
  Json(json!({ "status": "OK", "message": "usher API is running" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────
