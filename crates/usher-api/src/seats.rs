//! Handlers for the `/api/seats` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/seats/provision` | Body: `{"showId"?, "name"?, "seatCount"?}` |
//! | `GET`  | `/api/seats` | `?showId=` required; sweeps expired holds |
//! | `GET`  | `/api/seats/snapshot` | `?showId=&seatId=`; 404 if seat unknown |
//! | `POST` | `/api/seats/hold` | Body: `{"showId", "seatId", "name"}` |
//! | `POST` | `/api/seats/confirm` | Body: `{"bookingId"}` |
//! | `POST` | `/api/seats/cancel` | Body: `{"showId", "seatId"}` |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use usher_core::{
  booking::{Booking, BookingStatus},
  clock::Clock,
  seat::{Seat, SeatView},
  store::{BookingLedger, SeatStore},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Provision ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionBody {
  /// Generated server-side when omitted, so repeated seeding always lands on
  /// a fresh show.
  pub show_id:    Option<Uuid>,
  pub name:       Option<String>,
  pub seat_count: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
  pub show_id: Uuid,
  pub message: String,
}

/// `POST /api/seats/provision`
pub async fn provision<S, C>(
  State(state): State<AppState<S, C>>,
  Json(body): Json<ProvisionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SeatStore + BookingLedger + 'static,
  C: Clock + 'static,
{
  let show_id = body.show_id.unwrap_or_else(Uuid::new_v4);
  let seat_count = body.seat_count.unwrap_or(state.default_seat_count);

  let seats = state.engine.provision(show_id, body.name, seat_count).await?;

  Ok((
    StatusCode::CREATED,
    Json(ProvisionResponse {
      show_id,
      message: format!("show and {} seats created", seats.len()),
    }),
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub show_id: Uuid,
}

/// `GET /api/seats?showId=<id>`
pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SeatView>>, ApiError>
where
  S: SeatStore + BookingLedger + 'static,
  C: Clock + 'static,
{
  let views = state.engine.list_seats(params.show_id).await?;
  Ok(Json(views))
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotParams {
  pub show_id: Uuid,
  pub seat_id: String,
}

/// `GET /api/seats/snapshot?showId=<id>&seatId=<id>`
pub async fn snapshot<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<SnapshotParams>,
) -> Result<Json<Seat>, ApiError>
where
  S: SeatStore + BookingLedger + 'static,
  C: Clock + 'static,
{
  let seat = state
    .engine
    .snapshot(params.show_id, &params.seat_id)
    .await?;
  Ok(Json(seat))
}

// ─── Hold ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldBody {
  pub show_id: Uuid,
  pub seat_id: String,
  pub name:    String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldResponse {
  pub booking_id:      Uuid,
  pub hold_id:         Uuid,
  pub hold_expires_at: DateTime<Utc>,
  pub status:          BookingStatus,
  pub held_by:         String,
}

impl From<Booking> for HoldResponse {
  fn from(b: Booking) -> Self {
    Self {
      booking_id:      b.booking_id,
      hold_id:         b.hold_id,
      hold_expires_at: b.hold_expires_at,
      status:          b.status,
      held_by:         b.name,
    }
  }
}

/// `POST /api/seats/hold`
pub async fn hold<S, C>(
  State(state): State<AppState<S, C>>,
  Json(body): Json<HoldBody>,
) -> Result<Json<HoldResponse>, ApiError>
where
  S: SeatStore + BookingLedger + 'static,
  C: Clock + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name is required".into()));
  }
  if body.seat_id.trim().is_empty() {
    return Err(ApiError::BadRequest("seatId is required".into()));
  }

  let booking = state
    .engine
    .hold(body.show_id, &body.seat_id, &body.name)
    .await?;
  Ok(Json(HoldResponse::from(booking)))
}

// ─── Confirm ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBody {
  pub booking_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
  pub message:    String,
  pub booking_id: Uuid,
}

/// `POST /api/seats/confirm`
pub async fn confirm<S, C>(
  State(state): State<AppState<S, C>>,
  Json(body): Json<ConfirmBody>,
) -> Result<Json<ConfirmResponse>, ApiError>
where
  S: SeatStore + BookingLedger + 'static,
  C: Clock + 'static,
{
  let booking = state.engine.confirm(body.booking_id).await?;
  Ok(Json(ConfirmResponse {
    message:    "booking confirmed".into(),
    booking_id: booking.booking_id,
  }))
}

// ─── Cancel ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
  pub show_id: Uuid,
  pub seat_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
  pub message: String,
}

/// `POST /api/seats/cancel`
pub async fn cancel<S, C>(
  State(state): State<AppState<S, C>>,
  Json(body): Json<CancelBody>,
) -> Result<Json<CancelResponse>, ApiError>
where
  S: SeatStore + BookingLedger + 'static,
  C: Clock + 'static,
{
  state.engine.cancel(body.show_id, &body.seat_id).await?;
  Ok(Json(CancelResponse {
    message: "hold cancelled".into(),
  }))
}
