//! Seat — one reservable unit of a show's fixed pool.
//!
//! The status-dependent fields live inside the [`SeatState`] variants, so a
//! seat can never carry hold fields while Available or Booked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status discriminant for a seat; used in error reporting and for matching
/// on a state without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
  Available,
  Held,
  Booked,
}

impl std::fmt::Display for SeatStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Available => "AVAILABLE",
      Self::Held => "HELD",
      Self::Booked => "BOOKED",
    })
  }
}

/// The per-seat state machine: Available → Held → {Booked, Available}.
/// Booked is terminal for the booking cycle; seats are never re-listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
  Available,
  #[serde(rename_all = "camelCase")]
  Held {
    /// Opaque token pairing this hold with its booking.
    hold_id:         Uuid,
    held_by:         String,
    hold_expires_at: DateTime<Utc>,
  },
  #[serde(rename_all = "camelCase")]
  Booked {
    booked_by: String,
    booked_at: DateTime<Utc>,
  },
}

impl SeatState {
  pub fn status(&self) -> SeatStatus {
    match self {
      Self::Available => SeatStatus::Available,
      Self::Held { .. } => SeatStatus::Held,
      Self::Booked { .. } => SeatStatus::Booked,
    }
  }
}

/// One seat of a show. Identity is `(show_id, seat_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
  pub show_id: Uuid,
  pub seat_id: String,
  #[serde(flatten)]
  pub state:   SeatState,
}

impl Seat {
  /// A fresh Available seat, as created at provisioning time.
  pub fn available(show_id: Uuid, seat_id: impl Into<String>) -> Self {
    Self {
      show_id,
      seat_id: seat_id.into(),
      state: SeatState::Available,
    }
  }
}

/// A seat as returned by list reads — annotated with the booking id of its
/// active hold or confirmed booking. Computed at read time, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
  #[serde(flatten)]
  pub seat:       Seat,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub booking_id: Option<Uuid>,
}
