//! Booking — the durable record paired with a seat hold.
//!
//! Bookings are never deleted. Cancelled and confirmed records remain as an
//! audit trail, hold fields included.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle status. Transitions are monotone:
/// Held → {Confirmed, Cancelled}; both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
  Held,
  Confirmed,
  Cancelled,
}

impl std::fmt::Display for BookingStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Held => "HELD",
      Self::Confirmed => "CONFIRMED",
      Self::Cancelled => "CANCELLED",
    })
  }
}

/// A booking references its seat by value — a weak reference, not an
/// ownership relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
  pub booking_id:      Uuid,
  pub show_id:         Uuid,
  pub seat_id:         String,
  /// Holder's display name.
  pub name:            String,
  pub status:          BookingStatus,
  /// Equals the seat's hold id while both sides are Held; co-issued at hold
  /// time.
  pub hold_id:         Uuid,
  pub hold_expires_at: DateTime<Utc>,
  pub created_at:      DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub confirmed_at:    Option<DateTime<Utc>>,
}
