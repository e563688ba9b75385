//! Error taxonomy for the reservation engine.
//!
//! Business failures are enumerated; infrastructure failures from a storage
//! backend travel in [`Error::Storage`], kept distinct so callers can map
//! them separately.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{booking::BookingStatus, seat::SeatStatus};

#[derive(Debug, Error)]
pub enum Error {
  #[error("seat {seat_id} not found in show {show_id}")]
  SeatNotFound { show_id: Uuid, seat_id: String },

  #[error("booking not found: {0}")]
  BookingNotFound(Uuid),

  #[error("show {0} is already provisioned")]
  AlreadyProvisioned(Uuid),

  #[error("seat {seat_id} is {actual}, expected {expected}")]
  InvalidSeatState {
    show_id:  Uuid,
    seat_id:  String,
    expected: SeatStatus,
    actual:   SeatStatus,
  },

  #[error("booking {booking_id} is {actual}, expected {expected}")]
  InvalidBookingState {
    booking_id: Uuid,
    expected:   BookingStatus,
    actual:     BookingStatus,
  },

  #[error("hold for booking {booking_id} expired at {expired_at}")]
  HoldExpired {
    booking_id: Uuid,
    expired_at: DateTime<Utc>,
  },

  /// Lost a concurrent compare-and-swap race; the caller may retry.
  #[error("concurrent update on seat {seat_id} in show {show_id}")]
  Conflict { show_id: Uuid, seat_id: String },

  /// A freshly generated booking id was already taken. Practically
  /// unreachable with v4 ids.
  #[error("booking id collision: {0}")]
  BookingIdCollision(Uuid),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure as an infrastructure error.
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
