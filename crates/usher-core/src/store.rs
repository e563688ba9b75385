//! The `SeatStore` and `BookingLedger` traits and their outcome types.
//!
//! Implemented by storage backends ([`MemoryStore`](crate::memory::MemoryStore),
//! `usher-store-sqlite`). The engine depends on these abstractions, not on
//! any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  booking::{Booking, BookingStatus},
  seat::{Seat, SeatState, SeatStatus},
  show::Show,
};

// ─── Outcome types ───────────────────────────────────────────────────────────

/// Result of [`SeatStore::provision_show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
  Created,
  /// The show already has seats; nothing was written.
  AlreadyExists,
}

/// Result of the seat compare-and-swap. `Conflict` carries the status that
/// was actually observed, so callers can report what they lost to.
#[derive(Debug, Clone)]
pub enum SeatTransition {
  Applied(Seat),
  Conflict { actual: SeatStatus },
  NotFound,
}

/// Result of [`BookingLedger::create_booking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingCreation {
  Created,
  IdCollision,
}

/// Result of a ledger compare-and-swap transition.
#[derive(Debug, Clone)]
pub enum BookingTransition {
  Applied(Booking),
  Conflict { actual: BookingStatus },
  NotFound,
}

// ─── Seat store ──────────────────────────────────────────────────────────────

/// Per-seat state keyed by `(show_id, seat_id)`.
///
/// [`transition_seat`](SeatStore::transition_seat) is the sole mutation
/// entry point. Implementations must serialize transitions per seat key —
/// the read-compare-apply must never interleave with another transition on
/// the same key. That is what makes the Available → Held check-and-set in
/// `hold` race-free.
pub trait SeatStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Record a show and its full seat pool in one atomic step. Reports
  /// [`Provisioned::AlreadyExists`], writing nothing, when the show already
  /// has seats.
  fn provision_show(
    &self,
    show: Show,
    seats: Vec<Seat>,
  ) -> impl Future<Output = Result<Provisioned, Self::Error>> + Send + '_;

  /// Retrieve one seat. Returns `None` if not found.
  fn get_seat<'a>(
    &'a self,
    show_id: Uuid,
    seat_id: &'a str,
  ) -> impl Future<Output = Result<Option<Seat>, Self::Error>> + Send + 'a;

  /// All seats of a show, ordered by seat id.
  fn list_seats(
    &self,
    show_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Seat>, Self::Error>> + Send + '_;

  /// Atomically replace the seat's state with `next` iff its current state
  /// equals `expected`.
  ///
  /// Comparing the full state (not just the status discriminant) means a
  /// sweep can never release a hold it did not observe: a seat that was
  /// re-held in between carries a different hold id and the swap reports
  /// [`SeatTransition::Conflict`].
  fn transition_seat<'a>(
    &'a self,
    show_id: Uuid,
    seat_id: &'a str,
    expected: SeatState,
    next: SeatState,
  ) -> impl Future<Output = Result<SeatTransition, Self::Error>> + Send + 'a;
}

// ─── Booking ledger ──────────────────────────────────────────────────────────

/// Booking records keyed by booking id, with secondary lookup by
/// `(show_id, seat_id, status)`.
///
/// The ledger is append-and-transition only: no operation deletes a record,
/// and the two mutations are the monotone transitions the state machine
/// permits, each a compare-and-swap so a terminal status is never
/// overwritten.
pub trait BookingLedger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append a new booking. Reports [`BookingCreation::IdCollision`] when the
  /// booking id is already taken.
  fn create_booking(
    &self,
    booking: Booking,
  ) -> impl Future<Output = Result<BookingCreation, Self::Error>> + Send + '_;

  /// Retrieve one booking. Returns `None` if not found.
  fn get_booking(
    &self,
    booking_id: Uuid,
  ) -> impl Future<Output = Result<Option<Booking>, Self::Error>> + Send + '_;

  /// The booking currently holding `(show_id, seat_id)`, if any.
  fn find_active_hold<'a>(
    &'a self,
    show_id: Uuid,
    seat_id: &'a str,
  ) -> impl Future<Output = Result<Option<Booking>, Self::Error>> + Send + 'a;

  /// The confirmed booking for `(show_id, seat_id)`, if any.
  fn find_confirmed<'a>(
    &'a self,
    show_id: Uuid,
    seat_id: &'a str,
  ) -> impl Future<Output = Result<Option<Booking>, Self::Error>> + Send + 'a;

  /// Compare-and-swap Held → Confirmed, stamping `confirmed_at = at`.
  fn confirm_booking(
    &self,
    booking_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<BookingTransition, Self::Error>> + Send + '_;

  /// Compare-and-swap Held → Cancelled.
  fn cancel_booking(
    &self,
    booking_id: Uuid,
  ) -> impl Future<Output = Result<BookingTransition, Self::Error>> + Send + '_;
}
