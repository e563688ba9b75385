//! [`MemoryStore`] — the in-memory implementation of both store traits.
//!
//! The injectable test double for the engine, also usable as-is for
//! single-process deployments that can afford to lose state on restart.
//!
//! All state lives behind one [`Mutex`]; a transition's read-compare-apply
//! runs inside a single critical section, which is what makes the
//! compare-and-swap race-free. No method awaits while the lock is held.

use std::{
  collections::{BTreeMap, HashMap},
  convert::Infallible,
  sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  booking::{Booking, BookingStatus},
  seat::{Seat, SeatState},
  show::Show,
  store::{
    BookingCreation, BookingLedger, BookingTransition, Provisioned, SeatStore,
    SeatTransition,
  },
};

#[derive(Default)]
struct Inner {
  shows:    HashMap<Uuid, Show>,
  /// Keyed by `(show_id, seat_id)`; the BTreeMap keeps a show's seats in
  /// seat-id order so `list_seats` needs no extra sort.
  seats:    BTreeMap<(Uuid, String), Seat>,
  bookings: HashMap<Uuid, Booking>,
}

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().expect("memory store mutex poisoned")
  }
}

impl Inner {
  fn seats_of(&self, show_id: Uuid) -> impl Iterator<Item = &Seat> {
    self
      .seats
      .range((show_id, String::new())..)
      .take_while(move |(key, _)| key.0 == show_id)
      .map(|(_, seat)| seat)
  }
}

// ─── SeatStore ───────────────────────────────────────────────────────────────

impl SeatStore for MemoryStore {
  type Error = Infallible;

  async fn provision_show(
    &self,
    show: Show,
    seats: Vec<Seat>,
  ) -> Result<Provisioned, Infallible> {
    let mut inner = self.lock();
    if inner.shows.contains_key(&show.show_id)
      || inner.seats_of(show.show_id).next().is_some()
    {
      return Ok(Provisioned::AlreadyExists);
    }
    for seat in seats {
      inner
        .seats
        .insert((seat.show_id, seat.seat_id.clone()), seat);
    }
    inner.shows.insert(show.show_id, show);
    Ok(Provisioned::Created)
  }

  async fn get_seat(
    &self,
    show_id: Uuid,
    seat_id: &str,
  ) -> Result<Option<Seat>, Infallible> {
    let inner = self.lock();
    Ok(inner.seats.get(&(show_id, seat_id.to_owned())).cloned())
  }

  async fn list_seats(&self, show_id: Uuid) -> Result<Vec<Seat>, Infallible> {
    let inner = self.lock();
    Ok(inner.seats_of(show_id).cloned().collect())
  }

  async fn transition_seat(
    &self,
    show_id: Uuid,
    seat_id: &str,
    expected: SeatState,
    next: SeatState,
  ) -> Result<SeatTransition, Infallible> {
    let mut inner = self.lock();
    let Some(seat) = inner.seats.get_mut(&(show_id, seat_id.to_owned())) else {
      return Ok(SeatTransition::NotFound);
    };
    if seat.state != expected {
      return Ok(SeatTransition::Conflict {
        actual: seat.state.status(),
      });
    }
    seat.state = next;
    Ok(SeatTransition::Applied(seat.clone()))
  }
}

// ─── BookingLedger ───────────────────────────────────────────────────────────

impl BookingLedger for MemoryStore {
  type Error = Infallible;

  async fn create_booking(
    &self,
    booking: Booking,
  ) -> Result<BookingCreation, Infallible> {
    let mut inner = self.lock();
    if inner.bookings.contains_key(&booking.booking_id) {
      return Ok(BookingCreation::IdCollision);
    }
    inner.bookings.insert(booking.booking_id, booking);
    Ok(BookingCreation::Created)
  }

  async fn get_booking(
    &self,
    booking_id: Uuid,
  ) -> Result<Option<Booking>, Infallible> {
    let inner = self.lock();
    Ok(inner.bookings.get(&booking_id).cloned())
  }

  async fn find_active_hold(
    &self,
    show_id: Uuid,
    seat_id: &str,
  ) -> Result<Option<Booking>, Infallible> {
    Ok(self.find_by_status(show_id, seat_id, BookingStatus::Held))
  }

  async fn find_confirmed(
    &self,
    show_id: Uuid,
    seat_id: &str,
  ) -> Result<Option<Booking>, Infallible> {
    Ok(self.find_by_status(show_id, seat_id, BookingStatus::Confirmed))
  }

  async fn confirm_booking(
    &self,
    booking_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<BookingTransition, Infallible> {
    Ok(self.transition_booking(booking_id, BookingStatus::Confirmed, Some(at)))
  }

  async fn cancel_booking(
    &self,
    booking_id: Uuid,
  ) -> Result<BookingTransition, Infallible> {
    Ok(self.transition_booking(booking_id, BookingStatus::Cancelled, None))
  }
}

impl MemoryStore {
  fn find_by_status(
    &self,
    show_id: Uuid,
    seat_id: &str,
    status: BookingStatus,
  ) -> Option<Booking> {
    let inner = self.lock();
    inner
      .bookings
      .values()
      .filter(|b| {
        b.show_id == show_id && b.seat_id == seat_id && b.status == status
      })
      .max_by_key(|b| b.created_at)
      .cloned()
  }

  /// Held → `to`; anything else is a conflict, so a terminal status is never
  /// overwritten.
  fn transition_booking(
    &self,
    booking_id: Uuid,
    to: BookingStatus,
    confirmed_at: Option<DateTime<Utc>>,
  ) -> BookingTransition {
    let mut inner = self.lock();
    let Some(booking) = inner.bookings.get_mut(&booking_id) else {
      return BookingTransition::NotFound;
    };
    if booking.status != BookingStatus::Held {
      return BookingTransition::Conflict {
        actual: booking.status,
      };
    }
    booking.status = to;
    if confirmed_at.is_some() {
      booking.confirmed_at = confirmed_at;
    }
    BookingTransition::Applied(booking.clone())
  }
}
