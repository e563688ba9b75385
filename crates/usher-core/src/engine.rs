//! The reservation engine — the seat/booking state machine over a store.
//!
//! Every operation is a compare-and-swap transition in the [`SeatStore`]
//! plus, where a booking is involved, a monotone transition in the
//! [`BookingLedger`]. Paired writes go seat first, booking second, with a
//! compensating seat rollback if the booking write fails — no reader may
//! observe a Held seat with no booking, or a Confirmed booking whose seat is
//! not Booked.
//!
//! Expiry is lazy: any read or write that touches a seat whose hold window
//! has passed sweeps the seat back to Available and cancels the paired
//! booking. No background timer exists; a seat nobody touches again stays
//! Held in storage.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
  booking::{Booking, BookingStatus},
  clock::Clock,
  error::{Error, Result},
  seat::{Seat, SeatState, SeatStatus, SeatView},
  show::{self, Show},
  store::{
    BookingCreation, BookingLedger, BookingTransition, Provisioned, SeatStore,
    SeatTransition,
  },
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Tunable engine behaviour. The hold window is configuration, not a
/// hardcoded business rule.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// How long a hold stays valid before it may be swept.
  pub hold_duration: Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      hold_duration: Duration::minutes(5),
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct ReservationEngine<S, C> {
  store:  Arc<S>,
  clock:  C,
  config: EngineConfig,
}

impl<S, C> ReservationEngine<S, C>
where
  S: SeatStore + BookingLedger,
  C: Clock,
{
  pub fn new(store: Arc<S>, clock: C, config: EngineConfig) -> Self {
    Self {
      store,
      clock,
      config,
    }
  }

  // ── Provisioning ──────────────────────────────────────────────────────────

  /// Create `seat_count` Available seats `A1..` for `show_id` and return the
  /// pool. Fails with [`Error::AlreadyProvisioned`] if the show already has
  /// seats; callers should provision into a fresh show id.
  pub async fn provision(
    &self,
    show_id: Uuid,
    name: Option<String>,
    seat_count: u32,
  ) -> Result<Vec<Seat>> {
    let show = Show {
      show_id,
      name,
      created_at: self.clock.now(),
    };
    let seats: Vec<Seat> = show::seat_labels(seat_count)
      .into_iter()
      .map(|seat_id| Seat::available(show_id, seat_id))
      .collect();

    match self
      .store
      .provision_show(show, seats.clone())
      .await
      .map_err(Error::storage)?
    {
      Provisioned::Created => {
        tracing::info!(%show_id, seat_count, "provisioned show");
        Ok(seats)
      }
      Provisioned::AlreadyExists => Err(Error::AlreadyProvisioned(show_id)),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// All seats of a show ordered by seat id, expired holds swept, each
  /// annotated with the booking id of its active hold or confirmed booking.
  pub async fn list_seats(&self, show_id: Uuid) -> Result<Vec<SeatView>> {
    let now = self.clock.now();
    let seats = self
      .store
      .list_seats(show_id)
      .await
      .map_err(Error::storage)?;

    let mut views = Vec::with_capacity(seats.len());
    for seat in seats {
      let seat = self.sweep_seat(seat, now).await?;
      let booking_id = self.resolve_booking_id(&seat).await?;
      views.push(SeatView { seat, booking_id });
    }
    Ok(views)
  }

  /// One seat's current fields, after a single-seat expiry sweep.
  pub async fn snapshot(&self, show_id: Uuid, seat_id: &str) -> Result<Seat> {
    let now = self.clock.now();
    let seat = self.require_seat(show_id, seat_id).await?;
    self.sweep_seat(seat, now).await
  }

  // ── Hold ──────────────────────────────────────────────────────────────────

  /// Place a time-bounded exclusive claim on an Available seat and create
  /// the paired Held booking. The Available → Held compare-and-swap is the
  /// exclusivity checkpoint: of two simultaneous holds on the same seat,
  /// exactly one succeeds.
  pub async fn hold(
    &self,
    show_id: Uuid,
    seat_id: &str,
    holder_name: &str,
  ) -> Result<Booking> {
    let now = self.clock.now();
    let seat = self.require_seat(show_id, seat_id).await?;
    // Inline sweep so a hold does not fail against a hold that has already
    // lapsed but was never observed.
    let seat = self.sweep_seat(seat, now).await?;

    if seat.state.status() != SeatStatus::Available {
      return Err(Error::InvalidSeatState {
        show_id,
        seat_id: seat_id.to_owned(),
        expected: SeatStatus::Available,
        actual: seat.state.status(),
      });
    }

    let booking_id = Uuid::new_v4();
    let hold_id = Uuid::new_v4();
    let hold_expires_at = now + self.config.hold_duration;
    let held = SeatState::Held {
      hold_id,
      held_by: holder_name.to_owned(),
      hold_expires_at,
    };

    match self
      .store
      .transition_seat(show_id, seat_id, SeatState::Available, held.clone())
      .await
      .map_err(Error::storage)?
    {
      SeatTransition::Applied(_) => {}
      // Lost the race to another holder between the availability check and
      // the swap.
      SeatTransition::Conflict { actual } => {
        return Err(Error::InvalidSeatState {
          show_id,
          seat_id: seat_id.to_owned(),
          expected: SeatStatus::Available,
          actual,
        });
      }
      SeatTransition::NotFound => {
        return Err(Error::SeatNotFound {
          show_id,
          seat_id: seat_id.to_owned(),
        });
      }
    }

    let booking = Booking {
      booking_id,
      show_id,
      seat_id: seat_id.to_owned(),
      name: holder_name.to_owned(),
      status: BookingStatus::Held,
      hold_id,
      hold_expires_at,
      created_at: now,
      confirmed_at: None,
    };

    match self.store.create_booking(booking.clone()).await {
      Ok(BookingCreation::Created) => {}
      Ok(BookingCreation::IdCollision) => {
        self.rollback_seat(show_id, seat_id, held.clone()).await;
        return Err(Error::BookingIdCollision(booking_id));
      }
      Err(e) => {
        self.rollback_seat(show_id, seat_id, held.clone()).await;
        return Err(Error::storage(e));
      }
    }

    tracing::info!(
      %show_id, seat_id, %booking_id, %hold_expires_at,
      held_by = holder_name,
      "seat held"
    );
    Ok(booking)
  }

  // ── Confirm ───────────────────────────────────────────────────────────────

  /// Convert a held booking into a permanent one: seat → Booked, booking →
  /// Confirmed. A hold whose window has passed is expired here — the pair is
  /// released before [`Error::HoldExpired`] is returned, not silently left
  /// in place.
  pub async fn confirm(&self, booking_id: Uuid) -> Result<Booking> {
    let now = self.clock.now();
    let booking = self
      .store
      .get_booking(booking_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::BookingNotFound(booking_id))?;

    if booking.status != BookingStatus::Held {
      return Err(Error::InvalidBookingState {
        booking_id,
        expected: BookingStatus::Held,
        actual: booking.status,
      });
    }

    if now > booking.hold_expires_at {
      self.expire_pair(&booking).await?;
      return Err(Error::HoldExpired {
        booking_id,
        expired_at: booking.hold_expires_at,
      });
    }

    // Seat first. The seat must still carry this booking's hold; a seat that
    // was swept and re-held belongs to someone else.
    let seat = self.require_seat(booking.show_id, &booking.seat_id).await?;
    let held = match &seat.state {
      SeatState::Held { hold_id, .. } if *hold_id == booking.hold_id => {
        seat.state.clone()
      }
      SeatState::Held { .. } => {
        return Err(Error::Conflict {
          show_id: booking.show_id,
          seat_id: booking.seat_id.clone(),
        });
      }
      other => {
        return Err(Error::InvalidSeatState {
          show_id:  booking.show_id,
          seat_id:  booking.seat_id.clone(),
          expected: SeatStatus::Held,
          actual:   other.status(),
        });
      }
    };

    let booked = SeatState::Booked {
      booked_by: booking.name.clone(),
      booked_at: now,
    };
    match self
      .store
      .transition_seat(
        booking.show_id,
        &booking.seat_id,
        held.clone(),
        booked.clone(),
      )
      .await
      .map_err(Error::storage)?
    {
      SeatTransition::Applied(_) => {}
      SeatTransition::Conflict { .. } => {
        return Err(Error::Conflict {
          show_id: booking.show_id,
          seat_id: booking.seat_id.clone(),
        });
      }
      SeatTransition::NotFound => {
        return Err(Error::SeatNotFound {
          show_id: booking.show_id,
          seat_id: booking.seat_id.clone(),
        });
      }
    }

    // Booking second, rolling the seat back to its held state if the ledger
    // write does not land.
    match self.store.confirm_booking(booking_id, now).await {
      Ok(BookingTransition::Applied(confirmed)) => {
        tracing::info!(
          %booking_id,
          show_id = %confirmed.show_id,
          seat_id = %confirmed.seat_id,
          "booking confirmed"
        );
        Ok(confirmed)
      }
      Ok(BookingTransition::Conflict { actual }) => {
        self
          .rollback_booked_seat(&booking, booked.clone(), held.clone())
          .await;
        Err(Error::InvalidBookingState {
          booking_id,
          expected: BookingStatus::Held,
          actual,
        })
      }
      Ok(BookingTransition::NotFound) => {
        self
          .rollback_booked_seat(&booking, booked.clone(), held.clone())
          .await;
        Err(Error::BookingNotFound(booking_id))
      }
      Err(e) => {
        self
          .rollback_booked_seat(&booking, booked.clone(), held.clone())
          .await;
        Err(Error::storage(e))
      }
    }
  }

  // ── Cancel ────────────────────────────────────────────────────────────────

  /// Release a held seat and cancel its paired booking. Succeeds even when
  /// no matching booking exists — the seat is the source of truth for
  /// availability, so seat-only cleanup is still a valid cancel.
  pub async fn cancel(&self, show_id: Uuid, seat_id: &str) -> Result<()> {
    let seat = self.require_seat(show_id, seat_id).await?;
    let SeatState::Held { hold_id, .. } = &seat.state else {
      return Err(Error::InvalidSeatState {
        show_id,
        seat_id: seat_id.to_owned(),
        expected: SeatStatus::Held,
        actual: seat.state.status(),
      });
    };
    let hold_id = *hold_id;

    if let Some(booking) = self
      .store
      .find_active_hold(show_id, seat_id)
      .await
      .map_err(Error::storage)?
      && booking.hold_id == hold_id
    {
      // A conflict here means the booking already reached a terminal status;
      // the seat release below still applies.
      self
        .store
        .cancel_booking(booking.booking_id)
        .await
        .map_err(Error::storage)?;
    }

    match self
      .store
      .transition_seat(show_id, seat_id, seat.state.clone(), SeatState::Available)
      .await
      .map_err(Error::storage)?
    {
      SeatTransition::Applied(_) => {
        tracing::info!(%show_id, seat_id, "hold cancelled");
        Ok(())
      }
      SeatTransition::Conflict { .. } => Err(Error::Conflict {
        show_id,
        seat_id: seat_id.to_owned(),
      }),
      SeatTransition::NotFound => Err(Error::SeatNotFound {
        show_id,
        seat_id: seat_id.to_owned(),
      }),
    }
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn require_seat(&self, show_id: Uuid, seat_id: &str) -> Result<Seat> {
    self
      .store
      .get_seat(show_id, seat_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::SeatNotFound {
        show_id,
        seat_id: seat_id.to_owned(),
      })
  }

  /// Lazy expiry: if `seat` carries a hold that lapsed before `now`, release
  /// it and cancel the paired booking. Returns the seat as it should be
  /// observed after the sweep.
  async fn sweep_seat(&self, seat: Seat, now: DateTime<Utc>) -> Result<Seat> {
    let SeatState::Held {
      hold_id,
      hold_expires_at,
      ..
    } = &seat.state
    else {
      return Ok(seat);
    };
    if *hold_expires_at >= now {
      return Ok(seat);
    }
    let hold_id = *hold_id;

    let released = match self
      .store
      .transition_seat(
        seat.show_id,
        &seat.seat_id,
        seat.state.clone(),
        SeatState::Available,
      )
      .await
      .map_err(Error::storage)?
    {
      SeatTransition::Applied(released) => released,
      // Another request got here first; report whatever it left behind.
      SeatTransition::Conflict { .. } | SeatTransition::NotFound => {
        return self.require_seat(seat.show_id, &seat.seat_id).await;
      }
    };

    tracing::debug!(
      show_id = %released.show_id,
      seat_id = %released.seat_id,
      "swept expired hold"
    );

    if let Some(booking) = self
      .store
      .find_active_hold(released.show_id, &released.seat_id)
      .await
      .map_err(Error::storage)?
      && booking.hold_id == hold_id
    {
      self
        .store
        .cancel_booking(booking.booking_id)
        .await
        .map_err(Error::storage)?;
    }

    Ok(released)
  }

  /// Discovered expiry on confirm: release the seat (when it still carries
  /// this booking's hold) and cancel the booking.
  async fn expire_pair(&self, booking: &Booking) -> Result<()> {
    if let Some(seat) = self
      .store
      .get_seat(booking.show_id, &booking.seat_id)
      .await
      .map_err(Error::storage)?
      && let SeatState::Held { hold_id, .. } = &seat.state
      && *hold_id == booking.hold_id
    {
      self
        .store
        .transition_seat(
          booking.show_id,
          &booking.seat_id,
          seat.state.clone(),
          SeatState::Available,
        )
        .await
        .map_err(Error::storage)?;
    }

    self
      .store
      .cancel_booking(booking.booking_id)
      .await
      .map_err(Error::storage)?;
    Ok(())
  }

  /// Best-effort compensation after a failed booking create: put the seat we
  /// just held back to Available. The hold has not been returned to anyone,
  /// so a conflict means there is nothing left to undo.
  async fn rollback_seat(&self, show_id: Uuid, seat_id: &str, held: SeatState) {
    if let Err(e) = self
      .store
      .transition_seat(show_id, seat_id, held, SeatState::Available)
      .await
    {
      tracing::error!(
        %show_id, seat_id, error = %e,
        "seat rollback failed after booking create error"
      );
    }
  }

  /// Best-effort compensation after a failed booking confirm: restore the
  /// seat from Booked to the held state it had before.
  async fn rollback_booked_seat(
    &self,
    booking: &Booking,
    booked: SeatState,
    held: SeatState,
  ) {
    if let Err(e) = self
      .store
      .transition_seat(booking.show_id, &booking.seat_id, booked, held)
      .await
    {
      tracing::error!(
        show_id = %booking.show_id,
        seat_id = %booking.seat_id,
        error = %e,
        "seat rollback failed after booking confirm error"
      );
    }
  }

  async fn resolve_booking_id(&self, seat: &Seat) -> Result<Option<Uuid>> {
    match &seat.state {
      SeatState::Held { hold_id, .. } => {
        let booking = self
          .store
          .find_active_hold(seat.show_id, &seat.seat_id)
          .await
          .map_err(Error::storage)?;
        Ok(
          booking
            .filter(|b| b.hold_id == *hold_id)
            .map(|b| b.booking_id),
        )
      }
      SeatState::Booked { .. } => {
        let booking = self
          .store
          .find_confirmed(seat.show_id, &seat.seat_id)
          .await
          .map_err(Error::storage)?;
        Ok(booking.map(|b| b.booking_id))
      }
      SeatState::Available => Ok(None),
    }
  }
}
