//! [`SqliteStore`] — the SQLite implementation of [`SeatStore`] and
//! [`BookingLedger`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use usher_core::{
  booking::{Booking, BookingStatus},
  seat::{Seat, SeatState},
  show::Show,
  store::{
    BookingCreation, BookingLedger, BookingTransition, Provisioned, SeatStore,
    SeatTransition,
  },
};

use crate::{
  Error, Result,
  encode::{
    RawBooking, RawSeat, encode_booking_status, encode_dt, encode_seat_state,
    encode_uuid,
  },
  schema::SCHEMA,
};

const SEAT_COLUMNS: &str =
  "show_id, seat_id, status, hold_id, held_by, hold_expires_at, booked_by, booked_at";

const BOOKING_COLUMNS: &str =
  "booking_id, show_id, seat_id, name, status, hold_id, hold_expires_at, created_at, confirmed_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A reservation store backed by a single SQLite file.
///
/// Every transition runs its read-compare-update as one transaction on
/// [`tokio_rusqlite`]'s dedicated connection thread — a single-writer
/// serialization point, so the conditional check is never split from the
/// write it guards.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Transition outcome carried out of a `conn.call` closure before decoding.
enum RawOutcome<T> {
  Applied(T),
  Conflict { actual_status: String },
  NotFound,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_booking_by_status(
    &self,
    show_id: Uuid,
    seat_id: &str,
    status: BookingStatus,
  ) -> Result<Option<Booking>> {
    let show_id_str = encode_uuid(show_id);
    let seat_id_str = seat_id.to_owned();
    let status_str = encode_booking_status(status);

    let raw: Option<RawBooking> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings
                 WHERE show_id = ?1 AND seat_id = ?2 AND status = ?3
                 ORDER BY created_at DESC
                 LIMIT 1"
              ),
              rusqlite::params![show_id_str, seat_id_str, status_str],
              RawBooking::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBooking::into_booking).transpose()
  }

  /// Held → `to`, as one transaction. Anything else is a conflict, so a
  /// terminal status is never overwritten.
  async fn transition_booking(
    &self,
    booking_id: Uuid,
    to: BookingStatus,
    confirmed_at: Option<DateTime<Utc>>,
  ) -> Result<BookingTransition> {
    let booking_id_str = encode_uuid(booking_id);
    let to_str = encode_booking_status(to);
    let confirmed_at_str = confirmed_at.map(encode_dt);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let row: Option<RawBooking> = tx
          .query_row(
            &format!(
              "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = ?1"
            ),
            rusqlite::params![booking_id_str],
            RawBooking::from_row,
          )
          .optional()?;

        let Some(mut row) = row else {
          return Ok(RawOutcome::NotFound);
        };
        if row.status != encode_booking_status(BookingStatus::Held) {
          return Ok(RawOutcome::Conflict {
            actual_status: row.status,
          });
        }

        tx.execute(
          "UPDATE bookings
           SET status = ?2, confirmed_at = COALESCE(?3, confirmed_at)
           WHERE booking_id = ?1",
          rusqlite::params![booking_id_str, to_str, confirmed_at_str],
        )?;
        tx.commit()?;

        row.status = to_str.to_owned();
        if confirmed_at_str.is_some() {
          row.confirmed_at = confirmed_at_str;
        }
        Ok(RawOutcome::Applied(row))
      })
      .await?;

    match raw {
      RawOutcome::Applied(row) => {
        Ok(BookingTransition::Applied(row.into_booking()?))
      }
      RawOutcome::Conflict { actual_status } => Ok(BookingTransition::Conflict {
        actual: crate::encode::decode_booking_status(&actual_status)?,
      }),
      RawOutcome::NotFound => Ok(BookingTransition::NotFound),
    }
  }
}

// ─── SeatStore impl ──────────────────────────────────────────────────────────

impl SeatStore for SqliteStore {
  type Error = Error;

  async fn provision_show(
    &self,
    show: Show,
    seats: Vec<Seat>,
  ) -> Result<Provisioned> {
    let show_id_str = encode_uuid(show.show_id);
    let name = show.name.clone();
    let created_at_str = encode_dt(show.created_at);
    let seat_rows: Vec<_> = seats
      .iter()
      .map(|s| (s.seat_id.clone(), encode_seat_state(&s.state)))
      .collect();

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let show_exists: bool = tx
          .query_row(
            "SELECT 1 FROM shows WHERE show_id = ?1",
            rusqlite::params![show_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        let seats_exist: bool = tx
          .query_row(
            "SELECT 1 FROM seats WHERE show_id = ?1 LIMIT 1",
            rusqlite::params![show_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if show_exists || seats_exist {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO shows (show_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![show_id_str, name, created_at_str],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO seats
               (show_id, seat_id, status, hold_id, held_by, hold_expires_at,
                booked_by, booked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          )?;
          for (seat_id, cols) in &seat_rows {
            stmt.execute(rusqlite::params![
              show_id_str,
              seat_id,
              cols.status,
              cols.hold_id,
              cols.held_by,
              cols.hold_expires_at,
              cols.booked_by,
              cols.booked_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if created {
      Provisioned::Created
    } else {
      Provisioned::AlreadyExists
    })
  }

  async fn get_seat(
    &self,
    show_id: Uuid,
    seat_id: &str,
  ) -> Result<Option<Seat>> {
    let show_id_str = encode_uuid(show_id);
    let seat_id_str = seat_id.to_owned();

    let raw: Option<RawSeat> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SEAT_COLUMNS} FROM seats
                 WHERE show_id = ?1 AND seat_id = ?2"
              ),
              rusqlite::params![show_id_str, seat_id_str],
              RawSeat::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSeat::into_seat).transpose()
  }

  async fn list_seats(&self, show_id: Uuid) -> Result<Vec<Seat>> {
    let show_id_str = encode_uuid(show_id);

    let raws: Vec<RawSeat> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SEAT_COLUMNS} FROM seats
           WHERE show_id = ?1
           ORDER BY seat_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![show_id_str], RawSeat::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSeat::into_seat).collect()
  }

  async fn transition_seat(
    &self,
    show_id: Uuid,
    seat_id: &str,
    expected: SeatState,
    next: SeatState,
  ) -> Result<SeatTransition> {
    let show_id_str = encode_uuid(show_id);
    let seat_id_str = seat_id.to_owned();
    let expected_cols = encode_seat_state(&expected);
    let next_cols = encode_seat_state(&next);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let row: Option<RawSeat> = tx
          .query_row(
            &format!(
              "SELECT {SEAT_COLUMNS} FROM seats
               WHERE show_id = ?1 AND seat_id = ?2"
            ),
            rusqlite::params![show_id_str, seat_id_str],
            RawSeat::from_row,
          )
          .optional()?;

        let Some(row) = row else {
          return Ok(RawOutcome::NotFound);
        };
        if !row.matches(&expected_cols) {
          return Ok(RawOutcome::Conflict {
            actual_status: row.status,
          });
        }

        tx.execute(
          "UPDATE seats
           SET status = ?3, hold_id = ?4, held_by = ?5, hold_expires_at = ?6,
               booked_by = ?7, booked_at = ?8
           WHERE show_id = ?1 AND seat_id = ?2",
          rusqlite::params![
            show_id_str,
            seat_id_str,
            next_cols.status,
            next_cols.hold_id,
            next_cols.held_by,
            next_cols.hold_expires_at,
            next_cols.booked_by,
            next_cols.booked_at,
          ],
        )?;
        tx.commit()?;
        Ok(RawOutcome::Applied(()))
      })
      .await?;

    Ok(match raw {
      RawOutcome::Applied(()) => SeatTransition::Applied(Seat {
        show_id,
        seat_id: seat_id.to_owned(),
        state: next,
      }),
      RawOutcome::Conflict { actual_status } => SeatTransition::Conflict {
        actual: crate::encode::decode_seat_status(&actual_status)?,
      },
      RawOutcome::NotFound => SeatTransition::NotFound,
    })
  }
}

// ─── BookingLedger impl ──────────────────────────────────────────────────────

impl BookingLedger for SqliteStore {
  type Error = Error;

  async fn create_booking(&self, booking: Booking) -> Result<BookingCreation> {
    let booking_id_str = encode_uuid(booking.booking_id);
    let show_id_str = encode_uuid(booking.show_id);
    let seat_id = booking.seat_id.clone();
    let name = booking.name.clone();
    let status_str = encode_booking_status(booking.status);
    let hold_id_str = encode_uuid(booking.hold_id);
    let hold_expires_at_str = encode_dt(booking.hold_expires_at);
    let created_at_str = encode_dt(booking.created_at);
    let confirmed_at_str = booking.confirmed_at.map(encode_dt);

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM bookings WHERE booking_id = ?1",
            rusqlite::params![booking_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO bookings
             (booking_id, show_id, seat_id, name, status, hold_id,
              hold_expires_at, created_at, confirmed_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            booking_id_str,
            show_id_str,
            seat_id,
            name,
            status_str,
            hold_id_str,
            hold_expires_at_str,
            created_at_str,
            confirmed_at_str,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(if created {
      BookingCreation::Created
    } else {
      BookingCreation::IdCollision
    })
  }

  async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>> {
    let booking_id_str = encode_uuid(booking_id);

    let raw: Option<RawBooking> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = ?1"
              ),
              rusqlite::params![booking_id_str],
              RawBooking::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBooking::into_booking).transpose()
  }

  async fn find_active_hold(
    &self,
    show_id: Uuid,
    seat_id: &str,
  ) -> Result<Option<Booking>> {
    self
      .find_booking_by_status(show_id, seat_id, BookingStatus::Held)
      .await
  }

  async fn find_confirmed(
    &self,
    show_id: Uuid,
    seat_id: &str,
  ) -> Result<Option<Booking>> {
    self
      .find_booking_by_status(show_id, seat_id, BookingStatus::Confirmed)
      .await
  }

  async fn confirm_booking(
    &self,
    booking_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<BookingTransition> {
    self
      .transition_booking(booking_id, BookingStatus::Confirmed, Some(at))
      .await
  }

  async fn cancel_booking(&self, booking_id: Uuid) -> Result<BookingTransition> {
    self
      .transition_booking(booking_id, BookingStatus::Cancelled, None)
      .await
  }
}
