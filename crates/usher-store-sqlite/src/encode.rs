//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, statuses as their wire
//! literals, UUIDs as hyphenated lowercase strings. Because every writer
//! goes through the same encoders, the stored text of a state is
//! byte-identical to the re-encoded text of the state as read back — which
//! lets the compare-and-swap compare column strings directly inside a
//! transaction, without decoding.

use chrono::{DateTime, Utc};
use usher_core::{
  booking::{Booking, BookingStatus},
  seat::{Seat, SeatState, SeatStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String {
  id.hyphenated().to_string()
}

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Ok(Uuid::parse_str(s)?)
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Statuses ────────────────────────────────────────────────────────────────

pub fn encode_seat_status(s: SeatStatus) -> &'static str {
  match s {
    SeatStatus::Available => "AVAILABLE",
    SeatStatus::Held => "HELD",
    SeatStatus::Booked => "BOOKED",
  }
}

pub fn decode_seat_status(s: &str) -> Result<SeatStatus> {
  match s {
    "AVAILABLE" => Ok(SeatStatus::Available),
    "HELD" => Ok(SeatStatus::Held),
    "BOOKED" => Ok(SeatStatus::Booked),
    other => Err(Error::CorruptRow(format!("unknown seat status: {other:?}"))),
  }
}

pub fn encode_booking_status(s: BookingStatus) -> &'static str {
  match s {
    BookingStatus::Held => "HELD",
    BookingStatus::Confirmed => "CONFIRMED",
    BookingStatus::Cancelled => "CANCELLED",
  }
}

pub fn decode_booking_status(s: &str) -> Result<BookingStatus> {
  match s {
    "HELD" => Ok(BookingStatus::Held),
    "CONFIRMED" => Ok(BookingStatus::Confirmed),
    "CANCELLED" => Ok(BookingStatus::Cancelled),
    other => Err(Error::CorruptRow(format!(
      "unknown booking status: {other:?}"
    ))),
  }
}

// ─── Seat state ──────────────────────────────────────────────────────────────

/// The column values of a [`SeatState`], used both to write a state and to
/// compare a stored row against an expected state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatStateColumns {
  pub status:          &'static str,
  pub hold_id:         Option<String>,
  pub held_by:         Option<String>,
  pub hold_expires_at: Option<String>,
  pub booked_by:       Option<String>,
  pub booked_at:       Option<String>,
}

pub fn encode_seat_state(state: &SeatState) -> SeatStateColumns {
  match state {
    SeatState::Available => SeatStateColumns {
      status:          encode_seat_status(SeatStatus::Available),
      hold_id:         None,
      held_by:         None,
      hold_expires_at: None,
      booked_by:       None,
      booked_at:       None,
    },
    SeatState::Held {
      hold_id,
      held_by,
      hold_expires_at,
    } => SeatStateColumns {
      status:          encode_seat_status(SeatStatus::Held),
      hold_id:         Some(encode_uuid(*hold_id)),
      held_by:         Some(held_by.clone()),
      hold_expires_at: Some(encode_dt(*hold_expires_at)),
      booked_by:       None,
      booked_at:       None,
    },
    SeatState::Booked {
      booked_by,
      booked_at,
    } => SeatStateColumns {
      status:          encode_seat_status(SeatStatus::Booked),
      hold_id:         None,
      held_by:         None,
      hold_expires_at: None,
      booked_by:       Some(booked_by.clone()),
      booked_at:       Some(encode_dt(*booked_at)),
    },
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `seats` row.
pub struct RawSeat {
  pub show_id:         String,
  pub seat_id:         String,
  pub status:          String,
  pub hold_id:         Option<String>,
  pub held_by:         Option<String>,
  pub hold_expires_at: Option<String>,
  pub booked_by:       Option<String>,
  pub booked_at:       Option<String>,
}

impl RawSeat {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      show_id:         row.get(0)?,
      seat_id:         row.get(1)?,
      status:          row.get(2)?,
      hold_id:         row.get(3)?,
      held_by:         row.get(4)?,
      hold_expires_at: row.get(5)?,
      booked_by:       row.get(6)?,
      booked_at:       row.get(7)?,
    })
  }

  /// Column-level equality against an expected state. String comparison is
  /// exact because both sides come from the same encoders.
  pub fn matches(&self, expected: &SeatStateColumns) -> bool {
    self.status == expected.status
      && self.hold_id == expected.hold_id
      && self.held_by == expected.held_by
      && self.hold_expires_at == expected.hold_expires_at
      && self.booked_by == expected.booked_by
      && self.booked_at == expected.booked_at
  }

  pub fn into_seat(self) -> Result<Seat> {
    let show_id = decode_uuid(&self.show_id)?;
    let state = match decode_seat_status(&self.status)? {
      SeatStatus::Available => SeatState::Available,
      SeatStatus::Held => SeatState::Held {
        hold_id:         decode_uuid(&self.require(self.hold_id.as_deref(), "hold_id")?)?,
        held_by:         self.require(self.held_by.as_deref(), "held_by")?,
        hold_expires_at: decode_dt(&self.require(
          self.hold_expires_at.as_deref(),
          "hold_expires_at",
        )?)?,
      },
      SeatStatus::Booked => SeatState::Booked {
        booked_by: self.require(self.booked_by.as_deref(), "booked_by")?,
        booked_at: decode_dt(
          &self.require(self.booked_at.as_deref(), "booked_at")?,
        )?,
      },
    };
    Ok(Seat {
      show_id,
      seat_id: self.seat_id,
      state,
    })
  }

  fn require(&self, value: Option<&str>, column: &str) -> Result<String> {
    value.map(str::to_owned).ok_or_else(|| {
      Error::CorruptRow(format!(
        "seat {} in show {} is {} but has no {column}",
        self.seat_id, self.show_id, self.status
      ))
    })
  }
}

/// Raw strings read directly from a `bookings` row.
pub struct RawBooking {
  pub booking_id:      String,
  pub show_id:         String,
  pub seat_id:         String,
  pub name:            String,
  pub status:          String,
  pub hold_id:         String,
  pub hold_expires_at: String,
  pub created_at:      String,
  pub confirmed_at:    Option<String>,
}

impl RawBooking {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      booking_id:      row.get(0)?,
      show_id:         row.get(1)?,
      seat_id:         row.get(2)?,
      name:            row.get(3)?,
      status:          row.get(4)?,
      hold_id:         row.get(5)?,
      hold_expires_at: row.get(6)?,
      created_at:      row.get(7)?,
      confirmed_at:    row.get(8)?,
    })
  }

  pub fn into_booking(self) -> Result<Booking> {
    Ok(Booking {
      booking_id:      decode_uuid(&self.booking_id)?,
      show_id:         decode_uuid(&self.show_id)?,
      seat_id:         self.seat_id,
      name:            self.name,
      status:          decode_booking_status(&self.status)?,
      hold_id:         decode_uuid(&self.hold_id)?,
      hold_expires_at: decode_dt(&self.hold_expires_at)?,
      created_at:      decode_dt(&self.created_at)?,
      confirmed_at:    self
        .confirmed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}
