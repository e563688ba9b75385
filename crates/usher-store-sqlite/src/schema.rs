//! SQL schema for the usher SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS shows (
    show_id    TEXT PRIMARY KEY,
    name       TEXT,
    created_at TEXT NOT NULL    -- RFC 3339 UTC
);

-- One row per seat; identity is (show_id, seat_id). The status-dependent
-- columns are NULL unless the status carries them.
CREATE TABLE IF NOT EXISTS seats (
    show_id         TEXT NOT NULL REFERENCES shows(show_id),
    seat_id         TEXT NOT NULL,
    status          TEXT NOT NULL,   -- 'AVAILABLE' | 'HELD' | 'BOOKED'
    hold_id         TEXT,
    held_by         TEXT,
    hold_expires_at TEXT,
    booked_by       TEXT,
    booked_at       TEXT,
    PRIMARY KEY (show_id, seat_id)
);

-- Bookings are never deleted; cancelled and confirmed rows remain as an
-- audit trail, hold columns included.
CREATE TABLE IF NOT EXISTS bookings (
    booking_id      TEXT PRIMARY KEY,
    show_id         TEXT NOT NULL,
    seat_id         TEXT NOT NULL,
    name            TEXT NOT NULL,
    status          TEXT NOT NULL,   -- 'HELD' | 'CONFIRMED' | 'CANCELLED'
    hold_id         TEXT NOT NULL,
    hold_expires_at TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    confirmed_at    TEXT
);

CREATE INDEX IF NOT EXISTS bookings_seat_status_idx
    ON bookings(show_id, seat_id, status);

PRAGMA user_version = 1;
";
