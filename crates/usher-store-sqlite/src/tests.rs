//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use usher_core::{
  booking::{Booking, BookingStatus},
  clock::ManualClock,
  engine::{EngineConfig, ReservationEngine},
  seat::{Seat, SeatState, SeatStatus},
  show::{self, Show},
  store::{
    BookingCreation, BookingLedger, BookingTransition, Provisioned, SeatStore,
    SeatTransition,
  },
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

fn show(show_id: Uuid) -> Show {
  Show {
    show_id,
    name: Some("Evening Show".into()),
    created_at: t0(),
  }
}

fn pool(show_id: Uuid, count: u32) -> Vec<Seat> {
  show::seat_labels(count)
    .into_iter()
    .map(|seat_id| Seat::available(show_id, seat_id))
    .collect()
}

fn held(held_by: &str) -> SeatState {
  SeatState::Held {
    hold_id:         Uuid::new_v4(),
    held_by:         held_by.into(),
    hold_expires_at: t0() + Duration::minutes(5),
  }
}

fn booking(show_id: Uuid, seat_id: &str, hold_id: Uuid) -> Booking {
  Booking {
    booking_id: Uuid::new_v4(),
    show_id,
    seat_id: seat_id.into(),
    name: "Alice".into(),
    status: BookingStatus::Held,
    hold_id,
    hold_expires_at: t0() + Duration::minutes(5),
    created_at: t0(),
    confirmed_at: None,
  }
}

// ─── Provisioning ────────────────────────────────────────────────────────────

#[tokio::test]
async fn provision_and_list_roundtrip() {
  let s = store().await;
  let show_id = Uuid::new_v4();

  let outcome = s
    .provision_show(show(show_id), pool(show_id, 30))
    .await
    .unwrap();
  assert_eq!(outcome, Provisioned::Created);

  let seats = s.list_seats(show_id).await.unwrap();
  assert_eq!(seats.len(), 30);
  assert!(seats.iter().all(|seat| seat.state == SeatState::Available));

  // ORDER BY seat_id is lexicographic.
  let ids: Vec<&str> = seats.iter().map(|s| s.seat_id.as_str()).collect();
  let mut sorted = ids.clone();
  sorted.sort();
  assert_eq!(ids, sorted);
}

#[tokio::test]
async fn provision_twice_reports_already_exists() {
  let s = store().await;
  let show_id = Uuid::new_v4();

  s.provision_show(show(show_id), pool(show_id, 5))
    .await
    .unwrap();
  let outcome = s
    .provision_show(show(show_id), pool(show_id, 5))
    .await
    .unwrap();
  assert_eq!(outcome, Provisioned::AlreadyExists);

  assert_eq!(s.list_seats(show_id).await.unwrap().len(), 5);
}

#[tokio::test]
async fn get_seat_missing_returns_none() {
  let s = store().await;
  let result = s.get_seat(Uuid::new_v4(), "A1").await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn list_seats_of_unknown_show_is_empty() {
  let s = store().await;
  assert!(s.list_seats(Uuid::new_v4()).await.unwrap().is_empty());
}

// ─── Seat compare-and-swap ───────────────────────────────────────────────────

#[tokio::test]
async fn transition_applies_and_persists() {
  let s = store().await;
  let show_id = Uuid::new_v4();
  s.provision_show(show(show_id), pool(show_id, 3))
    .await
    .unwrap();

  let next = held("Alice");
  let outcome = s
    .transition_seat(show_id, "A1", SeatState::Available, next.clone())
    .await
    .unwrap();
  assert!(matches!(outcome, SeatTransition::Applied(_)));

  // The state round-trips through the column encoding unchanged.
  let seat = s.get_seat(show_id, "A1").await.unwrap().unwrap();
  assert_eq!(seat.state, next);
}

#[tokio::test]
async fn transition_with_stale_expectation_conflicts() {
  let s = store().await;
  let show_id = Uuid::new_v4();
  s.provision_show(show(show_id), pool(show_id, 3))
    .await
    .unwrap();

  s.transition_seat(show_id, "A1", SeatState::Available, held("Alice"))
    .await
    .unwrap();

  // A writer still expecting Available must lose.
  let outcome = s
    .transition_seat(show_id, "A1", SeatState::Available, held("Bob"))
    .await
    .unwrap();
  assert!(matches!(
    outcome,
    SeatTransition::Conflict {
      actual: SeatStatus::Held
    }
  ));

  let seat = s.get_seat(show_id, "A1").await.unwrap().unwrap();
  assert!(
    matches!(&seat.state, SeatState::Held { held_by, .. } if held_by == "Alice")
  );
}

#[tokio::test]
async fn stale_held_state_cannot_release_a_newer_hold() {
  let s = store().await;
  let show_id = Uuid::new_v4();
  s.provision_show(show(show_id), pool(show_id, 1))
    .await
    .unwrap();

  let first = held("Alice");
  s.transition_seat(show_id, "A1", SeatState::Available, first.clone())
    .await
    .unwrap();
  s.transition_seat(show_id, "A1", first.clone(), SeatState::Available)
    .await
    .unwrap();
  let second = held("Bob");
  s.transition_seat(show_id, "A1", SeatState::Available, second.clone())
    .await
    .unwrap();

  // Releasing with the first (stale) hold state must conflict even though
  // the status discriminant matches.
  let outcome = s
    .transition_seat(show_id, "A1", first, SeatState::Available)
    .await
    .unwrap();
  assert!(matches!(outcome, SeatTransition::Conflict { .. }));

  let seat = s.get_seat(show_id, "A1").await.unwrap().unwrap();
  assert_eq!(seat.state, second);
}

#[tokio::test]
async fn transition_unknown_seat_reports_not_found() {
  let s = store().await;
  let outcome = s
    .transition_seat(Uuid::new_v4(), "A1", SeatState::Available, held("Alice"))
    .await
    .unwrap();
  assert!(matches!(outcome, SeatTransition::NotFound));
}

#[tokio::test]
async fn booked_state_roundtrips() {
  let s = store().await;
  let show_id = Uuid::new_v4();
  s.provision_show(show(show_id), pool(show_id, 1))
    .await
    .unwrap();

  let hold = held("Alice");
  s.transition_seat(show_id, "A1", SeatState::Available, hold.clone())
    .await
    .unwrap();
  let booked = SeatState::Booked {
    booked_by: "Alice".into(),
    booked_at: t0() + Duration::seconds(42),
  };
  s.transition_seat(show_id, "A1", hold, booked.clone())
    .await
    .unwrap();

  let seat = s.get_seat(show_id, "A1").await.unwrap().unwrap();
  assert_eq!(seat.state, booked);
}

// ─── Booking ledger ──────────────────────────────────────────────────────────

#[tokio::test]
async fn booking_roundtrips_through_the_ledger() {
  let s = store().await;
  let show_id = Uuid::new_v4();
  let b = booking(show_id, "A1", Uuid::new_v4());

  let outcome = s.create_booking(b.clone()).await.unwrap();
  assert_eq!(outcome, BookingCreation::Created);

  let stored = s.get_booking(b.booking_id).await.unwrap().unwrap();
  assert_eq!(stored, b);
}

#[tokio::test]
async fn duplicate_booking_id_reports_collision() {
  let s = store().await;
  let b = booking(Uuid::new_v4(), "A1", Uuid::new_v4());

  s.create_booking(b.clone()).await.unwrap();
  let outcome = s.create_booking(b).await.unwrap();
  assert_eq!(outcome, BookingCreation::IdCollision);
}

#[tokio::test]
async fn find_active_hold_matches_status() {
  let s = store().await;
  let show_id = Uuid::new_v4();
  let b = booking(show_id, "A1", Uuid::new_v4());
  s.create_booking(b.clone()).await.unwrap();

  let found = s.find_active_hold(show_id, "A1").await.unwrap().unwrap();
  assert_eq!(found.booking_id, b.booking_id);

  assert!(s.find_confirmed(show_id, "A1").await.unwrap().is_none());
  assert!(s.find_active_hold(show_id, "A2").await.unwrap().is_none());

  s.cancel_booking(b.booking_id).await.unwrap();
  assert!(s.find_active_hold(show_id, "A1").await.unwrap().is_none());
}

#[tokio::test]
async fn confirm_booking_stamps_confirmed_at() {
  let s = store().await;
  let show_id = Uuid::new_v4();
  let b = booking(show_id, "A1", Uuid::new_v4());
  s.create_booking(b.clone()).await.unwrap();

  let at = t0() + Duration::seconds(60);
  let outcome = s.confirm_booking(b.booking_id, at).await.unwrap();
  let BookingTransition::Applied(confirmed) = outcome else {
    panic!("expected Applied");
  };
  assert_eq!(confirmed.status, BookingStatus::Confirmed);
  assert_eq!(confirmed.confirmed_at, Some(at));

  let found = s.find_confirmed(show_id, "A1").await.unwrap().unwrap();
  assert_eq!(found.booking_id, b.booking_id);
}

#[tokio::test]
async fn terminal_status_is_never_overwritten() {
  let s = store().await;
  let b = booking(Uuid::new_v4(), "A1", Uuid::new_v4());
  s.create_booking(b.clone()).await.unwrap();
  s.cancel_booking(b.booking_id).await.unwrap();

  let outcome = s.confirm_booking(b.booking_id, t0()).await.unwrap();
  assert!(matches!(
    outcome,
    BookingTransition::Conflict {
      actual: BookingStatus::Cancelled
    }
  ));
}

#[tokio::test]
async fn transition_unknown_booking_reports_not_found() {
  let s = store().await;
  let outcome = s.cancel_booking(Uuid::new_v4()).await.unwrap();
  assert!(matches!(outcome, BookingTransition::NotFound));
}

// ─── Engine over SQLite ──────────────────────────────────────────────────────

#[tokio::test]
async fn engine_full_cycle_over_sqlite() {
  let s = Arc::new(store().await);
  let clock = ManualClock::new(t0());
  let engine =
    ReservationEngine::new(s.clone(), clock.clone(), EngineConfig::default());
  let show_id = Uuid::new_v4();
  engine.provision(show_id, None, 10).await.unwrap();

  // Hold, let it lapse, and watch the snapshot sweep it.
  let stale = engine.hold(show_id, "A1", "Alice").await.unwrap();
  clock.advance(Duration::seconds(301));
  let seat = engine.snapshot(show_id, "A1").await.unwrap();
  assert_eq!(seat.state, SeatState::Available);

  // A fresh hold confirms into a booked seat.
  let fresh = engine.hold(show_id, "A1", "Bob").await.unwrap();
  clock.advance(Duration::seconds(60));
  let confirmed = engine.confirm(fresh.booking_id).await.unwrap();
  assert_eq!(confirmed.status, BookingStatus::Confirmed);

  let views = engine.list_seats(show_id).await.unwrap();
  let a1 = views.iter().find(|v| v.seat.seat_id == "A1").unwrap();
  assert!(
    matches!(&a1.seat.state, SeatState::Booked { booked_by, .. } if booked_by == "Bob")
  );
  assert_eq!(a1.booking_id, Some(fresh.booking_id));

  // The lapsed booking stays in the ledger as a cancelled audit record.
  let audit = s.get_booking(stale.booking_id).await.unwrap().unwrap();
  assert_eq!(audit.status, BookingStatus::Cancelled);
}
