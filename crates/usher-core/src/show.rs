//! Show — a thin envelope that owns a fixed seat pool.
//!
//! The pool is created in bulk at provisioning time; no seat is ever added
//! or removed afterwards. All interesting state lives on the seats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
  pub show_id:    Uuid,
  pub name:       Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Seat ids for a pool of `count` seats: `A1`, `A2`, … `A{count}`.
pub fn seat_labels(count: u32) -> Vec<String> {
  (1..=count).map(|n| format!("A{n}")).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn labels_run_from_a1() {
    let labels = seat_labels(3);
    assert_eq!(labels, ["A1", "A2", "A3"]);
  }

  #[test]
  fn zero_count_yields_empty_pool() {
    assert!(seat_labels(0).is_empty());
  }
}
