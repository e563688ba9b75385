//! Time source abstraction.
//!
//! The engine never calls `Utc::now()` directly; it asks its injected
//! [`Clock`], which lets tests drive expiry deterministically.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A settable clock for tests. Clones share the same instant, so a test can
/// keep a handle and advance time under an engine that owns another clone.
#[derive(Debug, Clone)]
pub struct ManualClock {
  now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self {
      now: Arc::new(Mutex::new(start)),
    }
  }

  pub fn set(&self, to: DateTime<Utc>) {
    *self.now.lock().expect("clock mutex poisoned") = to;
  }

  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock().expect("clock mutex poisoned");
    *now += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().expect("clock mutex poisoned")
  }
}
