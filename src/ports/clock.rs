//! Clock Port - Source of the current UTC instant.
//!
//! Market start times and settlement waits depend on "now"; routing
//! it through a trait keeps the lifecycle deterministic under test.

use chrono::{DateTime, Utc};

/// Trait for reading the current time.
pub trait Clock: Send + Sync + 'static {
  /// Current UTC instant.
  fn now(&self) -> DateTime<Utc>;

  /// Current Unix time in whole seconds.
  fn epoch_seconds(&self) -> i64 {
    self.now().timestamp()
  }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}
