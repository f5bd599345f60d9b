use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};

/// A QoS-facing duration. Thin wrapper around [`std::time::Duration`] so
/// that QoS value types (which derive `Serialize`/`Deserialize` for
/// config-file loading) don't need to depend on `std::time::Duration`'s
/// own (de)serialization shape.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Duration {
  secs: u64,
  nanos: u32,
}

impl Duration {
  pub const ZERO: Duration = Duration { secs: 0, nanos: 0 };
  /// Sentinel meaning "no deadline" / "infinite" for QoS fields that allow
  /// disabling a timer by setting the period to its maximum.
  pub const INFINITE: Duration = Duration {
    secs: u64::MAX,
    nanos: 0,
  };

  pub fn from_millis(ms: u64) -> Self {
    StdDuration::from_millis(ms).into()
  }

  pub fn from_secs(s: u64) -> Self {
    StdDuration::from_secs(s).into()
  }

  pub fn is_zero(self) -> bool {
    self.secs == 0 && self.nanos == 0
  }

  pub fn is_infinite(self) -> bool {
    self == Self::INFINITE
  }
}

impl From<StdDuration> for Duration {
  fn from(d: StdDuration) -> Self {
    Duration {
      secs: d.as_secs(),
      nanos: d.subsec_nanos(),
    }
  }
}

impl From<Duration> for StdDuration {
  fn from(d: Duration) -> Self {
    StdDuration::new(d.secs, d.nanos)
  }
}
