//! `LifespanSweeper`: expires cache entries whose lifespan has elapsed
//! (spec §4.5).

use std::{
  collections::VecDeque,
  time::{Duration as StdDuration, Instant},
};

use crate::structure::{SequenceNumber, GUID};

/// FIFO of pending expirations. Entries are enqueued in the order their
/// changes were accepted; since `lifespan` is constant for the life of
/// the reader and reception is monotonic, expiry time is also
/// non-decreasing in enqueue order, which is what makes a plain FIFO
/// correct here instead of a priority queue (spec §4.5 "FIFO").
pub struct LifespanSweeper {
  lifespan: StdDuration,
  pending: VecDeque<(Instant, GUID, SequenceNumber)>,
}

impl LifespanSweeper {
  pub fn new(lifespan: StdDuration) -> Self {
    LifespanSweeper {
      lifespan,
      pending: VecDeque::new(),
    }
  }

  pub fn is_enabled(&self) -> bool {
    self.lifespan != StdDuration::MAX && !self.lifespan.is_zero()
  }

  pub fn set_lifespan(&mut self, lifespan: StdDuration) {
    self.lifespan = lifespan;
  }

  /// Schedules `(writer_guid, seq)` for expiry `lifespan` after
  /// `received_at`.
  pub fn track(&mut self, writer_guid: GUID, seq: SequenceNumber, received_at: Instant) {
    if !self.is_enabled() {
      return;
    }
    self.pending.push_back((received_at + self.lifespan, writer_guid, seq));
  }

  /// Pops every entry whose expiry has elapsed by `now`.
  pub fn poll_expired(&mut self, now: Instant) -> Vec<(GUID, SequenceNumber)> {
    let mut expired = Vec::new();
    while let Some(&(expire_at, guid, seq)) = self.pending.front() {
      if expire_at > now {
        break;
      }
      self.pending.pop_front();
      expired.push((guid, seq));
    }
    expired
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::structure::{EntityId, GuidPrefix};

  fn guid() -> GUID {
    GUID::new(GuidPrefix::new([7; 12]), EntityId::new([0, 0, 0, 1]))
  }

  #[test]
  fn expires_in_fifo_order_past_lifespan() {
    let mut sweeper = LifespanSweeper::new(StdDuration::from_millis(100));
    let start = Instant::now();
    sweeper.track(guid(), SequenceNumber::from(1), start);
    sweeper.track(guid(), SequenceNumber::from(2), start + StdDuration::from_millis(10));

    assert!(sweeper.poll_expired(start + StdDuration::from_millis(50)).is_empty());
    let expired = sweeper.poll_expired(start + StdDuration::from_millis(150));
    assert_eq!(expired, vec![(guid(), SequenceNumber::from(1)), (guid(), SequenceNumber::from(2))]);
  }

  #[test]
  fn disabled_sweeper_tracks_nothing() {
    let mut sweeper = LifespanSweeper::new(StdDuration::MAX);
    sweeper.track(guid(), SequenceNumber::from(1), Instant::now());
    assert!(sweeper.poll_expired(Instant::now() + StdDuration::from_secs(3600)).is_empty());
  }
}
