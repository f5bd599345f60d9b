//! `DeadlineTracker`: per-instance deadline timer set (spec §4.4).

use std::{
  collections::{BTreeMap, HashMap},
  time::{Duration as StdDuration, Instant},
};

use crate::structure::InstanceHandle;

/// Tracks, for every instance that has received at least one sample, the
/// timestamp its next deadline falls due. Expiry lookups go through a
/// `BTreeMap` keyed by `(deadline, instance)` so the earliest-expiring
/// instance is always the first entry — an O(log N) insert/remove, per
/// spec §4.4.
pub struct DeadlineTracker {
  period: StdDuration,
  deadlines: BTreeMap<(Instant, InstanceHandle), ()>,
  current_deadline: HashMap<InstanceHandle, Instant>,
}

impl DeadlineTracker {
  pub fn new(period: StdDuration) -> Self {
    DeadlineTracker {
      period,
      deadlines: BTreeMap::new(),
      current_deadline: HashMap::new(),
    }
  }

  /// `deadlineQos.period == infinite` disables tracking entirely (spec
  /// §6's configuration table).
  pub fn is_enabled(&self) -> bool {
    self.period != StdDuration::MAX && !self.period.is_zero()
  }

  pub fn set_period(&mut self, period: StdDuration) {
    self.period = period;
  }

  /// Resets the deadline window for `instance`, as a fresh sample just
  /// arrived for it.
  pub fn on_sample_received(&mut self, instance: InstanceHandle, now: Instant) {
    if !self.is_enabled() {
      return;
    }
    if let Some(old) = self.current_deadline.remove(&instance) {
      self.deadlines.remove(&(old, instance));
    }
    let next = now + self.period;
    self.deadlines.insert((next, instance), ());
    self.current_deadline.insert(instance, next);
  }

  /// Drops an instance from tracking entirely, e.g. once its last writer
  /// has unregistered it.
  pub fn remove_instance(&mut self, instance: InstanceHandle) {
    if let Some(old) = self.current_deadline.remove(&instance) {
      self.deadlines.remove(&(old, instance));
    }
  }

  /// Pops every instance whose deadline has elapsed by `now`, re-arming
  /// each for another `period` so a sustained silence keeps firing
  /// (spec §4.4 "re-arms for the next-earliest").
  pub fn poll_expired(&mut self, now: Instant) -> Vec<InstanceHandle> {
    if !self.is_enabled() {
      return Vec::new();
    }
    let mut expired = Vec::new();
    loop {
      let earliest = self.deadlines.keys().next().copied();
      match earliest {
        Some((deadline, instance)) if deadline <= now => {
          self.deadlines.remove(&(deadline, instance));
          expired.push(instance);
          let next = now + self.period;
          self.deadlines.insert((next, instance), ());
          self.current_deadline.insert(instance, next);
        }
        _ => break,
      }
    }
    expired
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fires_after_period_elapses_and_rearms() {
    let mut tracker = DeadlineTracker::new(StdDuration::from_millis(100));
    let start = Instant::now();
    let instance = InstanceHandle::new([1; 16]);
    tracker.on_sample_received(instance, start);

    assert!(tracker.poll_expired(start + StdDuration::from_millis(50)).is_empty());
    let fired = tracker.poll_expired(start + StdDuration::from_millis(150));
    assert_eq!(fired, vec![instance]);

    // Re-armed: stays quiet until another full period has passed.
    assert!(tracker.poll_expired(start + StdDuration::from_millis(200)).is_empty());
    let fired_again = tracker.poll_expired(start + StdDuration::from_millis(260));
    assert_eq!(fired_again, vec![instance]);
  }

  #[test]
  fn fresh_sample_before_deadline_prevents_firing() {
    let mut tracker = DeadlineTracker::new(StdDuration::from_millis(100));
    let start = Instant::now();
    let instance = InstanceHandle::new([2; 16]);
    tracker.on_sample_received(instance, start);
    tracker.on_sample_received(instance, start + StdDuration::from_millis(80));

    assert!(tracker.poll_expired(start + StdDuration::from_millis(150)).is_empty());
  }

  #[test]
  fn disabled_tracker_never_fires() {
    let mut tracker = DeadlineTracker::new(StdDuration::MAX);
    let instance = InstanceHandle::new([3; 16]);
    let now = Instant::now();
    tracker.on_sample_received(instance, now);
    assert!(tracker.poll_expired(now + StdDuration::from_secs(3600)).is_empty());
  }
}
