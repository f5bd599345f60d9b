use std::{
  fmt,
  ops::{Add, Sub},
};

use bit_vec::BitVec;
use serde::{Deserialize, Serialize};

/// Signed 64-bit monotonic per-writer sample counter. `UNKNOWN` is a
/// sentinel that compares below every valid sequence number (mirroring the
/// RTPS wire value `{0,0}`, which the spec treats as "no sequence number
/// yet").
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(i64);

impl SequenceNumber {
  /// Sorts below all valid (i.e. `>= 1`) sequence numbers.
  pub const UNKNOWN: SequenceNumber = SequenceNumber(i64::MIN);
  pub const ZERO: SequenceNumber = SequenceNumber(0);

  pub fn new(value: i64) -> Self {
    SequenceNumber(value)
  }

  pub fn value(self) -> i64 {
    self.0
  }

  pub fn is_unknown(self) -> bool {
    self == Self::UNKNOWN
  }
}

impl fmt::Debug for SequenceNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_unknown() {
      write!(f, "SequenceNumber(UNKNOWN)")
    } else {
      write!(f, "SequenceNumber({})", self.0)
    }
  }
}

impl From<i64> for SequenceNumber {
  fn from(v: i64) -> Self {
    SequenceNumber(v)
  }
}

impl From<SequenceNumber> for i64 {
  fn from(s: SequenceNumber) -> Self {
    s.0
  }
}

impl Add<i64> for SequenceNumber {
  type Output = SequenceNumber;
  fn add(self, rhs: i64) -> SequenceNumber {
    // Saturate rather than wrap past i64::MAX; the spec notes the 63-bit
    // wrap boundary "must not panic" even though it is not reached in
    // practice.
    SequenceNumber(self.0.saturating_add(rhs))
  }
}

impl Sub<i64> for SequenceNumber {
  type Output = SequenceNumber;
  fn sub(self, rhs: i64) -> SequenceNumber {
    SequenceNumber(self.0.saturating_sub(rhs))
  }
}

/// A base sequence number plus a bitmap of up to 256 additional sequence
/// numbers relative to it, used to describe gaps and missing-sample sets
/// without enumerating a `Vec<SequenceNumber>`. Bit `i` set means
/// `base + i` is a member of the set.
#[derive(Clone, PartialEq, Eq)]
pub struct SequenceNumberSet {
  base: SequenceNumber,
  bitmap: BitVec,
}

/// RTPS caps a SequenceNumberSet's range at 256 entries.
pub const SEQUENCE_NUMBER_SET_MAX_RANGE: usize = 256;

impl SequenceNumberSet {
  pub fn new_empty(base: SequenceNumber) -> Self {
    SequenceNumberSet {
      base,
      bitmap: BitVec::new(),
    }
  }

  /// Builds a set covering the contiguous range `[start, end]` (inclusive).
  /// Ranges wider than [`SEQUENCE_NUMBER_SET_MAX_RANGE`] are clamped, as
  /// RTPS readers never need to report more than that many outstanding
  /// sequence numbers at once.
  pub fn from_range(start: SequenceNumber, end: SequenceNumber) -> Self {
    let mut set = SequenceNumberSet::new_empty(start);
    if end.value() < start.value() {
      return set;
    }
    let span = ((end.value() - start.value()) as usize + 1).min(SEQUENCE_NUMBER_SET_MAX_RANGE);
    set.bitmap = BitVec::from_elem(span, true);
    set
  }

  pub fn base(&self) -> SequenceNumber {
    self.base
  }

  pub fn insert(&mut self, sn: SequenceNumber) {
    if sn.value() < self.base.value() {
      return;
    }
    let idx = (sn.value() - self.base.value()) as usize;
    if idx >= SEQUENCE_NUMBER_SET_MAX_RANGE {
      return;
    }
    if idx >= self.bitmap.len() {
      self.bitmap.grow(idx + 1 - self.bitmap.len(), false);
    }
    self.bitmap.set(idx, true);
  }

  pub fn remove(&mut self, sn: SequenceNumber) {
    if sn.value() < self.base.value() {
      return;
    }
    let idx = (sn.value() - self.base.value()) as usize;
    if idx < self.bitmap.len() {
      self.bitmap.set(idx, false);
    }
  }

  pub fn contains(&self, sn: SequenceNumber) -> bool {
    if sn.value() < self.base.value() {
      return false;
    }
    let idx = (sn.value() - self.base.value()) as usize;
    self.bitmap.get(idx).unwrap_or(false)
  }

  pub fn is_empty(&self) -> bool {
    !self.bitmap.iter().any(|b| b)
  }

  /// Iterates the member sequence numbers in increasing order.
  pub fn iter(&self) -> impl Iterator<Item = SequenceNumber> + '_ {
    let base = self.base;
    self
      .bitmap
      .iter()
      .enumerate()
      .filter(|(_, set)| *set)
      .map(move |(i, _)| base + i as i64)
  }
}

impl fmt::Debug for SequenceNumberSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SequenceNumberSet")
      .field("base", &self.base)
      .field("members", &self.iter().collect::<Vec<_>>())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_sorts_below_all_valid_numbers() {
    assert!(SequenceNumber::UNKNOWN < SequenceNumber::from(1));
    assert!(SequenceNumber::UNKNOWN < SequenceNumber::ZERO);
  }

  #[test]
  fn set_from_range_contains_endpoints() {
    let set = SequenceNumberSet::from_range(SequenceNumber::from(5), SequenceNumber::from(8));
    assert!(set.contains(SequenceNumber::from(5)));
    assert!(set.contains(SequenceNumber::from(8)));
    assert!(!set.contains(SequenceNumber::from(9)));
    assert!(!set.contains(SequenceNumber::from(4)));
  }

  #[test]
  fn insert_and_remove_round_trip() {
    let mut set = SequenceNumberSet::new_empty(SequenceNumber::from(10));
    set.insert(SequenceNumber::from(12));
    set.insert(SequenceNumber::from(14));
    assert!(set.contains(SequenceNumber::from(12)));
    assert_eq!(
      set.iter().collect::<Vec<_>>(),
      vec![SequenceNumber::from(12), SequenceNumber::from(14)]
    );
    set.remove(SequenceNumber::from(12));
    assert!(!set.contains(SequenceNumber::from(12)));
  }

  #[test]
  fn does_not_panic_near_63_bit_boundary() {
    let near_max = SequenceNumber::from(i64::MAX - 1);
    let bumped = near_max + 10; // saturates instead of wrapping
    assert_eq!(bumped.value(), i64::MAX);
  }
}
