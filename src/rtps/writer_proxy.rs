//! `WriterProxy`: the reader-side mirror of one matched writer's
//! sequence-number state (spec §4.2).

use std::time::{Duration as StdDuration, Instant};

use rand::Rng;

use crate::{
  qos::QosPolicies,
  structure::{ChangeFromWriter, ChangeFromWriterStatus, SequenceNumber, SequenceNumberSet, GUID},
};

/// The discovery-supplied description of a matched writer. A real
/// participant would also carry unicast/multicast locator lists here, but
/// the transport layer that would consume them is an external
/// collaborator out of this crate's scope (spec §1 "Out of scope").
#[derive(Clone, Debug)]
pub struct WriterProxyDescriptor {
  pub guid: GUID,
  pub qos: QosPolicies,
}

/// Per-matched-writer protocol state machine.
///
/// `ledger` holds one [`ChangeFromWriter`] entry per sequence number that
/// has left the implicit `UNKNOWN` state (spec §4.2's state table), kept
/// sorted ascending by `seq_num` with no duplicates (invariant 2). Numbers
/// never mentioned by a heartbeat, gap or data arrival simply have no
/// entry and are treated as `UNKNOWN`.
#[derive(Debug)]
pub struct WriterProxy {
  descriptor: WriterProxyDescriptor,
  ledger: Vec<ChangeFromWriter>,
  last_removed_seq_num: SequenceNumber,
  heartbeat_response_delay: StdDuration,
  heartbeat_due_at: Option<Instant>,
  received_heartbeat_count: i32,
  sent_acknack_count: i32,
  is_alive: bool,
}

impl WriterProxy {
  pub fn new(descriptor: WriterProxyDescriptor, heartbeat_response_delay: StdDuration) -> Self {
    WriterProxy {
      descriptor,
      ledger: Vec::new(),
      last_removed_seq_num: SequenceNumber::ZERO,
      heartbeat_response_delay,
      heartbeat_due_at: None,
      received_heartbeat_count: 0,
      sent_acknack_count: 0,
      is_alive: true,
    }
  }

  pub fn guid(&self) -> GUID {
    self.descriptor.guid
  }

  pub fn qos(&self) -> &QosPolicies {
    &self.descriptor.qos
  }

  pub fn ownership_strength(&self) -> i32 {
    self.descriptor.qos.ownership.strength
  }

  pub fn last_removed_seq_num(&self) -> SequenceNumber {
    self.last_removed_seq_num
  }

  pub fn is_alive(&self) -> bool {
    self.is_alive
  }

  /// Updates the liveliness flag carried by a HEARTBEAT. Returns `true`
  /// if this changed the previously-known state, so the caller can raise
  /// `LivelinessChanged` only on a real transition.
  pub fn set_alive(&mut self, alive: bool) -> bool {
    let changed = self.is_alive != alive;
    self.is_alive = alive;
    changed
  }

  pub fn set_heartbeat_response_delay(&mut self, delay: StdDuration) {
    self.heartbeat_response_delay = delay;
  }

  fn find(&self, seq: SequenceNumber) -> Result<usize, usize> {
    self.ledger.binary_search_by_key(&seq, |e| e.seq_num)
  }

  fn upsert(&mut self, seq: SequenceNumber, status: ChangeFromWriterStatus) {
    match self.find(seq) {
      Ok(idx) => self.ledger[idx].status = status,
      Err(idx) => self.ledger.insert(idx, ChangeFromWriter::new(seq, status)),
    }
  }

  /// Largest sequence number below which every number is accounted for by
  /// a `Received`, `Irrelevant` or `Lost` entry (spec §4.2 watermark).
  pub fn available_changes_max(&self) -> SequenceNumber {
    let mut watermark = self.last_removed_seq_num;
    loop {
      let next = watermark + 1;
      match self.find(next) {
        Ok(idx) if self.ledger[idx].is_settled() => watermark = next,
        _ => break,
      }
    }
    watermark
  }

  /// Smallest `Received` sequence number above `last_removed_seq_num`,
  /// used by `take_next_sample` to pick the earliest deliverable change
  /// for this writer.
  pub fn available_changes_min(&self) -> Option<SequenceNumber> {
    self
      .ledger
      .iter()
      .find(|e| e.seq_num > self.last_removed_seq_num && e.status == ChangeFromWriterStatus::Received)
      .map(|e| e.seq_num)
  }

  /// Records that `seq` was inserted into the reader's cache, flipping its
  /// ledger entry to `Received` and creating placeholders for any unseen
  /// sequence numbers below it (spec §4.1.1 step 4).
  ///
  /// `reliable` selects what an intervening gap means: a RELIABLE writer
  /// is expected to retransmit, so the gap is left `Missing` pending a
  /// HEARTBEAT/ACKNACK round; BEST_EFFORT has no such machinery (spec §6
  /// "reliabilityQos.kind: BEST_EFFORT disables MISSING/ACKNACK"), so the
  /// gap is immediately settled `Lost`, letting the watermark advance past
  /// it right away instead of stalling on a retransmission that will
  /// never come.
  ///
  /// Returns `false` if `seq` is not newer than anything already known
  /// (the caller is expected to have already rejected duplicates via
  /// `available_changes_max`/`last_removed_seq_num`, so this is a
  /// defensive check, not the primary gate).
  pub fn received_change_set(&mut self, seq: SequenceNumber, reliable: bool) -> bool {
    if seq <= self.last_removed_seq_num {
      return false;
    }
    let gap_status = if reliable {
      ChangeFromWriterStatus::Missing
    } else {
      ChangeFromWriterStatus::Lost
    };
    let highest_known = self.ledger.last().map_or(self.last_removed_seq_num, |e| e.seq_num);
    let mut gap = highest_known + 1;
    while gap < seq {
      if self.find(gap).is_err() {
        self.upsert(gap, gap_status);
      }
      gap = gap + 1;
    }
    self.upsert(seq, ChangeFromWriterStatus::Received);
    true
  }

  /// Heartbeat handling (spec §4.2): extends the ledger with `Missing`
  /// entries for the announced range and arms the heartbeat-response
  /// timer if a reply is warranted.
  pub fn handle_heartbeat(&mut self, first_sn: SequenceNumber, last_sn: SequenceNumber, final_flag: bool, now: Instant) {
    self.received_heartbeat_count += 1;
    let highest_known = self.ledger.last().map_or(self.last_removed_seq_num, |e| e.seq_num);
    let start = std::cmp::max(highest_known + 1, first_sn);
    let mut seq = start;
    while seq <= last_sn {
      if self.find(seq).is_err() {
        self.upsert(seq, ChangeFromWriterStatus::Missing);
      }
      seq = seq + 1;
    }

    let has_missing = self
      .ledger
      .iter()
      .any(|e| e.status == ChangeFromWriterStatus::Missing);
    if !final_flag || has_missing {
      self.arm_heartbeat_response(now);
    }
  }

  fn arm_heartbeat_response(&mut self, now: Instant) {
    let jitter_ms = if self.heartbeat_response_delay.is_zero() {
      0
    } else {
      rand::rng().random_range(0..=self.heartbeat_response_delay.as_millis() as u64)
    };
    self.heartbeat_due_at = Some(now + StdDuration::from_millis(jitter_ms));
  }

  /// Whether the heartbeat-response timer is armed and due, and if so,
  /// disarms it and returns the `SequenceNumberSet` of still-missing
  /// sequence numbers to carry in the outbound ACKNACK.
  pub fn take_due_acknack(&mut self, now: Instant) -> Option<(SequenceNumberSet, i32)> {
    let due = self.heartbeat_due_at?;
    if now < due {
      return None;
    }
    self.heartbeat_due_at = None;
    let missing: Vec<SequenceNumber> = self
      .ledger
      .iter()
      .filter(|e| e.status == ChangeFromWriterStatus::Missing)
      .map(|e| e.seq_num)
      .collect();
    let base = missing.first().copied().unwrap_or(self.available_changes_max() + 1);
    let mut set = SequenceNumberSet::new_empty(base);
    for sn in missing {
      set.insert(sn);
    }
    self.sent_acknack_count += 1;
    Some((set, self.sent_acknack_count))
  }

  /// GAP handling (spec §4.2): marks `gap_list`'s members `Irrelevant`,
  /// plus every sequence number in `[gap_start, gap_list.base())`, which
  /// the writer is implicitly declaring irrelevant too.
  pub fn handle_gap(&mut self, gap_start: SequenceNumber, gap_list: &SequenceNumberSet) {
    let mut seq = gap_start;
    while seq < gap_list.base() {
      self.upsert(seq, ChangeFromWriterStatus::Irrelevant);
      seq = seq + 1;
    }
    for sn in gap_list.iter() {
      self.upsert(sn, ChangeFromWriterStatus::Irrelevant);
    }
  }

  /// Any `Missing`/`Unknown` change older than `first_available_seq_num`
  /// is unrecoverable: the writer's own history no longer holds it.
  /// Returns how many sequence numbers were newly marked `Lost`, so the
  /// caller can raise `SampleLost` only for genuinely new losses.
  pub fn lost_changes_update(&mut self, first_available_seq_num: SequenceNumber) -> usize {
    let mut newly_lost = 0;
    let mut seq = self.last_removed_seq_num + 1;
    while seq < first_available_seq_num {
      match self.find(seq) {
        Ok(idx) if self.ledger[idx].status == ChangeFromWriterStatus::Missing => {
          self.ledger[idx].status = ChangeFromWriterStatus::Lost;
          newly_lost += 1;
        }
        Err(_) => {
          self.upsert(seq, ChangeFromWriterStatus::Lost);
          newly_lost += 1;
        }
        _ => (),
      }
      seq = seq + 1;
    }
    newly_lost
  }

  /// Advances `last_removed_seq_num` to `seq` and drops ledger entries at
  /// or below it so the ledger never grows unbounded (spec §4.2).
  pub fn remove_changes_up_to(&mut self, seq: SequenceNumber) {
    if seq > self.last_removed_seq_num {
      self.last_removed_seq_num = seq;
    }
    self.ledger.retain(|e| e.seq_num > self.last_removed_seq_num);
  }

  #[cfg(test)]
  pub(crate) fn missing_changes(&self) -> Vec<SequenceNumber> {
    self
      .ledger
      .iter()
      .filter(|e| e.status == ChangeFromWriterStatus::Missing)
      .map(|e| e.seq_num)
      .collect()
  }
}
