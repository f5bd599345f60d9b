//! `ReaderHistoryCache`: the bounded, ordered store of received
//! `CacheChange` records (spec §4.3).

use crate::{
  qos::{History, ResourceLimits},
  structure::{CacheChange, InstanceHandle, SequenceNumber, GUID},
  topic::TopicKind,
};

/// Why [`ReaderHistoryCache::add`] refused a change (spec §4.3).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RejectReason {
  FullSamples,
  FullInstances,
  FullPerInstance,
  Duplicate,
}

/// Reader-side sample store. Entries are kept in a single `Vec` in
/// reception order: this doubles as the "primary ordered index by
/// reception" the spec allows, and instance lookups are served by a
/// linear scan, which is cheap at the sample counts a `ResourceLimits`-
/// bounded cache is expected to hold (the "secondary index by instance
/// handle" is therefore computed on demand rather than maintained
/// incrementally).
pub struct ReaderHistoryCache {
  entries: Vec<CacheChange>,
  history: History,
  resource_limits: ResourceLimits,
  topic_kind: TopicKind,
  unread_count: usize,
}

impl ReaderHistoryCache {
  pub fn new(history: History, resource_limits: ResourceLimits, topic_kind: TopicKind) -> Self {
    ReaderHistoryCache {
      entries: Vec::new(),
      history,
      resource_limits,
      topic_kind,
      unread_count: 0,
    }
  }

  fn instance_key(&self, handle: InstanceHandle) -> InstanceHandle {
    match self.topic_kind {
      TopicKind::NoKey => InstanceHandle::NIL,
      TopicKind::WithKey => handle,
    }
  }

  fn position_of(&self, writer_guid: GUID, seq: SequenceNumber) -> Option<usize> {
    self
      .entries
      .iter()
      .position(|c| c.writer_guid == writer_guid && c.sequence_number == seq)
  }

  fn distinct_instance_count(&self) -> usize {
    let mut seen: Vec<InstanceHandle> = Vec::new();
    for e in &self.entries {
      let key = self.instance_key(e.instance_handle);
      if !seen.contains(&key) {
        seen.push(key);
      }
    }
    seen.len()
  }

  fn instance_indices(&self, key: InstanceHandle) -> Vec<usize> {
    self
      .entries
      .iter()
      .enumerate()
      .filter(|(_, e)| self.instance_key(e.instance_handle) == key)
      .map(|(i, _)| i)
      .collect()
  }

  /// Attempts to admit `change` per the history/resource-limits policy
  /// (spec §4.3 "Admission policy"). On `KEEP_LAST` overflow the oldest
  /// same-instance sample is evicted to make room; the open question in
  /// spec §9 is resolved here by never letting that eviction itself
  /// exceed `max_samples` — if the cache is already at capacity with no
  /// room freed by the per-instance evict, admission is still refused.
  pub fn add(&mut self, change: CacheChange) -> Result<(), RejectReason> {
    if self.position_of(change.writer_guid, change.sequence_number).is_some() {
      return Err(RejectReason::Duplicate);
    }

    let key = self.instance_key(change.instance_handle);
    let is_new_instance = self.instance_indices(key).is_empty();

    match self.history {
      History::KeepAll => {
        if self.entries.len() >= self.resource_limits.max_samples as usize {
          return Err(RejectReason::FullSamples);
        }
        if self.topic_kind == TopicKind::WithKey {
          let per_instance = self.instance_indices(key).len();
          if per_instance >= self.resource_limits.max_samples_per_instance as usize {
            return Err(RejectReason::FullPerInstance);
          }
          if is_new_instance && self.distinct_instance_count() >= self.resource_limits.max_instances as usize {
            return Err(RejectReason::FullInstances);
          }
        }
        self.insert(change);
        Ok(())
      }
      History::KeepLast { depth } => {
        if self.topic_kind == TopicKind::WithKey
          && is_new_instance
          && self.distinct_instance_count() >= self.resource_limits.max_instances as usize
        {
          return Err(RejectReason::FullInstances);
        }

        let same_instance = self.instance_indices(key);
        let would_evict = same_instance.len() as i32 >= depth;
        if !would_evict && self.entries.len() >= self.resource_limits.max_samples as usize {
          return Err(RejectReason::FullSamples);
        }
        if would_evict {
          let oldest = same_instance[0];
          self.remove_at(oldest);
        }
        self.insert(change);
        Ok(())
      }
    }
  }

  fn insert(&mut self, change: CacheChange) {
    self.unread_count += 1;
    self.entries.push(change);
  }

  fn remove_at(&mut self, idx: usize) {
    let removed = self.entries.remove(idx);
    if !removed.is_read {
      self.unread_count -= 1;
    }
  }

  /// Removes the change identified by `(writer_guid, seq)`, if present.
  pub fn remove(&mut self, writer_guid: GUID, seq: SequenceNumber) -> bool {
    match self.position_of(writer_guid, seq) {
      Some(idx) => {
        self.remove_at(idx);
        true
      }
      None => false,
    }
  }

  /// Removes every change sourced from `writer_guid`, used for the lazy
  /// unmatch cleanup described in spec §4.1.3.
  pub fn remove_writer(&mut self, writer_guid: GUID) -> usize {
    let before = self.entries.len();
    let mut i = 0;
    while i < self.entries.len() {
      if self.entries[i].writer_guid == writer_guid {
        self.remove_at(i);
      } else {
        i += 1;
      }
    }
    before - self.entries.len()
  }

  /// Marks the entry as read, decrementing `unread_count` if it was not
  /// already marked (invariant 7).
  pub fn mark_read(&mut self, writer_guid: GUID, seq: SequenceNumber) {
    if let Some(idx) = self.position_of(writer_guid, seq) {
      if !self.entries[idx].is_read {
        self.entries[idx].is_read = true;
        self.unread_count -= 1;
      }
    }
  }

  pub fn unread_count(&self) -> usize {
    self.unread_count
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Iterates entries in arrival order (spec §4.3 "Ordering").
  pub fn iterate_in_order(&self) -> impl Iterator<Item = &CacheChange> {
    self.entries.iter()
  }

  pub fn iterate_in_order_mut(&mut self) -> impl Iterator<Item = &mut CacheChange> {
    self.entries.iter_mut()
  }

  pub fn lookup_instance(&self, handle: InstanceHandle) -> Vec<&CacheChange> {
    let key = self.instance_key(handle);
    self.entries.iter().filter(|e| self.instance_key(e.instance_handle) == key).collect()
  }

  pub fn set_history(&mut self, history: History) {
    self.history = history;
  }

  pub fn set_resource_limits(&mut self, limits: ResourceLimits) {
    self.resource_limits = limits;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::structure::{ChangeKind, EntityId, GuidPrefix};
  use chrono::Utc;

  fn writer_guid(n: u8) -> GUID {
    GUID::new(GuidPrefix::new([n; 12]), EntityId::new([0, 0, 0, 1]))
  }

  fn change(writer: GUID, seq: i64, instance: InstanceHandle) -> CacheChange {
    CacheChange::new(
      writer,
      SequenceNumber::from(seq),
      ChangeKind::Alive,
      instance,
      Some(Utc::now()),
      Some(bytes::Bytes::from_static(b"x")),
      Utc::now(),
    )
  }

  #[test]
  fn keep_last_depth_evicts_oldest_same_instance() {
    let mut cache = ReaderHistoryCache::new(
      History::KeepLast { depth: 2 },
      ResourceLimits::default(),
      TopicKind::NoKey,
    );
    let w = writer_guid(1);
    cache.add(change(w, 1, InstanceHandle::NIL)).unwrap();
    cache.add(change(w, 2, InstanceHandle::NIL)).unwrap();
    cache.add(change(w, 3, InstanceHandle::NIL)).unwrap();

    assert_eq!(cache.len(), 2);
    assert!(cache.position_of(w, SequenceNumber::from(1)).is_none());
    assert!(cache.position_of(w, SequenceNumber::from(2)).is_some());
    assert!(cache.position_of(w, SequenceNumber::from(3)).is_some());
  }

  #[test]
  fn keep_all_rejects_past_max_samples() {
    let mut cache = ReaderHistoryCache::new(
      History::KeepAll,
      ResourceLimits {
        max_samples: 2,
        max_instances: i32::MAX,
        max_samples_per_instance: i32::MAX,
      },
      TopicKind::NoKey,
    );
    let w = writer_guid(1);
    cache.add(change(w, 1, InstanceHandle::NIL)).unwrap();
    cache.add(change(w, 2, InstanceHandle::NIL)).unwrap();
    assert_eq!(cache.add(change(w, 3, InstanceHandle::NIL)), Err(RejectReason::FullSamples));
  }

  #[test]
  fn duplicate_identity_is_rejected() {
    let mut cache = ReaderHistoryCache::new(History::KeepAll, ResourceLimits::default(), TopicKind::NoKey);
    let w = writer_guid(1);
    cache.add(change(w, 1, InstanceHandle::NIL)).unwrap();
    assert_eq!(cache.add(change(w, 1, InstanceHandle::NIL)), Err(RejectReason::Duplicate));
  }

  #[test]
  fn unread_count_tracks_is_read_flag() {
    let mut cache = ReaderHistoryCache::new(History::KeepAll, ResourceLimits::default(), TopicKind::NoKey);
    let w = writer_guid(1);
    cache.add(change(w, 1, InstanceHandle::NIL)).unwrap();
    cache.add(change(w, 2, InstanceHandle::NIL)).unwrap();
    assert_eq!(cache.unread_count(), 2);
    cache.mark_read(w, SequenceNumber::from(1));
    assert_eq!(cache.unread_count(), 1);
    cache.mark_read(w, SequenceNumber::from(1));
    assert_eq!(cache.unread_count(), 1, "marking an already-read entry must not double-decrement");
  }

  #[test]
  fn with_key_per_instance_limit_is_independent_per_instance() {
    let mut cache = ReaderHistoryCache::new(
      History::KeepAll,
      ResourceLimits {
        max_samples: 10,
        max_instances: 10,
        max_samples_per_instance: 1,
      },
      TopicKind::WithKey,
    );
    let w = writer_guid(1);
    let a = InstanceHandle::new([1; 16]);
    let b = InstanceHandle::new([2; 16]);
    cache.add(change(w, 1, a)).unwrap();
    assert_eq!(cache.add(change(w, 2, a)), Err(RejectReason::FullPerInstance));
    cache.add(change(w, 3, b)).unwrap();
    assert_eq!(cache.len(), 2);
  }
}
