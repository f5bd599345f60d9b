//! `StatefulReader`: owns the set of `WriterProxy`s and the history cache,
//! and is the entry point for discovery events, incoming changes,
//! application reads and timers (spec §4.1).

use std::{
  collections::HashMap,
  sync::{Condvar, Mutex},
  time::{Duration as StdDuration, Instant},
};

use log::{debug, info, trace, warn};

use crate::{
  config::{ReaderAttributes, ReaderTimes},
  dds::{
    sample::Sample,
    sample_info::{InstanceState, SampleInfo, SampleState, ViewState},
    statusevents::{sync_status_channel, CountWithChange, DataReaderStatus, SampleRejectedStatusKind, StatusChannelReceiver, StatusChannelSender},
  },
  error::{ReadResult, ReaderError},
  qos::{QosPolicies, Reliability},
  qos_compatibility,
  rtps::{
    deadline_tracker::DeadlineTracker,
    history_cache::{RejectReason, ReaderHistoryCache},
    lifespan_sweeper::LifespanSweeper,
    writer_proxy::{WriterProxy, WriterProxyDescriptor},
  },
  structure::{CacheChange, SequenceNumber, SequenceNumberSet, GUID},
  topic::TopicAttributes,
  type_support::TypeSupport,
};

/// Outcome of feeding one parsed change through the acceptance algorithm
/// (spec §4.1.1). Not an error type: every variant other than a
/// programming mistake is an expected, loggable outcome, matching the
/// "recoverable anomalies never interrupt the receive pipeline" policy
/// of spec §7.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SampleAcceptance {
  Accepted,
  /// Accepted from a trusted builtin writer id with no matching proxy;
  /// never reaches the user-visible cache (spec §4.1.1 step 1).
  AcceptedWithoutCache,
  DroppedUnknownWriter,
  RejectedUnknownWriter,
  /// `sequence_number` was at or below the writer's already-delivered
  /// watermark: a duplicate or stale retransmission.
  RejectedStale,
  Rejected(RejectReason),
}

struct Inner {
  topic: TopicAttributes,
  qos: QosPolicies,
  times: ReaderTimes,
  attributes: ReaderAttributes,
  proxies: HashMap<GUID, WriterProxy>,
  cache: ReaderHistoryCache,
  deadline: DeadlineTracker,
  lifespan: LifespanSweeper,
  enabled: bool,
  requested_deadline_missed_total: i32,
  requested_deadline_missed_since_read: i32,
  sample_rejected_total: i32,
  sample_rejected_since_read: i32,
  sample_rejected_last_reason: SampleRejectedStatusKind,
  sample_lost_total: i32,
  sample_lost_since_read: i32,
  liveliness_alive_total: i32,
  liveliness_not_alive_total: i32,
  subscription_matched_total: i32,
  subscription_matched_current: i32,
}

/// The reader-core entry point. Generic over the application's sample
/// type `D` and the `TypeSupport` capability that knows how to
/// deserialize it (spec §9 "Global registry" design note: no process-wide
/// type registry, the capability is injected here instead).
pub struct StatefulReader<D, TS: TypeSupport<D>> {
  guid: GUID,
  inner: Mutex<Inner>,
  unread_condvar: Condvar,
  status_sender: StatusChannelSender<DataReaderStatus>,
  status_receiver: StatusChannelReceiver<DataReaderStatus>,
  type_support: TS,
  _marker: std::marker::PhantomData<D>,
}

impl<D, TS: TypeSupport<D>> StatefulReader<D, TS> {
  pub fn new(
    guid: GUID,
    topic: TopicAttributes,
    qos: QosPolicies,
    times: ReaderTimes,
    attributes: ReaderAttributes,
    type_support: TS,
  ) -> ReadResult<Self> {
    qos_compatibility::check_qos(&qos, topic.kind)?;
    let cache = ReaderHistoryCache::new(qos.history, qos.resource_limits, topic.kind);
    let deadline = DeadlineTracker::new(qos.deadline.0.into());
    let lifespan = LifespanSweeper::new(qos.lifespan.0.into());
    let (status_sender, status_receiver) = sync_status_channel(32);

    Ok(StatefulReader {
      guid,
      inner: Mutex::new(Inner {
        topic,
        qos,
        times,
        attributes,
        proxies: HashMap::new(),
        cache,
        deadline,
        lifespan,
        enabled: true,
        requested_deadline_missed_total: 0,
        requested_deadline_missed_since_read: 0,
        sample_rejected_total: 0,
        sample_rejected_since_read: 0,
        sample_rejected_last_reason: SampleRejectedStatusKind::NotRejected,
        sample_lost_total: 0,
        sample_lost_since_read: 0,
        liveliness_alive_total: 0,
        liveliness_not_alive_total: 0,
        subscription_matched_total: 0,
        subscription_matched_current: 0,
      }),
      unread_condvar: Condvar::new(),
      status_sender,
      status_receiver,
      type_support,
      _marker: std::marker::PhantomData,
    })
  }

  pub fn guid(&self) -> GUID {
    self.guid
  }

  pub fn status_receiver(&self) -> &StatusChannelReceiver<DataReaderStatus> {
    &self.status_receiver
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  // -- matching -----------------------------------------------------

  pub fn match_writer_add(&self, descriptor: WriterProxyDescriptor) -> bool {
    let mut inner = self.lock();
    if !inner.enabled {
      return false;
    }
    if inner.proxies.contains_key(&descriptor.guid) {
      debug!("match_writer_add: {} already matched, ignoring", descriptor.guid);
      return false;
    }
    if let Err(incompatible) = qos_compatibility::is_compatible(&inner.qos, &descriptor.qos) {
      warn!("match_writer_add: {} offers incompatible QoS {:?}", descriptor.guid, incompatible);
      self.status_sender.try_send(DataReaderStatus::RequestedIncompatibleQos {
        count: CountWithChange::new(1, 1),
        last_policy_id: incompatible,
        writer: descriptor.guid,
      });
      return false;
    }
    let delay: StdDuration = inner.times.heartbeat_response_delay.into();
    let guid = descriptor.guid;
    inner.proxies.insert(guid, WriterProxy::new(descriptor, delay));
    inner.subscription_matched_total += 1;
    inner.subscription_matched_current += 1;
    info!("match_writer_add: {guid} matched");
    self.status_sender.try_send(DataReaderStatus::SubscriptionMatched {
      total: CountWithChange::new(inner.subscription_matched_total, 1),
      current: CountWithChange::new(inner.subscription_matched_current, 1),
      writer: guid,
    });
    true
  }

  /// Removes a matched writer. Cache entries it sourced are not deleted
  /// here; they are garbage-collected lazily on the next read/take scan
  /// (spec §4.1.3 keeps unmatch O(1)).
  pub fn match_writer_remove(&self, guid: GUID) -> bool {
    let mut inner = self.lock();
    if inner.proxies.remove(&guid).is_none() {
      return false;
    }
    inner.subscription_matched_current -= 1;
    info!("match_writer_remove: {guid} unmatched");
    self.status_sender.try_send(DataReaderStatus::SubscriptionMatched {
      total: CountWithChange::new(inner.subscription_matched_total, 0),
      current: CountWithChange::new(inner.subscription_matched_current, -1),
      writer: guid,
    });
    true
  }

  pub fn is_matched(&self, guid: GUID) -> bool {
    self.lock().proxies.contains_key(&guid)
  }

  // -- ingest ---------------------------------------------------------

  /// Sample-acceptance algorithm (spec §4.1.1).
  pub fn on_parsed_change(&self, change: CacheChange, source_guid: GUID) -> SampleAcceptance {
    let mut inner = self.lock();
    if !inner.enabled {
      return SampleAcceptance::DroppedUnknownWriter;
    }

    if !inner.proxies.contains_key(&source_guid) {
      if inner.attributes.accept_from_unknown {
        warn!("on_parsed_change: dropping change from unmatched writer {source_guid}");
        return SampleAcceptance::DroppedUnknownWriter;
      }
      if inner.attributes.trusted_writer_entity_id == Some(source_guid.entity_id) {
        trace!("on_parsed_change: accepting builtin change from {source_guid} without a proxy");
        return SampleAcceptance::AcceptedWithoutCache;
      }
      warn!("on_parsed_change: rejecting change from unknown writer {source_guid}");
      return SampleAcceptance::RejectedUnknownWriter;
    }

    let (last_removed, max_available) = {
      let proxy = &inner.proxies[&source_guid];
      (proxy.last_removed_seq_num(), proxy.available_changes_max())
    };
    if change.sequence_number <= last_removed || change.sequence_number <= max_available {
      trace!(
        "on_parsed_change: {source_guid} seq {:?} is stale (last_removed={:?}, max_available={:?})",
        change.sequence_number,
        last_removed,
        max_available
      );
      return SampleAcceptance::RejectedStale;
    }

    let seq = change.sequence_number;
    let instance_handle = change.instance_handle;
    let reception_instant = Instant::now();
    match inner.cache.add(change) {
      Err(RejectReason::Duplicate) => {
        trace!("on_parsed_change: {source_guid} seq {seq:?} is a duplicate, ignoring");
        return SampleAcceptance::Rejected(RejectReason::Duplicate);
      }
      Err(reason) => {
        warn!("on_parsed_change: {source_guid} seq {seq:?} rejected by cache: {reason:?}");
        inner.sample_rejected_total += 1;
        inner.sample_rejected_since_read += 1;
        let kind = match reason {
          RejectReason::FullSamples => SampleRejectedStatusKind::BySamplesLimit,
          RejectReason::FullInstances => SampleRejectedStatusKind::ByInstancesLimit,
          RejectReason::FullPerInstance => SampleRejectedStatusKind::BySamplesPerInstanceLimit,
          RejectReason::Duplicate => unreachable!("handled above"),
        };
        inner.sample_rejected_last_reason = kind;
        self.status_sender.try_send(DataReaderStatus::SampleRejected {
          count: CountWithChange::new(inner.sample_rejected_total, 1),
          last_reason: kind,
        });
        return SampleAcceptance::Rejected(reason);
      }
      Ok(()) => {
        let reliable = matches!(inner.qos.reliability, Reliability::Reliable { .. });
        let proxy = inner.proxies.get_mut(&source_guid).expect("checked present above");
        proxy.received_change_set(seq, reliable);
        let lifespan_enabled = inner.lifespan.is_enabled();
        let deadline_enabled = inner.deadline.is_enabled();
        if deadline_enabled {
          inner.deadline.on_sample_received(instance_handle, reception_instant);
        }
        if lifespan_enabled {
          inner.lifespan.track(source_guid, seq, reception_instant);
        }
        drop(inner);
        self.unread_condvar.notify_all();
        SampleAcceptance::Accepted
      }
    }
  }

  pub fn on_heartbeat(
    &self,
    source_guid: GUID,
    first_sn: SequenceNumber,
    last_sn: SequenceNumber,
    final_flag: bool,
    liveliness: bool,
  ) {
    let mut inner = self.lock();
    let Some(proxy) = inner.proxies.get_mut(&source_guid) else {
      trace!("on_heartbeat: no proxy for {source_guid}, ignoring");
      return;
    };
    proxy.handle_heartbeat(first_sn, last_sn, final_flag, Instant::now());
    let newly_lost = proxy.lost_changes_update(first_sn);
    if newly_lost > 0 {
      inner.sample_lost_total += newly_lost as i32;
      inner.sample_lost_since_read += newly_lost as i32;
      self.status_sender.try_send(DataReaderStatus::SampleLost {
        count: CountWithChange::new(inner.sample_lost_total, newly_lost as i32),
      });
    }
    let proxy = inner.proxies.get_mut(&source_guid).expect("checked present above");
    let changed = proxy.set_alive(liveliness);
    if changed {
      if liveliness {
        inner.liveliness_alive_total += 1;
      } else {
        inner.liveliness_not_alive_total += 1;
      }
      self.status_sender.try_send(DataReaderStatus::LivelinessChanged {
        alive_total: CountWithChange::new(inner.liveliness_alive_total, i32::from(liveliness)),
        not_alive_total: CountWithChange::new(inner.liveliness_not_alive_total, i32::from(!liveliness)),
        writer: source_guid,
      });
    }
  }

  pub fn on_gap(&self, source_guid: GUID, gap_start: SequenceNumber, gap_list: &SequenceNumberSet) {
    let mut inner = self.lock();
    if let Some(proxy) = inner.proxies.get_mut(&source_guid) {
      proxy.handle_gap(gap_start, gap_list);
    }
  }

  /// Pending ACKNACKs across all proxies whose heartbeat-response timer
  /// has fired (spec §4.2). The caller is expected to be a timer thread
  /// that then ships these out over the transport.
  pub fn poll_due_acknacks(&self, now: Instant) -> Vec<(GUID, SequenceNumberSet, i32)> {
    let mut inner = self.lock();
    inner
      .proxies
      .iter_mut()
      .filter_map(|(guid, proxy)| proxy.take_due_acknack(now).map(|(set, count)| (*guid, set, count)))
      .collect()
  }

  /// Deadline/lifespan timer sweep. A dedicated timer thread calls this
  /// periodically; it is also safe to call inline after ingest for
  /// tests, since it just re-acquires the endpoint lock.
  pub fn poll_timers(&self, now: Instant) {
    let mut inner = self.lock();
    let missed = inner.deadline.poll_expired(now);
    for instance in missed {
      inner.requested_deadline_missed_total += 1;
      inner.requested_deadline_missed_since_read += 1;
      self.status_sender.try_send(DataReaderStatus::RequestedDeadlineMissed {
        count: CountWithChange::new(inner.requested_deadline_missed_total, 1),
      });
      debug!("poll_timers: deadline missed for {instance:?}");
    }

    let expired = inner.lifespan.poll_expired(now);
    for (writer_guid, seq) in expired {
      if inner.cache.remove(writer_guid, seq) {
        debug!("poll_timers: lifespan expired {writer_guid} seq {seq:?}");
      }
    }
  }

  // -- read/take --------------------------------------------------------

  /// Smallest still-unread cache entry per writer (spec §4.1.2: an entry is
  /// only a candidate for delivery once every lower sequence number from
  /// the same writer has already been read/taken). Scanning arrival order
  /// alone is not enough to pick the right entry: a writer's samples can
  /// land in the cache out of sequence-number order (e.g. seq 2 then seq
  /// 1), and invariant 2/spec §5 require that a higher sequence number is
  /// never handed out before a lower one from the same writer.
  fn lowest_unread_per_writer(inner: &Inner) -> HashMap<GUID, SequenceNumber> {
    let mut lowest: HashMap<GUID, SequenceNumber> = HashMap::new();
    for entry in inner.cache.iterate_in_order() {
      if entry.is_read {
        continue;
      }
      lowest
        .entry(entry.writer_guid)
        .and_modify(|min| *min = (*min).min(entry.sequence_number))
        .or_insert(entry.sequence_number);
    }
    lowest
  }

  fn deliver<'a>(inner: &'a mut Inner, take: bool) -> ReadResult<(CacheChange, Option<i32>)> {
    let mut orphan_victims: Vec<(GUID, SequenceNumber)> = Vec::new();
    for entry in inner.cache.iterate_in_order() {
      if !entry.is_read && !inner.proxies.contains_key(&entry.writer_guid) {
        orphan_victims.push((entry.writer_guid, entry.sequence_number));
      }
    }
    for (writer_guid, seq) in &orphan_victims {
      warn!("read/take scan: garbage-collecting orphaned change {writer_guid} seq {seq:?}");
      inner.cache.remove(*writer_guid, *seq);
    }

    // `take` advances each proxy's ledger as changes are taken, so its own
    // watermark-bounded minimum is authoritative and already excludes
    // anything below `last_removed_seq_num`; `read` never touches the
    // ledger, so the candidate is simply the smallest unread cache entry.
    let next_for_writer: HashMap<GUID, SequenceNumber> = if take {
      inner
        .proxies
        .iter()
        .filter_map(|(guid, proxy)| proxy.available_changes_min().map(|min| (*guid, min)))
        .collect()
    } else {
      Self::lowest_unread_per_writer(inner)
    };

    let mut found: Option<(GUID, SequenceNumber)> = None;
    for entry in inner.cache.iterate_in_order() {
      if entry.is_read {
        continue;
      }
      if next_for_writer.get(&entry.writer_guid) != Some(&entry.sequence_number) {
        continue;
      }
      if let Some(proxy) = inner.proxies.get(&entry.writer_guid) {
        if proxy.available_changes_max() >= entry.sequence_number {
          found = Some((entry.writer_guid, entry.sequence_number));
          break;
        }
      }
    }

    let (writer_guid, seq) = found.ok_or(ReaderError::NoData)?;
    inner.cache.mark_read(writer_guid, seq);
    let ownership_strength = inner.proxies.get(&writer_guid).map(|p| p.ownership_strength());

    let change = inner
      .cache
      .iterate_in_order()
      .find(|c| c.writer_guid == writer_guid && c.sequence_number == seq)
      .cloned()
      .expect("just marked read above");

    if take {
      inner.cache.remove(writer_guid, seq);
      if let Some(proxy) = inner.proxies.get_mut(&writer_guid) {
        proxy.remove_changes_up_to(seq);
      }
    }

    Ok((change, ownership_strength))
  }

  fn sample_info_for(&self, change: &CacheChange, ownership_strength: Option<i32>, was_unread: bool) -> SampleInfo {
    SampleInfo {
      instance_state: InstanceState::from(change.kind),
      writer_guid: change.writer_guid,
      source_timestamp: change.source_timestamp,
      reception_timestamp: change.reception_timestamp,
      instance_handle: change.instance_handle,
      ownership_strength: ownership_strength.unwrap_or(0),
      valid_data: change.kind.has_payload(),
      sample_state: if was_unread { SampleState::NotRead } else { SampleState::Read },
      view_state: ViewState::NotNew,
      disposed_generation_count: 0,
      no_writers_generation_count: 0,
    }
  }

  /// Deserializes into an owned `Sample<D>` rather than a caller-provided
  /// output buffer: idiomatic for an owning Rust API, unlike the C-style
  /// `read(void*, SampleInfo_t*)` this algorithm is adapted from.
  pub fn read_next_sample(&self) -> ReadResult<Sample<D>> {
    let mut inner = self.lock();
    let (change, strength) = Self::deliver(&mut inner, false)?;
    // `deliver` only ever selects entries with `is_read == false`, so the
    // entry was necessarily unread up to this call.
    let data = if change.kind.has_payload() {
      let payload = change.serialized_payload.as_deref().unwrap_or(&[]);
      Some(self.type_support.deserialize(payload)?)
    } else {
      None
    };
    Ok(Sample {
      data,
      info: self.sample_info_for(&change, strength, true),
    })
  }

  pub fn take_next_sample(&self) -> ReadResult<Sample<D>> {
    let mut inner = self.lock();
    let (change, strength) = Self::deliver(&mut inner, true)?;
    let data = if change.kind.has_payload() {
      let payload = change.serialized_payload.as_deref().unwrap_or(&[]);
      Some(self.type_support.deserialize(payload)?)
    } else {
      None
    };
    Ok(Sample {
      data,
      info: self.sample_info_for(&change, strength, true),
    })
  }

  /// Metadata of the earliest untaken entry, without marking it read
  /// (spec §4.1 `get_first_untaken_info`).
  pub fn get_first_untaken_info(&self) -> ReadResult<SampleInfo> {
    let inner = self.lock();
    let next_for_writer = Self::lowest_unread_per_writer(&inner);
    for entry in inner.cache.iterate_in_order() {
      if entry.is_read {
        continue;
      }
      if next_for_writer.get(&entry.writer_guid) != Some(&entry.sequence_number) {
        continue;
      }
      if let Some(proxy) = inner.proxies.get(&entry.writer_guid) {
        if proxy.available_changes_max() >= entry.sequence_number {
          return Ok(self.sample_info_for(entry, Some(proxy.ownership_strength()), true));
        }
      }
    }
    Err(ReaderError::NoData)
  }

  pub fn wait_for_unread_message(&self, timeout: StdDuration) -> bool {
    let inner = self.lock();
    if inner.cache.unread_count() > 0 {
      return true;
    }
    let (guard, result) = self
      .unread_condvar
      .wait_timeout_while(inner, timeout, |inner| inner.cache.unread_count() == 0)
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    drop(guard);
    !result.timed_out()
  }

  // -- configuration ----------------------------------------------------

  pub fn update_times(&self, times: ReaderTimes) {
    let mut inner = self.lock();
    inner.times = times;
    let delay: StdDuration = times.heartbeat_response_delay.into();
    for proxy in inner.proxies.values_mut() {
      proxy.set_heartbeat_response_delay(delay);
    }
  }

  pub fn set_qos(&self, qos: QosPolicies) -> ReadResult<()> {
    let mut inner = self.lock();
    qos_compatibility::check_qos(&qos, inner.topic.kind)?;
    qos_compatibility::can_qos_be_updated(&inner.qos, &qos)?;
    inner.deadline.set_period(qos.deadline.0.into());
    inner.lifespan.set_lifespan(qos.lifespan.0.into());
    inner.cache.set_history(qos.history);
    inner.cache.set_resource_limits(qos.resource_limits);
    inner.qos = qos;
    Ok(())
  }

  pub fn qos(&self) -> QosPolicies {
    self.lock().qos
  }

  pub fn unread_count(&self) -> usize {
    self.lock().cache.unread_count()
  }

  pub fn get_requested_deadline_missed_status(&self) -> CountWithChange {
    let mut inner = self.lock();
    let status = CountWithChange::new(inner.requested_deadline_missed_total, inner.requested_deadline_missed_since_read);
    inner.requested_deadline_missed_since_read = 0;
    status
  }

  pub fn get_sample_lost_status(&self) -> CountWithChange {
    let mut inner = self.lock();
    let status = CountWithChange::new(inner.sample_lost_total, inner.sample_lost_since_read);
    inner.sample_lost_since_read = 0;
    status
  }

  pub fn get_liveliness_changed_status(&self) -> (CountWithChange, CountWithChange) {
    let inner = self.lock();
    (
      CountWithChange::new(inner.liveliness_alive_total, 0),
      CountWithChange::new(inner.liveliness_not_alive_total, 0),
    )
  }

  pub fn get_sample_rejected_status(&self) -> (CountWithChange, SampleRejectedStatusKind) {
    let mut inner = self.lock();
    let status = CountWithChange::new(inner.sample_rejected_total, inner.sample_rejected_since_read);
    inner.sample_rejected_since_read = 0;
    (status, inner.sample_rejected_last_reason)
  }

  /// Detaches the listener channel and rejects further matches so
  /// destruction is observer-free (spec §5 "Cancellation").
  pub fn disable(&self) {
    let mut inner = self.lock();
    inner.enabled = false;
    inner.proxies.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    qos::{History, QosPolicyBuilder, ResourceLimits},
    structure::{ChangeKind, Duration, EntityId, GuidPrefix, InstanceHandle},
    topic::TopicKind,
  };
  use chrono::Utc;

  struct Echo;
  impl TypeSupport<Vec<u8>> for Echo {
    fn deserialize(&self, bytes: &[u8]) -> ReadResult<Vec<u8>> {
      Ok(bytes.to_vec())
    }
  }

  fn writer_guid(n: u8) -> GUID {
    GUID::new(GuidPrefix::new([n; 12]), EntityId::new([0, 0, 0, 1]))
  }

  fn reader_guid() -> GUID {
    GUID::new(GuidPrefix::new([9; 12]), EntityId::new([0, 0, 0, 4]))
  }

  fn make_reader(qos: QosPolicies) -> StatefulReader<Vec<u8>, Echo> {
    let topic = TopicAttributes::new("t", "T", TopicKind::NoKey);
    StatefulReader::new(reader_guid(), topic, qos, ReaderTimes::default(), ReaderAttributes::default(), Echo)
      .expect("valid qos")
  }

  fn change(writer: GUID, seq: i64) -> CacheChange {
    CacheChange::new(
      writer,
      SequenceNumber::from(seq),
      ChangeKind::Alive,
      InstanceHandle::NIL,
      Some(Utc::now()),
      Some(bytes::Bytes::from(format!("payload-{seq}"))),
      Utc::now(),
    )
  }

  #[test]
  fn in_order_best_effort_delivers_three_then_no_data() {
    let reader = make_reader(QosPolicyBuilder::new().build());
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });

    for seq in 1..=3 {
      assert_eq!(reader.on_parsed_change(change(w, seq), w), SampleAcceptance::Accepted);
    }
    for seq in 1..=3 {
      let sample = reader.take_next_sample().unwrap();
      assert_eq!(sample.data, Some(format!("payload-{seq}").into_bytes()));
    }
    assert!(matches!(reader.take_next_sample(), Err(ReaderError::NoData)));
  }

  #[test]
  fn out_of_order_reliable_stalls_until_gap_fills() {
    let reader = make_reader(
      QosPolicyBuilder::new()
        .reliability(Reliability::Reliable { max_blocking_time: Duration::INFINITE })
        .build(),
    );
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });

    reader.on_parsed_change(change(w, 2), w);
    assert!(matches!(reader.take_next_sample(), Err(ReaderError::NoData)));

    reader.on_parsed_change(change(w, 1), w);
    let first = reader.take_next_sample().unwrap();
    assert_eq!(first.data, Some(b"payload-1".to_vec()));
    let second = reader.take_next_sample().unwrap();
    assert_eq!(second.data, Some(b"payload-2".to_vec()));
  }

  #[test]
  fn gap_lets_watermark_skip_undelivered_range() {
    let reader = make_reader(QosPolicyBuilder::new().build());
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });

    reader.on_parsed_change(change(w, 1), w);
    reader.on_heartbeat(w, SequenceNumber::from(1), SequenceNumber::from(3), true, true);
    let gap_list = SequenceNumberSet::from_range(SequenceNumber::from(2), SequenceNumber::from(3));
    reader.on_gap(w, SequenceNumber::from(2), &gap_list);

    let first = reader.take_next_sample().unwrap();
    assert_eq!(first.data, Some(b"payload-1".to_vec()));
    assert!(matches!(reader.get_first_untaken_info(), Err(ReaderError::NoData)));
  }

  #[test]
  fn keep_last_depth_two_keeps_only_newest_two() {
    let qos = QosPolicyBuilder::new().history(History::KeepLast { depth: 2 }).build();
    let reader = make_reader(qos);
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });

    for seq in 1..=3 {
      reader.on_parsed_change(change(w, seq), w);
    }
    let first = reader.take_next_sample().unwrap();
    assert_eq!(first.data, Some(b"payload-2".to_vec()));
    let second = reader.take_next_sample().unwrap();
    assert_eq!(second.data, Some(b"payload-3".to_vec()));
  }

  #[test]
  fn unmatch_with_pending_samples_garbage_collects_on_next_read() {
    let reader = make_reader(QosPolicyBuilder::new().build());
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });
    reader.on_parsed_change(change(w, 1), w);
    reader.on_parsed_change(change(w, 2), w);

    reader.match_writer_remove(w);
    assert!(matches!(reader.read_next_sample(), Err(ReaderError::NoData)));
    assert_eq!(reader.unread_count(), 0);
  }

  #[test]
  fn deadline_miss_reports_status() {
    let qos = QosPolicyBuilder::new()
      .deadline(crate::qos::Deadline(crate::structure::Duration::from_millis(50)))
      .build();
    let reader = make_reader(qos);
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });
    reader.on_parsed_change(change(w, 1), w);

    let later = Instant::now() + StdDuration::from_millis(100);
    reader.poll_timers(later);
    let status = reader.get_requested_deadline_missed_status();
    assert_eq!(status.count(), 1);
    assert_eq!(status.count_change(), 1);
  }

  #[test]
  fn resource_exhaustion_surfaces_sample_rejected_status() {
    let qos = QosPolicyBuilder::new()
      .resource_limits(ResourceLimits {
        max_samples: 1,
        max_instances: i32::MAX,
        max_samples_per_instance: i32::MAX,
      })
      .history(History::KeepAll)
      .build();
    let reader = make_reader(qos);
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });
    reader.on_parsed_change(change(w, 1), w);
    let outcome = reader.on_parsed_change(change(w, 2), w);
    assert_eq!(outcome, SampleAcceptance::Rejected(RejectReason::FullSamples));
    let (status, reason) = reader.get_sample_rejected_status();
    assert_eq!(status.count(), 1);
    assert_eq!(reason, SampleRejectedStatusKind::BySamplesLimit);
  }

  #[test]
  fn heartbeat_confirming_history_loss_reports_sample_lost() {
    let reader = make_reader(QosPolicyBuilder::new().build());
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });

    reader.on_parsed_change(change(w, 1), w);
    // Writer reports seq 2 and 3 were never received and are now gone.
    reader.on_heartbeat(w, SequenceNumber::from(4), SequenceNumber::from(4), true, true);
    let status = reader.get_sample_lost_status();
    assert_eq!(status.count(), 2);
  }

  #[test]
  fn liveliness_transition_on_heartbeat_reports_status() {
    let reader = make_reader(QosPolicyBuilder::new().build());
    let w = writer_guid(1);
    reader.match_writer_add(WriterProxyDescriptor { guid: w, qos: QosPolicies::default() });

    reader.on_heartbeat(w, SequenceNumber::from(1), SequenceNumber::ZERO, true, false);
    let (alive, not_alive) = reader.get_liveliness_changed_status();
    assert_eq!(alive.count(), 0);
    assert_eq!(not_alive.count(), 1);
  }
}
