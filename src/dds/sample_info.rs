//! `SampleInfo`: the metadata record accompanying every sample returned by
//! `read_next_sample`/`take_next_sample` (spec §6).

use chrono::{DateTime, Utc};

use crate::structure::{ChangeKind, GUID};

/// Whether the application has already consumed this particular
/// `CacheChange` via a prior `read` (a `take` always leaves no trace, so
/// this only matters for `read`).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SampleState {
  Read,
  NotRead,
}

/// Whether this is the first sample the reader has ever seen for this
/// instance (`New`) or a subsequent one (`NotNew`).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ViewState {
  New,
  NotNew,
}

/// The liveliness state of the instance this sample belongs to, as last
/// observed by this reader.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InstanceState {
  Alive,
  NotAliveDisposed,
  NotAliveNoWriters,
}

impl From<ChangeKind> for InstanceState {
  fn from(kind: ChangeKind) -> Self {
    match kind {
      ChangeKind::Alive => InstanceState::Alive,
      ChangeKind::NotAliveDisposed => InstanceState::NotAliveDisposed,
      ChangeKind::NotAliveUnregistered => InstanceState::NotAliveNoWriters,
    }
  }
}

/// Metadata returned alongside (or instead of, for dispose/unregister
/// changes) sample data. Field set matches spec §6's `SampleInfo record`.
#[derive(Clone, Debug)]
pub struct SampleInfo {
  pub instance_state: InstanceState,
  pub writer_guid: GUID,
  pub source_timestamp: Option<DateTime<Utc>>,
  pub reception_timestamp: DateTime<Utc>,
  pub instance_handle: crate::structure::InstanceHandle,
  /// Only meaningful when the reader's `ownership.kind` is `Exclusive`;
  /// the core surfaces it but leaves arbitration to the application
  /// (spec §4.1.2 "Ownership tie-break").
  pub ownership_strength: i32,
  /// `false` for `NOT_ALIVE_DISPOSED`/`NOT_ALIVE_UNREGISTERED` changes,
  /// which carry no payload to deserialize.
  pub valid_data: bool,
  pub sample_state: SampleState,
  pub view_state: ViewState,
  pub disposed_generation_count: i32,
  pub no_writers_generation_count: i32,
}
