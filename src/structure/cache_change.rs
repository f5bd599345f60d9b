use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::{guid::GUID, instance_handle::InstanceHandle, sequence_number::SequenceNumber};

/// What a sample says about the lifetime of its instance. Numeric values
/// match the DDS `ChangeKind_t` IDL enum so this can round-trip through
/// config/snapshot serialization without a mapping table.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ChangeKind {
  Alive = 1,
  NotAliveDisposed = 2,
  NotAliveUnregistered = 3,
}

impl ChangeKind {
  pub fn has_payload(self) -> bool {
    matches!(self, ChangeKind::Alive)
  }
}

/// One sample as held by the reader-side history cache. Identity is
/// `(writer_guid, sequence_number)`; every field except `is_read` is
/// immutable once the change has been inserted into the cache.
#[derive(Clone, Debug)]
pub struct CacheChange {
  pub writer_guid: GUID,
  pub sequence_number: SequenceNumber,
  pub kind: ChangeKind,
  pub source_timestamp: Option<DateTime<Utc>>,
  pub instance_handle: InstanceHandle,
  /// Serialized sample bytes, handed to `TypeSupport::deserialize` on read.
  /// `None` for dispose/unregister changes, which carry no payload.
  pub serialized_payload: Option<Bytes>,
  pub is_read: bool,
  pub reception_timestamp: DateTime<Utc>,
}

impl CacheChange {
  pub fn new(
    writer_guid: GUID,
    sequence_number: SequenceNumber,
    kind: ChangeKind,
    instance_handle: InstanceHandle,
    source_timestamp: Option<DateTime<Utc>>,
    serialized_payload: Option<Bytes>,
    reception_timestamp: DateTime<Utc>,
  ) -> Self {
    CacheChange {
      writer_guid,
      sequence_number,
      kind,
      source_timestamp,
      instance_handle,
      serialized_payload,
      is_read: false,
      reception_timestamp,
    }
  }

  /// Identity key used by invariant 1: no two cache entries share this pair.
  pub fn identity(&self) -> (GUID, SequenceNumber) {
    (self.writer_guid, self.sequence_number)
  }
}
