//! The non-QoS configuration surface of a `StatefulReader` (spec §6's
//! "Configuration" table, minus the fields already modeled by
//! [`crate::qos::QosPolicies`] and [`crate::topic::TopicAttributes`]).

use serde::{Deserialize, Serialize};

use crate::structure::{Duration, EntityId};

/// Timing knobs that affect protocol-level scheduling rather than sample
/// acceptance. Mirrors the teacher's `dds::qos::policy` split between QoS
/// policies proper and the RTPS `Times` struct passed down from
/// `SubscriberAttributes`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ReaderTimes {
  /// Upper bound on the random jitter before a WriterProxy emits an
  /// ACKNACK in response to a HEARTBEAT (spec §4.2).
  pub heartbeat_response_delay: Duration,
}

impl Default for ReaderTimes {
  fn default() -> Self {
    ReaderTimes {
      heartbeat_response_delay: Duration::from_millis(500),
    }
  }
}

/// Reader-level switches that are neither QoS nor timing: how the
/// acceptance algorithm treats unmatched writers (spec §4.1.1).
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ReaderAttributes {
  /// Whether submessages carry inline QoS. Consulted by the (external)
  /// decoder; kept here only because it is part of the reader's
  /// configuration surface per spec §6.
  pub expects_inline_qos: bool,
  /// `acceptMessagesFromUnknownWriters`: if true, changes from an
  /// unmatched writer are silently dropped instead of rejected outright.
  /// Either way they never reach the cache.
  pub accept_from_unknown: bool,
  /// `trustedWriterEntityId`: an entity id that bypasses proxy lookup
  /// entirely, e.g. for builtin SEDP endpoints that this crate does not
  /// run discovery for.
  pub trusted_writer_entity_id: Option<EntityId>,
}

impl Default for ReaderAttributes {
  fn default() -> Self {
    ReaderAttributes {
      expects_inline_qos: false,
      accept_from_unknown: false,
      trusted_writer_entity_id: None,
    }
  }
}
