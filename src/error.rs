//! Error types returned by the reader core's public operations. Mirrors the
//! `thiserror`-derived error enums used throughout the teacher crate's `dds`
//! module, specialized to the outcomes a `StatefulReader` can report.

use thiserror::Error;

use crate::qos::QosPolicyId;

/// Failure modes for reader operations (spec §7).
#[derive(Error, Debug, Clone)]
pub enum ReaderError {
  /// A QoS change was requested for a policy that cannot be changed after
  /// the reader has been enabled (e.g. `history`, `resource_limits`).
  #[error("QoS policy {policy:?} is immutable after the reader is enabled")]
  ImmutablePolicy { policy: QosPolicyId },

  /// The requested QoS combination is self-contradictory (spec §4.6's
  /// self-check, e.g. `resource_limits.max_samples_per_instance >
  /// resource_limits.max_samples`).
  #[error("QoS policies are internally inconsistent: {reason}")]
  InconsistentPolicy { reason: String },

  /// The requested QoS is incompatible with the matched writer's offered
  /// QoS (spec §4.6's `request < offered` ordering).
  #[error("requested QoS policy {policy:?} is incompatible with writer {writer}'s offered QoS")]
  IncompatibleQos {
    policy: QosPolicyId,
    writer: crate::structure::GUID,
  },

  /// An operation's precondition was not met, e.g. taking a sample that
  /// was already taken, or removing a writer that was never matched.
  #[error("precondition not met: {reason}")]
  PreconditionNotMet { reason: String },

  /// A resource limit (`max_samples`, `max_instances`,
  /// `max_samples_per_instance`) would have been exceeded.
  #[error("resource limits would be exceeded: {reason}")]
  OutOfResources { reason: String },

  /// The entity this operation targets has already been deleted/disabled.
  #[error("entity has already been deleted")]
  AlreadyDeleted,

  /// A blocking wait (e.g. `wait_for_unread_message`) exceeded its deadline.
  #[error("operation timed out")]
  Timeout,

  /// `read`/`take` found nothing matching the requested sample/view/instance
  /// state mask. Not a failure, but distinguished from a real `Vec` so
  /// callers can tell "nothing yet" from "something went wrong".
  #[error("no data available")]
  NoData,

  /// An argument was out of its valid range (e.g. a negative `max_samples`).
  #[error("bad parameter: {reason}")]
  BadParameter { reason: String },
}

/// Result alias used throughout the reader core, mirroring the teacher's
/// `dds::result::ReadResult` pattern.
pub type ReadResult<T> = Result<T, ReaderError>;
