//! QoS self-checks and the reader/writer compatibility (RxO) check (spec
//! §4.3 "QoS self-check" and §4.6).

use crate::{
  error::{ReadResult, ReaderError},
  qos::{History, QosPolicies, QosPolicyId},
  topic::TopicKind,
};

/// Validates that `qos` is internally consistent for a reader on a topic
/// of the given kind. This is the "topic-level self-check" from spec
/// §4.3: it does not compare against any writer's offered QoS.
pub fn check_qos(qos: &QosPolicies, topic_kind: TopicKind) -> ReadResult<()> {
  let limits = qos.resource_limits;

  if topic_kind == TopicKind::WithKey && limits.max_samples_per_instance > limits.max_samples {
    return Err(ReaderError::InconsistentPolicy {
      reason: "resource_limits.max_samples_per_instance must not exceed max_samples".into(),
    });
  }

  if let History::KeepLast { depth } = qos.history {
    if depth <= 0 {
      return Err(ReaderError::InconsistentPolicy {
        reason: "history depth must be > 0 for KEEP_LAST".into(),
      });
    }
    if depth as i64 > limits.max_samples as i64 {
      return Err(ReaderError::InconsistentPolicy {
        reason: "history depth must not exceed resource_limits.max_samples".into(),
      });
    }
    if topic_kind == TopicKind::WithKey && depth as i64 > limits.max_samples_per_instance as i64 {
      return Err(ReaderError::InconsistentPolicy {
        reason: "history depth must not exceed resource_limits.max_samples_per_instance".into(),
      });
    }
  }

  // Under-provisioned resource limits are a warning in the source system,
  // not a hard failure: a KEEP_ALL reader with max_instances * per-instance
  // room above max_samples can still operate correctly, it just means the
  // per-instance ceiling is never the binding constraint.
  if topic_kind == TopicKind::WithKey
    && (limits.max_samples_per_instance as i64).saturating_mul(limits.max_instances as i64)
      > limits.max_samples as i64
  {
    log::warn!(
      "QoS resource_limits are under-provisioned: max_samples_per_instance * max_instances > max_samples"
    );
  }

  Ok(())
}

/// Policies that cannot change once a reader has been enabled, matching
/// the teacher's `HasQoSPolicy`-adjacent mutability table (spec §4.6).
fn is_immutable(id: QosPolicyId) -> bool {
  matches!(
    id,
    QosPolicyId::History | QosPolicyId::ResourceLimits | QosPolicyId::Reliability | QosPolicyId::Ownership
  )
}

/// Whether `to` is a legal QoS update from the currently-enabled `from`.
/// Mutable policies (deadline, lifespan, liveliness) may change freely;
/// immutable ones must be identical.
pub fn can_qos_be_updated(from: &QosPolicies, to: &QosPolicies) -> ReadResult<()> {
  if is_immutable(QosPolicyId::History) && from.history != to.history {
    return Err(ReaderError::ImmutablePolicy {
      policy: QosPolicyId::History,
    });
  }
  if is_immutable(QosPolicyId::ResourceLimits) && from.resource_limits != to.resource_limits {
    return Err(ReaderError::ImmutablePolicy {
      policy: QosPolicyId::ResourceLimits,
    });
  }
  if is_immutable(QosPolicyId::Reliability) && from.reliability != to.reliability {
    return Err(ReaderError::ImmutablePolicy {
      policy: QosPolicyId::Reliability,
    });
  }
  if is_immutable(QosPolicyId::Ownership) && from.ownership != to.ownership {
    return Err(ReaderError::ImmutablePolicy {
      policy: QosPolicyId::Ownership,
    });
  }
  Ok(())
}

/// RxO ("requested vs offered") compatibility check between this reader's
/// requested QoS and a candidate writer's offered QoS. Returns the first
/// incompatible policy found, if any.
///
/// Only the policies whose RxO ordering is well-defined for a reader are
/// checked here: `reliability` (offered must be >= requested) and
/// `ownership.kind` (must match exactly; EXCLUSIVE ownership has no
/// strength ordering at the compatibility-check stage, only at
/// arbitration time, which is out of scope for this crate).
pub fn is_compatible(requested: &QosPolicies, offered: &QosPolicies) -> Result<(), QosPolicyId> {
  use crate::qos::Reliability;
  let reliability_ok = matches!(
    (requested.reliability, offered.reliability),
    (Reliability::BestEffort, _) | (Reliability::Reliable { .. }, Reliability::Reliable { .. })
  );
  if !reliability_ok {
    return Err(QosPolicyId::Reliability);
  }

  if requested.ownership.kind != offered.ownership.kind {
    return Err(QosPolicyId::Ownership);
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::qos::{QosPolicyBuilder, Reliability};

  #[test]
  fn rejects_keep_last_depth_above_max_samples() {
    let qos = QosPolicyBuilder::new()
      .history(History::KeepLast { depth: 100 })
      .resource_limits(crate::qos::ResourceLimits {
        max_samples: 10,
        max_instances: 10,
        max_samples_per_instance: 10,
      })
      .build();
    assert!(check_qos(&qos, TopicKind::NoKey).is_err());
  }

  #[test]
  fn best_effort_reader_compatible_with_any_writer() {
    let requested = QosPolicyBuilder::new().reliability(Reliability::BestEffort).build();
    let offered = QosPolicyBuilder::new()
      .reliability(Reliability::Reliable {
        max_blocking_time: crate::structure::Duration::from_millis(100),
      })
      .build();
    assert!(is_compatible(&requested, &offered).is_ok());
  }

  #[test]
  fn reliable_reader_incompatible_with_best_effort_writer() {
    let requested = QosPolicyBuilder::new()
      .reliability(Reliability::Reliable {
        max_blocking_time: crate::structure::Duration::from_millis(100),
      })
      .build();
    let offered = QosPolicyBuilder::new().reliability(Reliability::BestEffort).build();
    assert_eq!(is_compatible(&requested, &offered), Err(QosPolicyId::Reliability));
  }
}
