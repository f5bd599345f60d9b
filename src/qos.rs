//! QoS policy value types. Mirrors the builder idiom of the teacher crate
//! (`QosPolicyBuilder::new().history(...).reliability(...).build()`), trimmed
//! to the policies the stateful reader core actually consults (spec §3, §6).

use serde::{Deserialize, Serialize};

use crate::structure::Duration;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum History {
  KeepLast { depth: i32 },
  KeepAll,
}

impl Default for History {
  fn default() -> Self {
    History::KeepLast { depth: 1 }
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ResourceLimits {
  pub max_samples: i32,
  pub max_instances: i32,
  pub max_samples_per_instance: i32,
}

impl Default for ResourceLimits {
  fn default() -> Self {
    ResourceLimits {
      max_samples: i32::MAX,
      max_instances: i32::MAX,
      max_samples_per_instance: i32::MAX,
    }
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Reliability {
  BestEffort,
  Reliable { max_blocking_time: Duration },
}

impl Default for Reliability {
  fn default() -> Self {
    Reliability::BestEffort
  }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum OwnershipKind {
  Shared,
  Exclusive,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Ownership {
  pub kind: OwnershipKind,
  /// Only meaningful when `kind == Exclusive`.
  pub strength: i32,
}

impl Default for Ownership {
  fn default() -> Self {
    Ownership {
      kind: OwnershipKind::Shared,
      strength: 0,
    }
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Deadline(pub Duration);

impl Default for Deadline {
  fn default() -> Self {
    Deadline(Duration::INFINITE)
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Lifespan(pub Duration);

impl Default for Lifespan {
  fn default() -> Self {
    Lifespan(Duration::INFINITE)
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Liveliness {
  Automatic { lease_duration: Duration },
  ManualByParticipant { lease_duration: Duration },
  ManualByTopic { lease_duration: Duration },
}

impl Default for Liveliness {
  fn default() -> Self {
    Liveliness::Automatic {
      lease_duration: Duration::INFINITE,
    }
  }
}

/// Identifies a single policy for QoS-incompatibility reporting
/// (`RequestedIncompatibleQos{last_policy_id, ..}`, spec §6).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum QosPolicyId {
  History,
  ResourceLimits,
  Reliability,
  Ownership,
  Deadline,
  Lifespan,
  Liveliness,
}

/// The bundle of policies a StatefulReader is configured with. Every field
/// has a spec-defined default so a reader can be built incrementally with
/// [`QosPolicyBuilder`].
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct QosPolicies {
  pub history: History,
  pub resource_limits: ResourceLimits,
  pub reliability: Reliability,
  pub ownership: Ownership,
  pub deadline: Deadline,
  pub lifespan: Lifespan,
  pub liveliness: Liveliness,
}

impl Default for QosPolicies {
  fn default() -> Self {
    QosPolicies {
      history: History::default(),
      resource_limits: ResourceLimits::default(),
      reliability: Reliability::default(),
      ownership: Ownership::default(),
      deadline: Deadline::default(),
      lifespan: Lifespan::default(),
      liveliness: Liveliness::default(),
    }
  }
}

/// Implemented by types that carry a `QosPolicies` value, matching the
/// teacher's `HasQoSPolicy` trait used across `DataReader`/`DataWriter`.
pub trait HasQoSPolicy {
  fn qos(&self) -> QosPolicies;
}

/// Fluent builder, mirroring `rustdds::QosPolicyBuilder` (see
/// `demos/ddsperf`'s `.history(History::KeepLast{..}).reliability(..)`
/// chain in the teacher examples this crate was adapted from).
#[derive(Default, Clone)]
pub struct QosPolicyBuilder {
  qos: QosPolicies,
}

impl QosPolicyBuilder {
  pub fn new() -> Self {
    QosPolicyBuilder {
      qos: QosPolicies::default(),
    }
  }

  pub fn history(mut self, history: History) -> Self {
    self.qos.history = history;
    self
  }

  pub fn resource_limits(mut self, limits: ResourceLimits) -> Self {
    self.qos.resource_limits = limits;
    self
  }

  pub fn reliability(mut self, reliability: Reliability) -> Self {
    self.qos.reliability = reliability;
    self
  }

  pub fn ownership(mut self, ownership: Ownership) -> Self {
    self.qos.ownership = ownership;
    self
  }

  pub fn deadline(mut self, deadline: Deadline) -> Self {
    self.qos.deadline = deadline;
    self
  }

  pub fn lifespan(mut self, lifespan: Lifespan) -> Self {
    self.qos.lifespan = lifespan;
    self
  }

  pub fn liveliness(mut self, liveliness: Liveliness) -> Self {
    self.qos.liveliness = liveliness;
    self
  }

  pub fn build(self) -> QosPolicies {
    self.qos
  }
}
