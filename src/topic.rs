//! Topic identity. The reader core does not implement Discovery, so a topic
//! is just the name/type-name/kind triple a `StatefulReader` is configured
//! against (spec §3, §9's Non-goals).

use serde::{Deserialize, Serialize};

/// Whether samples on this topic are keyed (WITH_KEY, instances
/// distinguished by key fields) or not (NO_KEY, a single implicit
/// instance).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TopicKind {
  NoKey,
  WithKey,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TopicAttributes {
  pub name: String,
  pub type_name: String,
  pub kind: TopicKind,
}

impl TopicAttributes {
  pub fn new(name: impl Into<String>, type_name: impl Into<String>, kind: TopicKind) -> Self {
    TopicAttributes {
      name: name.into(),
      type_name: type_name.into(),
      kind,
    }
  }
}
