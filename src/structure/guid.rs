use std::fmt;

use serde::{Deserialize, Serialize};

/// The 12-byte prefix shared by every entity belonging to the same
/// Participant.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GuidPrefix(pub [u8; 12]);

impl GuidPrefix {
  pub const UNKNOWN: GuidPrefix = GuidPrefix([0; 12]);

  pub fn new(bytes: [u8; 12]) -> Self {
    GuidPrefix(bytes)
  }
}

impl fmt::Debug for GuidPrefix {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "GuidPrefix(")?;
    for b in self.0 {
      write!(f, "{b:02x}")?;
    }
    write!(f, ")")
  }
}

/// The 4-byte suffix identifying one entity (reader, writer, participant)
/// within its Participant.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub [u8; 4]);

impl EntityId {
  pub const UNKNOWN: EntityId = EntityId([0x00, 0x00, 0x00, 0x00]);

  /// Well-known builtin entity id used by SEDP publication readers.
  /// Kept as an example of a "trusted" builtin id a StatefulReader can be
  /// configured to bypass proxy lookup for.
  pub const SEDP_BUILTIN_PUBLICATIONS_READER: EntityId = EntityId([0x00, 0x03, 0x00, 0xc7]);
  pub const SEDP_BUILTIN_PUBLICATIONS_WRITER: EntityId = EntityId([0x00, 0x03, 0x00, 0xc2]);

  pub fn new(bytes: [u8; 4]) -> Self {
    EntityId(bytes)
  }
}

impl fmt::Debug for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "EntityId(")?;
    for b in self.0 {
      write!(f, "{b:02x}")?;
    }
    write!(f, ")")
  }
}

/// Globally unique identifier of an RTPS entity: `GuidPrefix` + `EntityId`.
/// Equality is byte-exact; ordering is lexicographic on the concatenated
/// bytes (prefix first, then entity id), which is what the `Ord` derive
/// below gives us for free because `GuidPrefix` is compared before
/// `EntityId` is reached.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct GUID {
  pub prefix: GuidPrefix,
  pub entity_id: EntityId,
}

impl GUID {
  pub const UNKNOWN: GUID = GUID {
    prefix: GuidPrefix::UNKNOWN,
    entity_id: EntityId::UNKNOWN,
  };

  pub fn new(prefix: GuidPrefix, entity_id: EntityId) -> Self {
    GUID { prefix, entity_id }
  }
}

impl fmt::Display for GUID {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}:{:?}", self.prefix, self.entity_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn guid_ordering_is_lexicographic_on_bytes() {
    let a = GUID::new(GuidPrefix::new([0; 12]), EntityId::new([0, 0, 0, 1]));
    let b = GUID::new(GuidPrefix::new([0; 12]), EntityId::new([0, 0, 0, 2]));
    let c = GUID::new(GuidPrefix::new([1; 12]), EntityId::new([0, 0, 0, 0]));
    assert!(a < b);
    assert!(b < c);
  }

  #[test]
  fn guid_equality_is_byte_exact() {
    let a = GUID::new(GuidPrefix::new([3; 12]), EntityId::new([1, 2, 3, 4]));
    let b = GUID::new(GuidPrefix::new([3; 12]), EntityId::new([1, 2, 3, 4]));
    assert_eq!(a, b);
  }
}
