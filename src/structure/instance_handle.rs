use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque 16-byte key identifying an instance of a WITH_KEY topic. NO_KEY
/// topics collapse all samples onto [`InstanceHandle::NIL`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceHandle([u8; 16]);

impl InstanceHandle {
  pub const NIL: InstanceHandle = InstanceHandle([0; 16]);

  pub fn new(bytes: [u8; 16]) -> Self {
    InstanceHandle(bytes)
  }

  pub fn is_nil(self) -> bool {
    self == Self::NIL
  }
}

impl fmt::Debug for InstanceHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_nil() {
      return write!(f, "InstanceHandle(NIL)");
    }
    write!(f, "InstanceHandle(")?;
    for b in self.0 {
      write!(f, "{b:02x}")?;
    }
    write!(f, ")")
  }
}
