//! Type (de)serialization as a capability object, injected per reader
//! rather than looked up through a process-wide type registry (spec §9:
//! "Global registry" design note).

use crate::error::ReadResult;

/// A reader is generic over its sample type `D` and is handed one
/// `TypeSupport<D>` at construction time. Deserialization failures are
/// reported as [`crate::error::ReaderError::BadParameter`] rather than
/// panicking, since a malformed payload is attacker- or bug-reachable, not
/// an invariant violation.
///
/// Wire-level CDR decoding is out of scope for this crate (spec
/// Non-goals); a concrete `TypeSupport` impl is expected to wrap whatever
/// codec the transport layer uses.
pub trait TypeSupport<D> {
  fn deserialize(&self, bytes: &[u8]) -> ReadResult<D>;
}
