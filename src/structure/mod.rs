//! Core identity and value types shared by the reader core: [`GUID`](guid::GUID),
//! [`SequenceNumber`](sequence_number::SequenceNumber), cache changes and their
//! per-writer bookkeeping.

pub mod cache_change;
pub mod change_from_writer;
pub mod duration;
pub mod guid;
pub mod instance_handle;
pub mod sequence_number;

pub use cache_change::{CacheChange, ChangeKind};
pub use change_from_writer::{ChangeFromWriter, ChangeFromWriterStatus};
pub use duration::Duration;
pub use guid::{EntityId, GuidPrefix, GUID};
pub use instance_handle::InstanceHandle;
pub use sequence_number::{SequenceNumber, SequenceNumberSet};
