//! DDS-facing types that sit above the RTPS protocol machinery: status
//! events (kept from the teacher, see [`statusevents`]) and the
//! `SampleInfo`/`Sample` records handed back from `read`/`take` (spec §6
//! "External Interfaces").

pub mod sample;
pub mod sample_info;
pub mod statusevents;

pub use sample::Sample;
pub use sample_info::{InstanceState, SampleInfo, SampleState, ViewState};
pub use statusevents::{CountWithChange, DataReaderStatus, SampleRejectedStatusKind};
