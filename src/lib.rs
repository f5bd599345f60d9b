//! The stateful-reader core of an RTPS participant: writer proxies, the
//! reader-side history cache, deadline/lifespan timers, and the
//! `StatefulReader` that ties them together.
//!
//! This crate does not speak the wire protocol, run discovery, or own a
//! transport. It is handed already-parsed submessages (see
//! [`rtps::stateful_reader::StatefulReader::on_parsed_change`],
//! `on_heartbeat`, `on_gap`) and a [`type_support::TypeSupport`]
//! capability to deserialize payloads on demand; everything else
//! (locators, sockets, SEDP) is an external collaborator.

pub mod config;
pub mod dds;
pub mod error;
pub mod qos;
pub mod qos_compatibility;
pub mod rtps;
pub mod structure;
pub mod topic;
pub mod type_support;

pub use config::{ReaderAttributes, ReaderTimes};
pub use dds::{Sample, SampleInfo};
pub use error::{ReadResult, ReaderError};
pub use qos::{HasQoSPolicy, QosPolicies, QosPolicyBuilder};
pub use rtps::{SampleAcceptance, StatefulReader, WriterProxy, WriterProxyDescriptor};
pub use structure::{CacheChange, ChangeKind, InstanceHandle, SequenceNumber, GUID};
pub use topic::{TopicAttributes, TopicKind};
pub use type_support::TypeSupport;
