//! The RTPS-facing reader core: per-writer protocol state, the reader's
//! history cache, its timers, and the `StatefulReader` that ties them
//! together (spec §4).

pub mod deadline_tracker;
pub mod history_cache;
pub mod lifespan_sweeper;
pub mod stateful_reader;
pub mod writer_proxy;

pub use deadline_tracker::DeadlineTracker;
pub use history_cache::{RejectReason, ReaderHistoryCache};
pub use lifespan_sweeper::LifespanSweeper;
pub use stateful_reader::{SampleAcceptance, StatefulReader};
pub use writer_proxy::{WriterProxy, WriterProxyDescriptor};
