use super::sequence_number::SequenceNumber;

/// Status of a single sequence number inside a [`WriterProxy`](crate::rtps::writer_proxy::WriterProxy).
///
/// See spec §4.2 for the full state-transition table. `Missing` becomes
/// `Received` once data arrives, `Irrelevant` once a GAP covers it, or
/// `Lost` if the writer gives up on it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ChangeFromWriterStatus {
  Unknown,
  Missing,
  Received,
  Irrelevant,
  Lost,
}

/// One entry in a WriterProxy's ordered sequence-number ledger.
///
/// `valid` tracks whether the entry still matters for watermark
/// bookkeeping; an entry is marked invalid once its cache-side CacheChange
/// has been removed (taken, evicted, expired) but the entry itself must be
/// retained until `lastRemovedSeqNum` advances past it (invariant 4).
#[derive(Copy, Clone, Debug)]
pub struct ChangeFromWriter {
  pub seq_num: SequenceNumber,
  pub status: ChangeFromWriterStatus,
  pub valid: bool,
}

impl ChangeFromWriter {
  pub fn new(seq_num: SequenceNumber, status: ChangeFromWriterStatus) -> Self {
    ChangeFromWriter {
      seq_num,
      status,
      valid: true,
    }
  }

  pub fn is_settled(&self) -> bool {
    matches!(
      self.status,
      ChangeFromWriterStatus::Received | ChangeFromWriterStatus::Irrelevant | ChangeFromWriterStatus::Lost
    )
  }
}
