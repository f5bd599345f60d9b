// Describe the communication status changes as events.
//
// This implements a mechanism equivalent to what is described in
// Section 2.2.4 Listeners, Conditions, and Wait-sets of the DDS
// specification, trimmed to the statuses a StatefulReader can raise.
//
// Status changes are produced by the reader while its endpoint lock is
// held, then handed off through this channel so that listener callbacks
// and async consumers run *outside* that lock (spec §5).
use std::{
  pin::Pin,
  sync::{mpsc, Arc, Mutex},
  task::{Context, Poll, Waker},
};

#[allow(unused_imports)]
use log::{trace, warn};
use futures::stream::{FusedStream, Stream};

use crate::{qos::QosPolicyId, structure::GUID};

/// This trait corresponds to `set_listener()` of the `Entity` class in the
/// DDS spec. Types implementing this trait can be polled, synchronously or
/// asynchronously, for status events.
pub trait StatusEvented<'a, E, S>
where
  S: Stream<Item = E>,
  S: FusedStream,
{
  fn as_async_status_stream(&'a self) -> S;
  fn try_recv_status(&self) -> Option<E>;
}

/// Builds a bounded channel for shipping status events from the reader's
/// locked core out to listeners/conditions. `capacity` bounds how many
/// unconsumed events may queue up; once full, `try_send` drops the newest
/// event rather than blocking the reader.
pub(crate) fn sync_status_channel<T>(capacity: usize) -> (StatusChannelSender<T>, StatusChannelReceiver<T>) {
  let (actual_sender, actual_receiver) = mpsc::sync_channel(capacity.max(1));
  let waker = Arc::new(Mutex::new(None));
  (
    StatusChannelSender {
      actual_sender,
      waker: Arc::clone(&waker),
    },
    StatusChannelReceiver {
      actual_receiver: Mutex::new(actual_receiver),
      waker,
    },
  )
}

#[derive(Clone)]
pub struct StatusChannelSender<T> {
  actual_sender: mpsc::SyncSender<T>,
  waker: Arc<Mutex<Option<Waker>>>,
}

pub struct StatusChannelReceiver<T> {
  actual_receiver: Mutex<mpsc::Receiver<T>>,
  waker: Arc<Mutex<Option<Waker>>>,
}

impl<T> StatusChannelSender<T> {
  /// Best-effort send. If the channel is full or there is no receiver, this
  /// fails silently: no-one is required to be listening to status events.
  pub fn try_send(&self, t: T) {
    let mut w = self.waker.lock().unwrap();
    match self.actual_sender.try_send(t) {
      Ok(()) => (),
      Err(mpsc::TrySendError::Full(_)) => {
        trace!("StatusChannelSender cannot send new status, channel is full");
      }
      Err(mpsc::TrySendError::Disconnected(_)) => {
        trace!("StatusChannelSender has no receiver");
      }
    }
    if let Some(waker) = w.take() {
      waker.wake();
    }
  }
}

impl<T> StatusChannelReceiver<T> {
  pub fn try_recv(&self) -> Result<T, mpsc::TryRecvError> {
    self.actual_receiver.lock().unwrap().try_recv()
  }

  fn get_waker_update_lock(&self) -> std::sync::MutexGuard<'_, Option<Waker>> {
    self.waker.lock().unwrap()
  }
}

impl<'a, E> StatusEvented<'a, E, StatusReceiverStream<'a, E>> for StatusChannelReceiver<E> {
  fn as_async_status_stream(&'a self) -> StatusReceiverStream<'a, E> {
    StatusReceiverStream {
      sync_receiver: self,
      terminated: std::sync::atomic::AtomicBool::new(false),
    }
  }

  fn try_recv_status(&self) -> Option<E> {
    self.try_recv().ok()
  }
}

pub struct StatusReceiverStream<'a, T> {
  sync_receiver: &'a StatusChannelReceiver<T>,
  terminated: std::sync::atomic::AtomicBool,
}

impl<T> Stream for StatusReceiverStream<'_, T> {
  type Item = T;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let mut w = self.sync_receiver.get_waker_update_lock();
    match self.sync_receiver.try_recv() {
      Err(mpsc::TryRecvError::Empty) => {
        *w = Some(cx.waker().clone());
        Poll::Pending
      }
      Err(mpsc::TryRecvError::Disconnected) => {
        self
          .terminated
          .store(true, std::sync::atomic::Ordering::SeqCst);
        warn!("StatusChannelReceiver: sender disconnected");
        Poll::Ready(None)
      }
      Ok(t) => Poll::Ready(Some(t)),
    }
  }
}

impl<T> FusedStream for StatusReceiverStream<'_, T> {
  fn is_terminated(&self) -> bool {
    self.terminated.load(std::sync::atomic::Ordering::SeqCst)
  }
}

/// Statuses a `StatefulReader`/`DataReader` can raise. Writer- and
/// participant-level statuses are out of scope for this crate (spec
/// Non-goals: discovery and the writer side are not modeled).
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DataReaderStatus {
  /// A sample was rejected because a resource limit would have been
  /// exceeded.
  SampleRejected {
    count: CountWithChange,
    last_reason: SampleRejectedStatusKind,
  },
  /// A matched writer has become alive or inactive.
  LivelinessChanged {
    alive_total: CountWithChange,
    not_alive_total: CountWithChange,
    writer: GUID,
  },
  /// A deadline period elapsed with no fresh sample for some instance.
  RequestedDeadlineMissed { count: CountWithChange },
  /// This reader's requested QoS is incompatible with what a matched
  /// writer offers.
  RequestedIncompatibleQos {
    count: CountWithChange,
    last_policy_id: QosPolicyId,
    writer: GUID,
  },
  /// A sample was determined to be unrecoverably lost (skipped-ahead
  /// sequence number for BEST_EFFORT, or a HEARTBEAT/GAP confirming loss
  /// for RELIABLE).
  SampleLost { count: CountWithChange },
  /// The set of matched writers changed.
  SubscriptionMatched {
    total: CountWithChange,
    current: CountWithChange,
    writer: GUID,
  },
}

/// Helper carrying both a cumulative count and the change since the status
/// was last read, matching every `*Status` struct in the DDS spec.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CountWithChange {
  count: i32,
  count_change: i32,
}

impl CountWithChange {
  pub fn new(count: i32, count_change: i32) -> Self {
    Self { count, count_change }
  }

  pub fn count(&self) -> i32 {
    self.count
  }

  pub fn count_change(&self) -> i32 {
    self.count_change
  }
}

/// Numeric values match the DDS `SampleRejectedStatusKind` IDL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde_repr::Serialize_repr, serde_repr::Deserialize_repr)]
#[repr(u8)]
pub enum SampleRejectedStatusKind {
  NotRejected = 0,
  ByInstancesLimit = 1,
  BySamplesLimit = 2,
  BySamplesPerInstanceLimit = 3,
}
