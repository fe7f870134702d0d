//! Record dispatchers: fan records out from one producer to consumer queues.
//!
//! A producer pipeline hands each record to a [`RecordDispatcher`], which
//! routes it to one or more downstream queues; each queue is drained by a
//! consumer job reading through a
//! [`QueueRecordReader`](crate::reader::QueueRecordReader). Queues are plain
//! FIFOs built over `std::sync::mpsc`: bounded senders block when the queue
//! is full, which is the intended backpressure mechanism.
//!
//! Strategies:
//! - [`BroadcastRecordDispatcher`] — every queue gets every record.
//! - [`RoundRobinRecordDispatcher`] — `queues[counter % n]`, deterministic.
//! - [`RandomRecordDispatcher`] — uniform choice per dispatch.
//! - [`ContentBasedRecordDispatcher`] — first matching predicate wins, with
//!   an optional default queue.
//!
//! Poison rule, common to all strategies: a poison record is always
//! broadcast to every configured queue. Its purpose is to terminate every
//! consumer, so it must never be load-balanced.

use crate::error::BatchError;
use crate::record::{Payload, Record};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Sending half of a record queue.
///
/// Cloneable so that one queue can appear in several dispatcher routes.
#[derive(Clone)]
pub enum QueueSender<P> {
    /// Bounded sender: `send` blocks while the queue is at capacity.
    Bounded(SyncSender<Record<P>>),
    /// Unbounded sender: `send` never blocks.
    Unbounded(Sender<Record<P>>),
}

impl<P> QueueSender<P> {
    /// Put a record in the queue, blocking on a full bounded queue.
    ///
    /// Fails only when every receiving side has hung up.
    pub fn send(&self, record: Record<P>) -> Result<(), BatchError> {
        let disconnected = match self {
            Self::Bounded(tx) => tx.send(record).is_err(),
            Self::Unbounded(tx) => tx.send(record).is_err(),
        };
        if disconnected {
            return Err(BatchError::Dispatch(
                "target queue has no remaining consumer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Receiving half of a record queue. Owned by exactly one consumer.
pub struct QueueReceiver<P> {
    rx: Receiver<Record<P>>,
}

impl<P> QueueReceiver<P> {
    /// Receive the next record, waiting up to `timeout`.
    ///
    /// Returns `None` on timeout or when every producer has hung up; the
    /// caller decides what "no record" means (the queue reader treats it as
    /// end-of-stream).
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Record<P>> {
        match self.rx.recv_timeout(timeout) {
            Ok(record) => Some(record),
            Err(RecvTimeoutError::Timeout) => {
                debug!("queue receive timed out after {timeout:?}");
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Receive without waiting; `None` if the queue is currently empty.
    pub fn try_recv(&self) -> Option<Record<P>> {
        self.rx.try_recv().ok()
    }
}

/// Create a record queue. `capacity: Some(n)` bounds the queue at `n`
/// records; `None` makes it unbounded.
#[must_use]
pub fn record_queue<P>(capacity: Option<usize>) -> (QueueSender<P>, QueueReceiver<P>) {
    match capacity {
        Some(n) => {
            let (tx, rx) = mpsc::sync_channel(n);
            (QueueSender::Bounded(tx), QueueReceiver { rx })
        }
        None => {
            let (tx, rx) = mpsc::channel();
            (QueueSender::Unbounded(tx), QueueReceiver { rx })
        }
    }
}

/// Routes records from a producer to one or more consumer queues.
pub trait RecordDispatcher<P>: Send {
    /// Dispatch one record according to the active strategy.
    fn dispatch(&mut self, record: Record<P>) -> Result<(), BatchError>;
}

/// Copies each record to every target queue, in registration order.
pub struct BroadcastRecordDispatcher<P> {
    queues: Vec<QueueSender<P>>,
}

impl<P> BroadcastRecordDispatcher<P> {
    /// Create a broadcast dispatcher over `queues`.
    pub fn new(queues: Vec<QueueSender<P>>) -> Self {
        Self { queues }
    }
}

fn broadcast<P: Payload>(
    queues: &[QueueSender<P>],
    record: &Record<P>,
) -> Result<(), BatchError> {
    for queue in queues {
        queue.send(record.clone())?;
    }
    Ok(())
}

impl<P: Payload> RecordDispatcher<P> for BroadcastRecordDispatcher<P> {
    fn dispatch(&mut self, record: Record<P>) -> Result<(), BatchError> {
        broadcast(&self.queues, &record)
    }
}

/// Dispatches record `m` to `queues[m % n]`.
///
/// After `m` dispatches no two queue counts differ by more than one, and the
/// sequence of visited queue indices is deterministic given dispatch order.
pub struct RoundRobinRecordDispatcher<P> {
    queues: Vec<QueueSender<P>>,
    next: usize,
}

impl<P> RoundRobinRecordDispatcher<P> {
    /// Create a round-robin dispatcher over `queues`.
    pub fn new(queues: Vec<QueueSender<P>>) -> Self {
        Self { queues, next: 0 }
    }
}

impl<P: Payload> RecordDispatcher<P> for RoundRobinRecordDispatcher<P> {
    fn dispatch(&mut self, record: Record<P>) -> Result<(), BatchError> {
        if record.is_poison() {
            return broadcast(&self.queues, &record);
        }
        let index = self.next % self.queues.len();
        self.next = self.next.wrapping_add(1);
        self.queues[index].send(record)
    }
}

// SplitMix64 keeps the crate free of a PRNG dependency; uniformity in
// expectation is all the random strategy promises.
#[derive(Clone, Copy, Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    const fn next_u64(&mut self) -> u64 {
        let mut z = {
            self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            self.state
        };
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Dispatches each record to a uniformly random queue.
pub struct RandomRecordDispatcher<P> {
    queues: Vec<QueueSender<P>>,
    rng: SplitMix64,
}

impl<P> RandomRecordDispatcher<P> {
    /// Create a random dispatcher seeded from the wall clock.
    pub fn new(queues: Vec<QueueSender<P>>) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0x5EED, |d| d.as_nanos() as u64);
        Self::with_seed(queues, seed)
    }

    /// Create a random dispatcher with a fixed seed (deterministic runs).
    pub fn with_seed(queues: Vec<QueueSender<P>>, seed: u64) -> Self {
        Self {
            queues,
            rng: SplitMix64::new(seed),
        }
    }
}

impl<P: Payload> RecordDispatcher<P> for RandomRecordDispatcher<P> {
    fn dispatch(&mut self, record: Record<P>) -> Result<(), BatchError> {
        if record.is_poison() {
            return broadcast(&self.queues, &record);
        }
        let index = (self.rng.next_u64() % self.queues.len() as u64) as usize;
        self.queues[index].send(record)
    }
}

/// Predicate used by [`ContentBasedRecordDispatcher`] routes.
pub type RoutePredicate<P> = Box<dyn Fn(&Record<P>) -> bool + Send>;

/// Routes each record to the queue of the first matching predicate, in
/// registration order, falling back to an optional default queue.
pub struct ContentBasedRecordDispatcher<P> {
    routes: Vec<(RoutePredicate<P>, QueueSender<P>)>,
    default_queue: Option<QueueSender<P>>,
    all_queues: Vec<QueueSender<P>>,
}

impl<P> ContentBasedRecordDispatcher<P> {
    /// Create a dispatcher with no routes and no default queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            default_queue: None,
            all_queues: Vec::new(),
        }
    }

    /// Add a route: records matching `predicate` go to `queue`.
    #[must_use]
    pub fn route(
        mut self,
        predicate: impl Fn(&Record<P>) -> bool + Send + 'static,
        queue: QueueSender<P>,
    ) -> Self
    where
        P: Clone,
    {
        self.all_queues.push(queue.clone());
        self.routes.push((Box::new(predicate), queue));
        self
    }

    /// Set the queue receiving records that match no route predicate.
    #[must_use]
    pub fn default_route(mut self, queue: QueueSender<P>) -> Self
    where
        P: Clone,
    {
        self.all_queues.push(queue.clone());
        self.default_queue = Some(queue);
        self
    }
}

impl<P> Default for ContentBasedRecordDispatcher<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> RecordDispatcher<P> for ContentBasedRecordDispatcher<P> {
    fn dispatch(&mut self, record: Record<P>) -> Result<(), BatchError> {
        if record.is_poison() {
            return broadcast(&self.all_queues, &record);
        }
        for (predicate, queue) in &self.routes {
            if predicate(&record) {
                return queue.send(record);
            }
        }
        match &self.default_queue {
            Some(queue) => queue.send(record),
            None => Err(BatchError::Dispatch(format!(
                "no route matched {} and no default queue is configured",
                record.header()
            ))),
        }
    }
}
