//! Bounded FIFO of render snapshots, coupling compute to rendering
//!
//! The holder is the backpressure mechanism between the simulation and the
//! renderer: when the renderer falls behind, the runner fails to reserve a
//! slot and throttles. Every operation is non-blocking; capacity is
//! runtime-resizable without losing or reordering queues.

use std::sync::Mutex;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::error;

use orrery_body::Renderable;

/// One cycle's worth of render snapshots
///
/// Numbered monotonically at reservation time; consumers observe numbers
/// with no gaps and no reordering.
#[derive(Debug)]
pub struct ResultQueue {
    number: u64,
    snapshots: Vec<Renderable>,
}

impl ResultQueue {
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn push(&mut self, snapshot: Renderable) {
        self.snapshots.push(snapshot);
    }

    pub fn snapshots(&self) -> &[Renderable] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

struct Slots {
    tx: Sender<ResultQueue>,
    rx: Receiver<ResultQueue>,
    max: usize,
    next_number: u64,
}

/// Bounded, resizable holder of [`ResultQueue`]s
///
/// Single producer (the computation runner), any number of consumers.
/// Only one thread may interleave [`ResultQueueHolder::new_result_queue`]
/// and [`ResultQueueHolder::publish`]: the resize scheme reserves exactly
/// one slot beyond the buffered queues, enough for one outstanding
/// reservation.
///
/// # Examples
///
/// ```
/// use orrery_engine::ResultQueueHolder;
///
/// let holder = ResultQueueHolder::new(2);
/// let q = holder.new_result_queue().unwrap();
/// assert_eq!(q.number(), 0);
/// holder.publish(q);
///
/// let q = holder.next().unwrap();
/// assert_eq!(q.number(), 0);
/// assert!(holder.next().is_none());
/// ```
pub struct ResultQueueHolder {
    slots: Mutex<Slots>,
}

impl ResultQueueHolder {
    /// Creates a holder with room for `max` unconsumed queues
    pub fn new(max: usize) -> Self {
        let (tx, rx) = bounded(max);
        ResultQueueHolder {
            slots: Mutex::new(Slots {
                tx,
                rx,
                max,
                next_number: 0,
            }),
        }
    }

    /// Reserves the next queue, or `None` when the holder is full
    ///
    /// The caller must publish the returned queue (possibly empty) to keep
    /// consumer numbering gapless; on `None` it should back off briefly and
    /// retry.
    pub fn new_result_queue(&self) -> Option<ResultQueue> {
        let mut slots = self.slots.lock().unwrap();
        if slots.rx.len() >= slots.max {
            return None;
        }
        let number = slots.next_number;
        slots.next_number += 1;
        Some(ResultQueue {
            number,
            snapshots: Vec::new(),
        })
    }

    /// Publishes a reserved queue to consumers
    pub fn publish(&self, queue: ResultQueue) {
        let slots = self.slots.lock().unwrap();
        if slots.tx.try_send(queue).is_err() {
            // cannot happen while the single-producer contract holds: a
            // reservation always leaves one sendable slot, across resizes
            error!("result queue published without a reservation; dropped");
        }
    }

    /// Pops the oldest published queue, or `None` when empty
    pub fn next(&self) -> Option<ResultQueue> {
        let slots = self.slots.lock().unwrap();
        slots.rx.try_recv().ok()
    }

    /// Number of published, unconsumed queues
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current capacity
    pub fn capacity(&self) -> usize {
        self.slots.lock().unwrap().max
    }

    /// Atomically swaps in a new capacity, preserving buffered queues in
    /// order
    ///
    /// The replacement channel is sized `max(new_max, buffered + 1)`: the
    /// `+ 1` keeps a slot for a producer that reserved capacity in the old
    /// channel and has yet to publish. This is the sole reason publishes
    /// cannot race each other.
    pub fn resize(&self, new_max: usize) {
        let mut slots = self.slots.lock().unwrap();
        let buffered = slots.rx.len();
        let (tx, rx) = bounded(new_max.max(buffered + 1));
        while let Ok(q) = slots.rx.try_recv() {
            // transfer cannot overflow: the new channel is at least one
            // larger than what was buffered
            let _ = tx.send(q);
        }
        slots.tx = tx;
        slots.rx = rx;
        slots.max = new_max;
    }
}
