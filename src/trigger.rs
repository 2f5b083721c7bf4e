//! Trigger events and the lock-free handoff to the dump worker.
//!
//! Triggers travel through a fixed-capacity SPSC queue: pushing never blocks
//! or allocates, and a full queue drops the trigger rather than stall the
//! sender.

use rtrb::{Consumer, Producer, RingBuffer};
use std::thread::Thread;

/// Capacity of the trigger queue. Triggers beyond this between two worker
/// wake-ups are dropped.
pub const TRIGGER_QUEUE_CAPACITY: usize = 64;

/// Code used for triggers that do not come from a signal.
pub const MANUAL_TRIGGER: i32 = 0;

/// A request for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    /// Identifies the source: a signal number, or [`MANUAL_TRIGGER`].
    pub code: i32,
}

impl Trigger {
    /// A trigger carrying `code`.
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    /// A trigger not tied to any signal.
    pub const fn manual() -> Self {
        Self::new(MANUAL_TRIGGER)
    }
}

/// Creates a new trigger queue pair.
///
/// Returns (producer for the trigger source, consumer for the worker).
pub fn new_trigger_queue() -> (Producer<Trigger>, Consumer<Trigger>) {
    RingBuffer::new(TRIGGER_QUEUE_CAPACITY)
}

/// Sending side of the handoff: pushes a trigger and wakes the worker.
#[derive(Debug)]
pub struct TriggerTx {
    tx: Producer<Trigger>,
    worker: Thread,
}

impl TriggerTx {
    pub(crate) fn new(tx: Producer<Trigger>, worker: Thread) -> Self {
        Self { tx, worker }
    }

    /// Queue a trigger with `code`. Returns false if the queue was full and
    /// the trigger was dropped.
    pub fn fire(&mut self, code: i32) -> bool {
        let queued = self.tx.push(Trigger::new(code)).is_ok();
        self.worker.unpark();
        queued
    }

    /// True once the worker has gone away.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_abandoned()
    }
}
