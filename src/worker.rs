//! Dedicated dump worker.
//!
//! Trigger sources never dump themselves: they push onto the trigger queue
//! and unpark this thread, which performs every file operation. Nothing a
//! signal interrupts can be holding a lock this thread needs.

use crate::context::ProcessContext;
use crate::handler::TriggerHandler;
use crate::trigger::{new_trigger_queue, TriggerTx};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Longest the worker sleeps without an unpark before rechecking the queue.
pub const IDLE_POLL: Duration = Duration::from_millis(250);

/// Handle to a running dump worker. Dropping it stops the worker.
#[derive(Debug)]
pub struct Monitor {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
struct Shared {
    shutdown: AtomicBool,
    handled: AtomicU64,
}

impl Monitor {
    /// Start a worker dumping `ctx` with `handler`.
    ///
    /// Returns the monitor and the single sender feeding it.
    pub fn spawn(ctx: Arc<ProcessContext>, handler: TriggerHandler) -> io::Result<(Self, TriggerTx)> {
        let (tx, mut rx) = new_trigger_queue();
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);

        let thread = thread::Builder::new()
            .name("metrics-dump".to_string())
            .spawn(move || {
                tracing::debug!("dump worker started");
                loop {
                    while let Ok(trigger) = rx.pop() {
                        handler.on_trigger(&ctx, trigger);
                        worker_shared.handled.fetch_add(1, Ordering::Release);
                    }
                    if worker_shared.shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    thread::park_timeout(IDLE_POLL);
                }
                tracing::debug!("dump worker exiting");
            })?;

        let sender = TriggerTx::new(tx, thread.thread().clone());
        Ok((
            Self {
                shared,
                thread: Some(thread),
            },
            sender,
        ))
    }

    /// Triggers handled so far, successful or not.
    pub fn handled(&self) -> u64 {
        self.shared.handled.load(Ordering::Acquire)
    }

    /// Block until at least `count` triggers were handled or `timeout` passes.
    /// Returns whether the count was reached.
    pub fn wait_handled(&self, count: u64, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while self.handled() < count {
            if std::time::Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        true
    }

    /// Stop the worker after it drains queued triggers, and wait for it.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.shared.shutdown.store(true, Ordering::Release);
            thread.thread().unpark();
            if thread.join().is_err() {
                tracing::error!("dump worker panicked");
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}
