//! OS signal delivery for dump triggers.
//!
//! The actual signal handler is signal-hook's self-pipe write, which is
//! async-signal-safe. A forwarder thread reads the pipe and hands each signal
//! to the dump worker as a [`Trigger`](crate::trigger::Trigger).

use crate::config::DumpConfig;
use crate::context::ProcessContext;
use crate::handler::TriggerHandler;
use crate::trigger::TriggerTx;
use crate::worker::Monitor;
use signal_hook::iterator::{Handle, Signals};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Signal that requests a snapshot by default.
pub const DUMP_SIGNAL: i32 = signal_hook::consts::signal::SIGUSR2;

/// Forwards registered signals to a dump worker until closed or dropped.
#[derive(Debug)]
pub struct SignalForwarder {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

/// Register `signals` and forward each delivery through `tx`.
pub fn forward_signals(signals: &[i32], mut tx: TriggerTx) -> io::Result<SignalForwarder> {
    let mut signals = Signals::new(signals)?;
    let handle = signals.handle();

    let thread = thread::Builder::new()
        .name("metrics-signal".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::debug!(signal, "dump signal received");
                if !tx.fire(signal) {
                    tracing::warn!(signal, "trigger queue full, dump request dropped");
                }
            }
            tracing::debug!("signal forwarder exiting");
        })?;

    Ok(SignalForwarder {
        handle,
        thread: Some(thread),
    })
}

impl SignalForwarder {
    /// Stop forwarding and wait for the forwarder thread.
    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("signal forwarder panicked");
            }
        }
    }
}

impl Drop for SignalForwarder {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start a dump worker for `ctx` and route [`DUMP_SIGNAL`] to it.
pub fn install(ctx: Arc<ProcessContext>, config: DumpConfig) -> io::Result<(Monitor, SignalForwarder)> {
    let (monitor, tx) = Monitor::spawn(ctx, TriggerHandler::new(config))?;
    let forwarder = forward_signals(&[DUMP_SIGNAL], tx)?;
    tracing::info!(signal = DUMP_SIGNAL, "metrics dump signal installed");
    Ok((monitor, forwarder))
}
