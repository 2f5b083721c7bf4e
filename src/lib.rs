//! Signal-triggered metrics snapshots.
//!
//! A running process keeps lock-free counters per unit and operation kind
//! ([`unit::Unit`], [`counters::AtomicCounterSet`]) and, optionally,
//! process-wide allocation counters ([`accounting::MemoryAccounting`]). On a
//! trigger, the dump worker writes a point-in-time view of them to a freshly
//! created file, one `key value` pair per line:
//!
//! ```text
//! glusterfsd -s localhost --volfile-id demo
//! memory.total.calloc 12
//! ...
//! quick-read.3.READ.count 42
//! quick-read.3.READ.latency 1.500000
//! ```
//!
//! Trigger sources (signals via [`signal`], or [`trigger::TriggerTx::fire`])
//! only enqueue; all file I/O happens on the worker thread ([`worker`]).

pub mod accounting;
pub mod builder;
pub mod config;
pub mod context;
pub mod counters;
pub mod error;
pub mod format;
pub mod graph;
pub mod handler;
pub mod ops;
#[cfg(all(unix, feature = "signals"))]
pub mod signal;
pub mod snapshot;
pub mod trigger;
pub mod unit;
pub mod walker;
pub mod worker;

pub use config::DumpConfig;
pub use context::ProcessContext;
pub use error::DumpError;
pub use handler::TriggerHandler;
pub use ops::OpKind;
pub use worker::Monitor;
