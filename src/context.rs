//! Process-wide state a dump reads.

use crate::accounting::MemoryAccounting;
use crate::graph::Graph;
use parking_lot::RwLock;
use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything a trigger needs from the host process.
///
/// The active graph is swapped by whoever owns the graph lifecycle. A dump
/// takes its own `Arc` of the current graph under a momentary read lock and
/// walks it lock-free, so a concurrent swap never frees units mid-walk.
#[derive(Debug)]
pub struct ProcessContext {
    descriptor: String,
    active: RwLock<Option<Arc<Graph>>>,
    accounting: Option<&'static MemoryAccounting>,
    accounting_enabled: AtomicBool,
}

impl ProcessContext {
    /// A context with no active graph and no accounting registry.
    ///
    /// `descriptor` is the first line of every snapshot, typically the
    /// process command line.
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            active: RwLock::new(None),
            accounting: None,
            accounting_enabled: AtomicBool::new(false),
        }
    }

    /// A context describing this process by its command line.
    pub fn from_args() -> Self {
        Self::from_os_args(std::env::args_os())
    }

    /// A context whose descriptor is `args` joined by spaces. Arguments that
    /// are not valid Unicode are converted lossily.
    pub fn from_os_args(args: impl IntoIterator<Item = OsString>) -> Self {
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        Self::new(args.join(" "))
    }

    /// Attach the accounting registry and enable the accounting block.
    pub fn with_accounting(mut self, accounting: &'static MemoryAccounting) -> Self {
        self.accounting = Some(accounting);
        self.accounting_enabled = AtomicBool::new(true);
        self
    }

    /// The snapshot header line.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Make `graph` the active graph, returning the previous one.
    pub fn activate(&self, graph: Arc<Graph>) -> Option<Arc<Graph>> {
        self.active.write().replace(graph)
    }

    /// Clear the active graph, returning it.
    pub fn deactivate(&self) -> Option<Arc<Graph>> {
        self.active.write().take()
    }

    /// The currently active graph, if any.
    pub fn active_graph(&self) -> Option<Arc<Graph>> {
        self.active.read().clone()
    }

    /// Turn the accounting block on or off at runtime.
    ///
    /// Has no effect on output while no registry is attached.
    pub fn set_accounting_enabled(&self, enabled: bool) {
        self.accounting_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether the next dump includes the accounting block.
    pub fn accounting_enabled(&self) -> bool {
        self.accounting.is_some() && self.accounting_enabled.load(Ordering::Relaxed)
    }

    /// The registry to dump, or `None` when accounting is off.
    pub fn accounting(&self) -> Option<&'static MemoryAccounting> {
        if self.accounting_enabled() {
            self.accounting
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ACCT: MemoryAccounting = MemoryAccounting::new();

    #[test]
    fn accounting_flag_requires_registry() {
        let ctx = ProcessContext::new("cmd");
        ctx.set_accounting_enabled(true);
        assert!(!ctx.accounting_enabled());
        assert!(ctx.accounting().is_none());

        let ctx = ProcessContext::new("cmd").with_accounting(&ACCT);
        assert!(ctx.accounting().is_some());
        ctx.set_accounting_enabled(false);
        assert!(ctx.accounting().is_none());
    }

    #[test]
    fn descriptor_joins_arguments() {
        let ctx = ProcessContext::from_os_args(["glusterfsd", "-s", "localhost"].map(OsString::from));
        assert_eq!(ctx.descriptor(), "glusterfsd -s localhost");
        assert_eq!(ProcessContext::from_os_args(Vec::new()).descriptor(), "");
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_argument_is_replaced_not_fatal() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![
            OsString::from("glusterfsd"),
            OsString::from_vec(b"bad-\xff-arg".to_vec()),
        ];
        let ctx = ProcessContext::from_os_args(args);
        assert_eq!(ctx.descriptor(), "glusterfsd bad-\u{FFFD}-arg");
    }

    #[test]
    fn graph_swap_keeps_old_graph_alive_for_holders() {
        let ctx = ProcessContext::new("cmd");
        assert!(ctx.active_graph().is_none());
        ctx.activate(Arc::new(Graph::new(1)));
        let held = ctx.active_graph().unwrap();
        let previous = ctx.activate(Arc::new(Graph::new(2))).unwrap();
        assert_eq!(previous.id(), 1);
        assert_eq!(held.id(), 1);
        assert_eq!(ctx.active_graph().unwrap().id(), 2);
        assert_eq!(ctx.deactivate().unwrap().id(), 2);
        assert!(ctx.active_graph().is_none());
    }
}
