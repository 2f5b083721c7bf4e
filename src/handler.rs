//! Trigger handler: create a fresh snapshot file and fill it.

use crate::config::DumpConfig;
use crate::context::ProcessContext;
use crate::error::{DumpError, Result};
use crate::snapshot::write_snapshot;
use crate::trigger::Trigger;
use crate::walker::walk;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Turns a trigger into one snapshot file.
#[derive(Debug, Clone, Default)]
pub struct TriggerHandler {
    config: DumpConfig,
}

impl TriggerHandler {
    /// A handler creating files as described by `config`.
    pub fn new(config: DumpConfig) -> Self {
        Self { config }
    }

    /// Handle one trigger. Failures are logged, never returned or raised.
    pub fn on_trigger(&self, ctx: &ProcessContext, trigger: Trigger) {
        self.report(trigger, self.dump(ctx));
    }

    /// Like [`on_trigger`](Self::on_trigger), writing through `wrap(file)`.
    pub fn on_trigger_through<W, F>(&self, ctx: &ProcessContext, trigger: Trigger, wrap: F)
    where
        W: Write,
        F: FnOnce(File) -> W,
    {
        self.report(trigger, self.dump_through(ctx, wrap));
    }

    /// Write one snapshot of `ctx`, returning the new file's path.
    ///
    /// On a write failure the partial file stays on disk. The file is closed
    /// on every path out of this function.
    pub fn dump(&self, ctx: &ProcessContext) -> Result<PathBuf> {
        self.dump_through(ctx, |file| file)
    }

    /// Write one snapshot through `wrap(file)`, where `file` is the freshly
    /// created target. The writer is dropped, and the file with it, before
    /// this returns.
    pub fn dump_through<W, F>(&self, ctx: &ProcessContext, wrap: F) -> Result<PathBuf>
    where
        W: Write,
        F: FnOnce(File) -> W,
    {
        let (file, path) = self.create_target()?;
        let mut out = wrap(file);
        let graph = ctx.active_graph();
        match write_snapshot(&mut out, ctx.descriptor(), ctx.accounting(), walk(graph.as_deref())) {
            Ok(()) => Ok(path),
            Err(source) => Err(DumpError::Write { path, source }),
        }
    }

    fn report(&self, trigger: Trigger, outcome: Result<PathBuf>) {
        match outcome {
            Ok(path) => {
                tracing::info!(code = trigger.code, path = %path.display(), "metrics snapshot written");
            }
            Err(err) => {
                tracing::error!(code = trigger.code, error = %err, "metrics snapshot failed");
            }
        }
    }

    // Exclusive creation: the name did not exist before and belongs to this
    // call. The file is persisted at once so a failed dump leaves it behind.
    fn create_target(&self) -> Result<(File, PathBuf)> {
        let create_err = |source| DumpError::Create {
            dir: self.config.dir.clone(),
            source,
        };
        let temp = tempfile::Builder::new()
            .prefix(&self.config.prefix)
            .rand_bytes(self.config.rand_len)
            .tempfile_in(&self.config.dir)
            .map_err(create_err)?;
        temp.keep().map_err(|err| create_err(err.error))
    }
}
