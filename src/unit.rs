//! Operational units: named components whose operations are counted.

#![forbid(unsafe_code)]

use crate::counters::{AtomicCounterSet, CounterReading};
use crate::ops::{OpKind, OP_COUNT};
use std::sync::OnceLock;

/// A named component instance in a processing graph.
///
/// Units are shared (`Arc<Unit>`) between the graph that owns them, the call
/// sites that bump their counters, and any dump walking them. Nothing here
/// needs `&mut`.
#[derive(Debug)]
pub struct Unit {
    name: String,
    graph_id: OnceLock<u32>,
    counters: [AtomicCounterSet; OP_COUNT],
}

impl Unit {
    /// Create a unit that does not belong to any graph yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_graph_id(name, None)
    }

    pub(crate) fn with_graph_id(name: impl Into<String>, graph_id: Option<u32>) -> Self {
        Self {
            name: name.into(),
            graph_id: graph_id.map(OnceLock::from).unwrap_or_default(),
            counters: std::array::from_fn(|_| AtomicCounterSet::new()),
        }
    }

    /// The unit's identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the graph the unit belongs to, if any.
    pub fn graph_id(&self) -> Option<u32> {
        self.graph_id.get().copied()
    }

    /// Join graph `graph_id` unless the unit already belongs to one.
    /// Returns the id the unit ends up with.
    pub(crate) fn adopt(&self, graph_id: u32) -> u32 {
        *self.graph_id.get_or_init(|| graph_id)
    }

    /// Counters for one operation kind.
    #[inline]
    pub fn counters(&self, op: OpKind) -> &AtomicCounterSet {
        &self.counters[op.index()]
    }

    /// One atomic load per field for `op`.
    #[inline]
    pub fn read(&self, op: OpKind) -> CounterReading {
        self.counters(op).read()
    }
}
