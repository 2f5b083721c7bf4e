//! Builder API for graphs: units chained in the order they are added.

use crate::graph::{Graph, GraphError, UnitId};
use crate::unit::Unit;
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to a unit in the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitHandle(pub UnitId);

/// Builds a graph whose walk order is insertion order.
///
/// The first unit added becomes the top; every later unit is linked after the
/// previous one.
#[derive(Debug)]
pub struct GraphBuilder {
    graph: Graph,
    last: Option<UnitId>,
    names: HashMap<String, UnitId>,
}

impl GraphBuilder {
    /// Create a builder for a graph with the given id.
    pub fn new(graph_id: u32) -> Self {
        Self {
            graph: Graph::new(graph_id),
            last: None,
            names: HashMap::new(),
        }
    }

    /// Append a new unit to the chain.
    pub fn unit(&mut self, name: &str) -> Result<UnitHandle, GraphError> {
        let id = self.graph.add_unit(name);
        self.append(name, id)
    }

    /// Append an existing unit to the chain.
    pub fn attach(&mut self, unit: Arc<Unit>) -> Result<UnitHandle, GraphError> {
        let name = unit.name().to_owned();
        let id = self.graph.attach(unit);
        self.append(&name, id)
    }

    /// Find a unit by name. With duplicate names the latest wins.
    pub fn lookup(&self, name: &str) -> Option<UnitHandle> {
        self.names.get(name).copied().map(UnitHandle)
    }

    /// Shared handle to a unit's counters, for wiring call sites.
    pub fn shared(&self, handle: UnitHandle) -> Option<Arc<Unit>> {
        self.graph.unit(handle.0).cloned()
    }

    /// Build the graph.
    pub fn build(self) -> Graph {
        self.graph
    }

    fn append(&mut self, name: &str, id: UnitId) -> Result<UnitHandle, GraphError> {
        match self.last {
            Some(prev) => self.graph.link(prev, id)?,
            None => self.graph.set_top(id)?,
        }
        self.last = Some(id);
        self.names.insert(name.to_owned(), id);
        Ok(UnitHandle(id))
    }
}
