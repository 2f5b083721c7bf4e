//! Walker module: forward traversal of a graph from its entry unit.

use crate::graph::{Graph, UnitId};
use crate::unit::Unit;

/// Iterator over the units reachable from a graph's top via `next` links.
///
/// Finite because [`Graph::link`] never admits a cycle. Borrowing the graph
/// means the walk can neither free nor mutate units.
#[derive(Debug, Clone)]
pub struct GraphWalker<'a> {
    graph: Option<&'a Graph>,
    current: Option<UnitId>,
}

/// Walk `graph` from its top. `None`, or a graph without a top, yields nothing.
pub fn walk(graph: Option<&Graph>) -> GraphWalker<'_> {
    GraphWalker {
        current: graph.and_then(Graph::top),
        graph,
    }
}

impl<'a> Iterator for GraphWalker<'a> {
    type Item = &'a Unit;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph?;
        let id = self.current?;
        self.current = graph.next_of(id);
        graph.unit(id).map(|unit| &**unit)
    }
}

impl std::iter::FusedIterator for GraphWalker<'_> {}
