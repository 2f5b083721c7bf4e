//! Graph module: the active processing graph the dumper walks.
//!
//! A graph owns its units and a singly-linked `next` relation between them,
//! starting at a designated entry unit (`top`). Links are validated when they
//! are added, so the relation is always a set of acyclic chains and a walk
//! from `top` terminates without any cycle check of its own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use crate::unit::Unit;
use std::sync::Arc;
use thiserror::Error;

/// Index of a unit within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

/// A processing graph: units plus the `next` relation.
#[derive(Debug, Clone)]
pub struct Graph {
    id: u32,
    units: Vec<Arc<Unit>>,
    next: Vec<Option<UnitId>>,
    has_prev: Vec<bool>,
    top: Option<UnitId>,
}

/// Errors that can occur when building the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Unit does not exist.
    #[error("unit {0:?} does not exist")]
    InvalidUnit(UnitId),
    /// Source unit already has a successor.
    #[error("unit {0:?} already has a successor")]
    AlreadyLinked(UnitId),
    /// Target unit already has a predecessor.
    #[error("unit {0:?} already has a predecessor")]
    AlreadyTargeted(UnitId),
    /// Adding the link would close a loop.
    #[error("linking {from:?} -> {to:?} would create a cycle")]
    CycleDetected {
        /// Source of the rejected link.
        from: UnitId,
        /// Target of the rejected link.
        to: UnitId,
    },
}

impl Graph {
    /// Create an empty graph with the given id.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            units: Vec::new(),
            next: Vec::new(),
            has_prev: Vec::new(),
            top: None,
        }
    }

    /// The graph's id, as rendered in snapshot keys.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Create a unit owned by this graph.
    pub fn add_unit(&mut self, name: impl Into<String>) -> UnitId {
        self.attach(Arc::new(Unit::with_graph_id(name, Some(self.id))))
    }

    /// Add an existing unit. A unit not yet in any graph joins this one; a
    /// unit owned by another graph keeps that graph's id.
    pub fn attach(&mut self, unit: Arc<Unit>) -> UnitId {
        unit.adopt(self.id);
        let id = UnitId(self.units.len());
        self.units.push(unit);
        self.next.push(None);
        self.has_prev.push(false);
        id
    }

    /// Make `to` the successor of `from`.
    pub fn link(&mut self, from: UnitId, to: UnitId) -> Result<(), GraphError> {
        self.check(from)?;
        self.check(to)?;
        if self.next[from.0].is_some() {
            return Err(GraphError::AlreadyLinked(from));
        }
        if self.has_prev[to.0] {
            return Err(GraphError::AlreadyTargeted(to));
        }
        if self.reaches(to, from) {
            return Err(GraphError::CycleDetected { from, to });
        }
        self.next[from.0] = Some(to);
        self.has_prev[to.0] = true;
        Ok(())
    }

    /// Designate the entry unit walks start from.
    pub fn set_top(&mut self, id: UnitId) -> Result<(), GraphError> {
        self.check(id)?;
        self.top = Some(id);
        Ok(())
    }

    /// The entry unit, if one has been designated.
    pub fn top(&self) -> Option<UnitId> {
        self.top
    }

    /// Successor of `id`.
    pub fn next_of(&self, id: UnitId) -> Option<UnitId> {
        self.next.get(id.0).copied().flatten()
    }

    /// Look up a unit.
    pub fn unit(&self, id: UnitId) -> Option<&Arc<Unit>> {
        self.units.get(id.0)
    }

    /// Number of units, linked or not.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True if the graph has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn check(&self, id: UnitId) -> Result<(), GraphError> {
        if id.0 < self.units.len() {
            Ok(())
        } else {
            Err(GraphError::InvalidUnit(id))
        }
    }

    // Chains are acyclic before the new link, so this loop terminates.
    fn reaches(&self, start: UnitId, target: UnitId) -> bool {
        let mut current = Some(start);
        while let Some(id) = current {
            if id == target {
                return true;
            }
            current = self.next[id.0];
        }
        false
    }
}
