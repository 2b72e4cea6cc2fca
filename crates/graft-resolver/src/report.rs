//! Reporting of dependencies no provider could resolve.

use std::fmt;

use graft_core::library::LibraryRange;

use crate::graph::DependencyGraph;

/// Every rejected node of a walked graph.
#[derive(Debug, Default)]
pub struct UnresolvedReport {
    pub entries: Vec<UnresolvedDependency>,
}

/// A request that stayed unresolved, with the path that led to it.
#[derive(Debug, Clone)]
pub struct UnresolvedDependency {
    pub requested: LibraryRange,
    /// `Root -> ... -> Name`
    pub chain: String,
}

impl UnresolvedReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the rejected nodes of `graph` in discovery order.
    pub fn from_graph<T>(graph: &DependencyGraph<T>) -> Self {
        let entries = graph
            .rejected()
            .into_iter()
            .map(|idx| {
                let requested = graph.node(idx).key.clone();
                let chain = match graph.outer_node(idx) {
                    Some(outer) => graph.chain(outer, &requested.name),
                    None => requested.name.clone(),
                };
                UnresolvedDependency { requested, chain }
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for UnresolvedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "All dependencies resolved.");
        }
        writeln!(f, "Unresolved dependencies ({}):", self.entries.len())?;
        for entry in &self.entries {
            writeln!(f, "  {entry}")?;
        }
        Ok(())
    }
}

impl fmt::Display for UnresolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.requested, self.chain)
    }
}
