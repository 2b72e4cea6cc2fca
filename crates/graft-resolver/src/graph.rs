//! Dependency tree produced by a walk.
//!
//! The tree is an arena backed by petgraph: every node lives in one
//! `DiGraph` and refers to its parent (outer node) and children (inner
//! nodes) by `NodeIndex`, so ancestor scans never hold owning references.
//! Resolved items are shared between nodes through `Arc`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use graft_core::library::{Library, LibraryRange};

/// Outcome of resolving a node's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Accepted,
    Rejected,
}

/// A resolved library shared by every node that resolved to it.
#[derive(Debug)]
pub struct GraphItem<T> {
    pub key: Library,
    pub data: T,
}

impl<T> GraphItem<T> {
    pub fn new(key: Library, data: T) -> Self {
        Self { key, data }
    }
}

/// A node in the dependency tree.
#[derive(Debug)]
pub struct GraphNode<T> {
    /// The request this node was created to satisfy.
    pub key: LibraryRange,
    /// `None` until resolved, and for good when no provider could resolve the key.
    pub item: Option<Arc<GraphItem<T>>>,
}

impl<T> GraphNode<T> {
    pub fn new(key: LibraryRange) -> Self {
        Self { key, item: None }
    }

    pub fn disposition(&self) -> Disposition {
        if self.item.is_some() {
            Disposition::Accepted
        } else {
            Disposition::Rejected
        }
    }
}

impl<T> fmt::Display for GraphNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item {
            Some(ref item) => write!(f, "{}", item.key),
            None => write!(f, "{} (unresolved)", self.key),
        }
    }
}

/// A rooted dependency tree.
#[derive(Debug)]
pub struct DependencyGraph<T> {
    graph: DiGraph<GraphNode<T>, ()>,
    root: NodeIndex,
}

impl<T> DependencyGraph<T> {
    /// Create a tree holding only the root node for `key`.
    pub fn new(key: LibraryRange) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(GraphNode::new(key));
        Self { graph, root }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Get the node data for an index.
    pub fn node(&self, idx: NodeIndex) -> &GraphNode<T> {
        &self.graph[idx]
    }

    pub(crate) fn set_item(&mut self, idx: NodeIndex, item: Option<Arc<GraphItem<T>>>) {
        self.graph[idx].item = item;
    }

    /// Append a new child for `key` under `outer`.
    pub fn add_inner(&mut self, outer: NodeIndex, key: LibraryRange) -> NodeIndex {
        let idx = self.graph.add_node(GraphNode::new(key));
        self.graph.add_edge(outer, idx, ());
        idx
    }

    /// The parent of a node; `None` for the root.
    pub fn outer_node(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|e| e.source())
    }

    /// Children of a node, in the order they were attached.
    pub fn inner_nodes(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// The node itself followed by each ancestor up to the root.
    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(Some(idx), move |&n| self.outer_node(n))
    }

    /// Render `root -> ... -> node -> tail` from key names.
    pub fn chain(&self, idx: NodeIndex, tail: &str) -> String {
        let mut names: Vec<&str> = self
            .ancestors(idx)
            .map(|n| self.graph[n].key.name.as_str())
            .collect();
        names.reverse();
        names.push(tail);
        names.join(" -> ")
    }

    /// Depth of a node; the root is at depth 0.
    pub fn depth(&self, idx: NodeIndex) -> usize {
        self.ancestors(idx).count() - 1
    }

    /// All node indices in creation order, root first.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Nodes whose key could not be resolved.
    pub fn rejected(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].disposition() == Disposition::Rejected)
            .collect()
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Print the dependency tree to a string.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = format!("{}\n", self.graph[self.root]);
        let children = self.inner_nodes(self.root);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(&mut output, child, "", i == count - 1, 1, max_depth);
        }
        output
    }

    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.inner_nodes(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(output, child, &child_prefix, i == count - 1, depth + 1, max_depth);
        }
    }

    /// Find the path from the root to the first node (in discovery order)
    /// whose key name matches `name`, case-insensitively.
    pub fn find_path(&self, name: &str) -> Option<Vec<&GraphNode<T>>> {
        let target = self
            .graph
            .node_indices()
            .find(|&idx| self.graph[idx].key.name.eq_ignore_ascii_case(name))?;
        let mut path: Vec<&GraphNode<T>> = self.ancestors(target).map(|n| &self.graph[n]).collect();
        path.reverse();
        Some(path)
    }

    /// Distinct identities resolved anywhere in the tree, in discovery order.
    pub fn resolved_libraries(&self) -> Vec<&Library> {
        let mut seen = HashSet::new();
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].item.as_ref())
            .map(|item| &item.key)
            .filter(|lib| seen.insert(*lib))
            .collect()
    }
}
