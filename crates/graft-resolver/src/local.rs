//! Synchronous walker over in-memory dependency providers.
//!
//! Nodes are visited in discovery order: the walk iterates the arena by
//! index while appending children to it, so every node at depth `n` is
//! expanded before any node at depth `n + 1`. A dependency is pruned when an
//! ancestor, or a child already attached to an ancestor, carries the same
//! name ("nearest wins"); it is an error when an ancestor's own key carries
//! the name (a cycle).

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use tracing::{debug, trace};

use graft_core::framework::Framework;
use graft_core::library::{Library, LibraryDependency, LibraryDescription, LibraryRange};
use graft_core::version::{PackageVersion, VersionRange};
use graft_util::errors::GraftError;

use crate::graph::{DependencyGraph, GraphItem};
use crate::provider::DependencyProvider;

type LocalItem = Arc<GraphItem<LibraryDescription>>;

/// Resolutions keyed by requested range and by resolved identity.
///
/// Fresh per walk by default; pass the same cache to several walks to share
/// items across a batch of roots.
#[derive(Debug, Default)]
pub struct LocalResolveCache {
    items: HashMap<LibraryRange, Option<LocalItem>>,
}

impl LocalResolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Builds dependency trees from synchronous providers.
pub struct DependencyWalker {
    providers: Vec<Arc<dyn DependencyProvider>>,
}

impl DependencyWalker {
    pub fn new(providers: Vec<Arc<dyn DependencyProvider>>) -> Self {
        Self { providers }
    }

    /// Walk the graph rooted at `name` pinned to `version`.
    pub fn walk(
        &self,
        name: &str,
        version: PackageVersion,
        framework: &Framework,
    ) -> miette::Result<DependencyGraph<LibraryDescription>> {
        let key = LibraryRange::new(name, Some(VersionRange::pinned(version)));
        self.walk_range(key, framework, &mut LocalResolveCache::new())
    }

    /// Walk the graph rooted at a resolved identity.
    pub fn walk_library(
        &self,
        library: &Library,
        framework: &Framework,
    ) -> miette::Result<DependencyGraph<LibraryDescription>> {
        self.walk_range(library.to_range(), framework, &mut LocalResolveCache::new())
    }

    /// Walk the graph rooted at `key`, resolving through `cache`.
    pub fn walk_range(
        &self,
        key: LibraryRange,
        framework: &Framework,
        cache: &mut LocalResolveCache,
    ) -> miette::Result<DependencyGraph<LibraryDescription>> {
        let mut graph = DependencyGraph::new(key);

        let mut cursor = 0;
        while cursor < graph.len() {
            let node = NodeIndex::new(cursor);
            cursor += 1;

            let key = graph.node(node).key.clone();
            let item = self.resolve(cache, &key, framework)?;
            graph.set_item(node, item.clone());

            let Some(item) = item else {
                debug!("rejected {key}: no provider resolved it");
                continue;
            };

            for dependency in &item.data.dependencies {
                if is_eclipsed(&graph, node, dependency)? {
                    trace!(
                        "{} eclipses {dependency} requested by {}",
                        dependency.name(),
                        item.key
                    );
                    continue;
                }
                graph.add_inner(node, dependency.library_range.clone());
            }
        }

        Ok(graph)
    }

    fn resolve(
        &self,
        cache: &mut LocalResolveCache,
        key: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<LocalItem>> {
        if let Some(item) = cache.items.get(key) {
            return Ok(item.clone());
        }

        let mut hit = None;
        for provider in &self.providers {
            if !provider.supports_type(key.library_type) {
                continue;
            }
            if let Some(description) = provider.get_description(key, framework)? {
                hit = Some(description);
                break;
            }
        }

        let Some(hit) = hit else {
            cache.items.insert(key.clone(), None);
            return Ok(None);
        };

        let identity_key = hit.identity.to_range();
        if let Some(Some(item)) = cache.items.get(&identity_key) {
            let item = item.clone();
            cache.items.insert(key.clone(), Some(item.clone()));
            return Ok(Some(item));
        }

        debug!("resolved {key} to {}", hit.identity);
        let item = Arc::new(GraphItem::new(hit.identity.clone(), hit));
        cache.items.insert(key.clone(), Some(item.clone()));
        cache.items.insert(identity_key, Some(item.clone()));
        Ok(Some(item))
    }
}

/// Scan `node` and its ancestors for a key that already covers `dependency`.
///
/// Fails when an ancestor on the path is the dependency itself.
fn is_eclipsed<T>(
    graph: &DependencyGraph<T>,
    node: NodeIndex,
    dependency: &LibraryDependency,
) -> miette::Result<bool> {
    for scan in graph.ancestors(node) {
        if graph.node(scan).key.is_eclipsed_by(&dependency.library_range) {
            return Err(GraftError::CircularDependency {
                chain: graph.chain(node, dependency.name()),
            }
            .into());
        }
        let sibling_covers = graph
            .inner_nodes(scan)
            .into_iter()
            .any(|side| graph.node(side).key.is_eclipsed_by(&dependency.library_range));
        if sibling_covers {
            return Ok(true);
        }
    }
    Ok(false)
}
