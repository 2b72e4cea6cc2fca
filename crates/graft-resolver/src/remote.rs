//! Asynchronous walker over project, local and remote providers.
//!
//! Resolutions are memoized per requested range in the walk context, so a
//! diamond dependency is looked up once even when both paths reach it
//! concurrently. Children of a node are resolved concurrently and attached in
//! declaration order.

use std::sync::Arc;

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use tracing::{debug, trace};

use graft_core::framework::Framework;
use graft_core::library::{Library, LibraryRange, LibraryType};
use graft_core::version::{PackageVersion, VersionRange};

use crate::context::{RemoteItem, RemoteWalkContext};
use crate::graph::{DependencyGraph, GraphItem};
use crate::provider::{RemoteDependencyProvider, RemoteResolveResult, SourcedMatch};
use crate::scope::WalkScope;

/// A resolved subtree, assembled into a [`DependencyGraph`] once complete.
struct Subtree {
    key: LibraryRange,
    item: Option<RemoteItem>,
    inner: Vec<Subtree>,
}

/// Builds dependency trees from asynchronous providers.
pub struct RemoteDependencyWalker {
    context: Arc<RemoteWalkContext>,
}

impl RemoteDependencyWalker {
    pub fn new(context: Arc<RemoteWalkContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RemoteWalkContext {
        &self.context
    }

    /// Walk the graph rooted at `name` pinned to `version`.
    pub async fn walk(
        &self,
        name: &str,
        version: PackageVersion,
        framework: &Framework,
    ) -> miette::Result<DependencyGraph<RemoteResolveResult>> {
        let key = LibraryRange::new(name, Some(VersionRange::pinned(version)));
        self.walk_range(key, framework).await
    }

    /// Walk the graph rooted at a resolved identity.
    pub async fn walk_library(
        &self,
        library: &Library,
        framework: &Framework,
    ) -> miette::Result<DependencyGraph<RemoteResolveResult>> {
        self.walk_range(library.to_range(), framework).await
    }

    pub async fn walk_range(
        &self,
        key: LibraryRange,
        framework: &Framework,
    ) -> miette::Result<DependencyGraph<RemoteResolveResult>> {
        let subtree = self.create_graph_node(key, framework, None).await?;
        let mut graph = DependencyGraph::new(subtree.key.clone());
        let root = graph.root();
        attach(&mut graph, root, subtree);
        Ok(graph)
    }

    fn create_graph_node<'a>(
        &'a self,
        key: LibraryRange,
        framework: &'a Framework,
        scope: Option<Arc<WalkScope>>,
    ) -> BoxFuture<'a, miette::Result<Subtree>> {
        async move {
            let Some(item) = self.find_library_cached(&key, framework).await? else {
                debug!("rejected {key}: no provider resolved it");
                return Ok(Subtree {
                    key,
                    item: None,
                    inner: Vec::new(),
                });
            };

            let dependencies = &item.data.dependencies;
            let mut children = Vec::with_capacity(dependencies.len());
            for (index, dependency) in dependencies.iter().enumerate() {
                if let Some(ref scope) = scope {
                    if !scope.allows(&item.key.name, dependency.name())? {
                        trace!("skipping {dependency} under {}: declared nearer the root", item.key);
                        continue;
                    }
                }
                let narrowed = WalkScope::narrow(scope.clone(), &item.key.name, dependencies, index);
                children.push(self.create_graph_node(
                    dependency.library_range.clone(),
                    framework,
                    Some(narrowed),
                ));
            }

            let inner = join_all(children)
                .await
                .into_iter()
                .collect::<miette::Result<Vec<_>>>()?;

            Ok(Subtree {
                key,
                item: Some(item),
                inner,
            })
        }
        .boxed()
    }

    async fn find_library_cached(
        &self,
        key: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<RemoteItem>> {
        let cell = self.context.find_library_cache.entry(key);
        let item = cell
            .get_or_try_init(|| self.find_library_entry(key, framework))
            .await?;
        Ok(item.clone())
    }

    /// Resolve `key` and share the item with every range landing on the same
    /// identity. Ranges other than the identity's own pinned range wait on the
    /// identity's cell, so concurrent aliases observe one item.
    async fn find_library_entry(
        &self,
        key: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<RemoteItem>> {
        let Some(matched) = self.find_library_match(key, framework).await? else {
            return Ok(None);
        };

        let identity_key = matched.library().to_range();
        if identity_key == *key {
            // Already inside this key's cell.
            return self.create_item(key, &matched, framework).await;
        }

        let cell = self.context.find_library_cache.entry(&identity_key);
        let shared = cell
            .get_or_try_init(|| self.create_item(key, &matched, framework))
            .await?;
        match shared {
            Some(item) => {
                trace!("{key} shares {}", item.key);
                Ok(Some(item.clone()))
            }
            None => self.create_item(key, &matched, framework).await,
        }
    }

    async fn create_item(
        &self,
        key: &LibraryRange,
        matched: &SourcedMatch,
        framework: &Framework,
    ) -> miette::Result<Option<RemoteItem>> {
        let dependencies = matched
            .provider
            .get_dependencies(&matched.remote_match, framework)
            .await?;
        debug!(
            "resolved {key} to {} from {}",
            matched.library(),
            matched.provider.source()
        );
        Ok(Some(Arc::new(GraphItem::new(
            matched.library().clone(),
            RemoteResolveResult {
                matched: matched.clone(),
                dependencies,
            },
        ))))
    }

    async fn find_library_match(
        &self,
        key: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<SourcedMatch>> {
        if let Some(project) = self.find_project_match(key, framework).await? {
            return Ok(Some(project));
        }

        let Some(range) = key.version_range.as_ref() else {
            return Ok(None);
        };
        if key.is_gac_or_framework_reference() {
            return Ok(None);
        }

        let local_providers = &self.context.local_providers;
        let remote_providers = &self.context.remote_providers;

        if range.is_floating() {
            let Some(remote) = self
                .find_library_by_version(key, framework, remote_providers)
                .await?
            else {
                return self
                    .find_library_by_version(key, framework, local_providers)
                    .await;
            };
            let local = self
                .find_library_by_version(&remote.library().to_range(), framework, local_providers)
                .await?;
            if let Some(local) = local.filter(|l| l.version() == remote.version()) {
                trace!("{key}: using local copy of {}", local.library());
                return Ok(Some(local));
            }
            return Ok(Some(remote));
        }

        let local = self
            .find_library_by_version(key, framework, local_providers)
            .await?;
        if local
            .as_ref()
            .is_some_and(|l| range.min_version() == Some(l.version()))
        {
            return Ok(local);
        }

        let remote = self
            .find_library_by_version(key, framework, remote_providers)
            .await?;
        let local = match (local, &remote) {
            (None, Some(remote)) => {
                self.find_library_by_version(&remote.library().to_range(), framework, local_providers)
                    .await?
            }
            (local, _) => local,
        };

        Ok(match (local, remote) {
            (Some(local), Some(remote)) => {
                if range.is_better(Some(local.version()), Some(remote.version())) {
                    Some(remote)
                } else {
                    Some(local)
                }
            }
            (local, remote) => local.or(remote),
        })
    }

    async fn find_project_match(
        &self,
        key: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<SourcedMatch>> {
        let project_key = LibraryRange::new(key.name.clone(), None).with_type(LibraryType::Project);
        for provider in &self.context.project_providers {
            if let Some(remote_match) = provider.find_library(&project_key, framework).await? {
                return Ok(Some(SourcedMatch {
                    remote_match,
                    provider: Arc::clone(provider),
                }));
            }
        }
        Ok(None)
    }

    /// Query one tier. Pinned requests try non-network providers first and
    /// stop on an exact hit.
    async fn find_library_by_version(
        &self,
        key: &LibraryRange,
        framework: &Framework,
        providers: &[Arc<dyn RemoteDependencyProvider>],
    ) -> miette::Result<Option<SourcedMatch>> {
        if key.is_floating() {
            return self.find_library(key, framework, providers.iter()).await;
        }

        let (http, non_http): (Vec<_>, Vec<_>) = providers.iter().partition(|p| p.is_http());

        let non_http_match = self.find_library(key, framework, non_http).await?;
        if let Some(ref found) = non_http_match {
            let min = key.version_range.as_ref().and_then(VersionRange::min_version);
            if min == Some(found.version()) {
                return Ok(non_http_match);
            }
        }

        let http_match = self.find_library(key, framework, http).await?;
        Ok(pick_better(key.version_range.as_ref(), non_http_match, http_match))
    }

    /// Query every provider concurrently and keep the best answer.
    async fn find_library<'p>(
        &self,
        key: &LibraryRange,
        framework: &Framework,
        providers: impl IntoIterator<Item = &'p Arc<dyn RemoteDependencyProvider>>,
    ) -> miette::Result<Option<SourcedMatch>> {
        let lookups = providers.into_iter().map(|provider| async move {
            let found = provider.find_library(key, framework).await?;
            Ok::<_, miette::Report>(found.map(|remote_match| SourcedMatch {
                remote_match,
                provider: Arc::clone(provider),
            }))
        });

        let mut best = None;
        for found in join_all(lookups).await {
            best = pick_better(key.version_range.as_ref(), best, found?);
        }
        Ok(best)
    }
}

fn pick_better(
    range: Option<&VersionRange>,
    current: Option<SourcedMatch>,
    considering: Option<SourcedMatch>,
) -> Option<SourcedMatch> {
    let Some(range) = range else {
        return current.or(considering);
    };
    if range.is_better(
        current.as_ref().map(SourcedMatch::version),
        considering.as_ref().map(SourcedMatch::version),
    ) {
        considering
    } else {
        current
    }
}

fn attach(
    graph: &mut DependencyGraph<RemoteResolveResult>,
    idx: petgraph::graph::NodeIndex,
    subtree: Subtree,
) {
    graph.set_item(idx, subtree.item);
    for child in subtree.inner {
        let child_idx = graph.add_inner(idx, child.key.clone());
        attach(graph, child_idx, child);
    }
}
