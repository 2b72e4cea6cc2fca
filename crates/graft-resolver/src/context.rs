//! Shared state for remote walks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use graft_core::library::LibraryRange;

use crate::graph::GraphItem;
use crate::provider::{RemoteDependencyProvider, RemoteResolveResult};

pub(crate) type RemoteItem = Arc<GraphItem<RemoteResolveResult>>;

/// Memoized resolutions keyed by requested range.
///
/// Every key maps to a single-assignment cell. The cell is created under the
/// lock, so concurrent lookups of the same key await one resolution.
#[derive(Default)]
pub struct FindLibraryCache {
    entries: Mutex<HashMap<LibraryRange, Arc<OnceCell<Option<RemoteItem>>>>>,
}

impl FindLibraryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell for `key`, inserting an empty one if absent.
    pub(crate) fn entry(&self, key: &LibraryRange) -> Arc<OnceCell<Option<RemoteItem>>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.entry(key.clone()).or_default().clone()
    }

    /// The completed resolution for `key`, if one exists.
    pub fn get(&self, key: &LibraryRange) -> Option<Option<Arc<GraphItem<RemoteResolveResult>>>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Providers grouped by tier, plus the resolution cache they fill.
///
/// Share one context across several walks to deduplicate diamond
/// dependencies between roots; build a fresh one otherwise.
#[derive(Default)]
pub struct RemoteWalkContext {
    pub project_providers: Vec<Arc<dyn RemoteDependencyProvider>>,
    pub local_providers: Vec<Arc<dyn RemoteDependencyProvider>>,
    pub remote_providers: Vec<Arc<dyn RemoteDependencyProvider>>,
    pub find_library_cache: FindLibraryCache,
}

impl RemoteWalkContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_provider(mut self, provider: Arc<dyn RemoteDependencyProvider>) -> Self {
        self.project_providers.push(provider);
        self
    }

    pub fn with_local_provider(mut self, provider: Arc<dyn RemoteDependencyProvider>) -> Self {
        self.local_providers.push(provider);
        self
    }

    pub fn with_remote_provider(mut self, provider: Arc<dyn RemoteDependencyProvider>) -> Self {
        self.remote_providers.push(provider);
        self
    }
}
