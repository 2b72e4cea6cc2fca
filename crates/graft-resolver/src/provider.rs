//! Capabilities the walkers consume to locate libraries.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use graft_core::framework::Framework;
use graft_core::library::{
    Library, LibraryDependency, LibraryDescription, LibraryRange, LibraryType,
};
use graft_core::version::PackageVersion;

/// Synchronous, in-memory provider used by the local walker.
pub trait DependencyProvider: Send + Sync {
    /// Whether this provider can answer requests of the given type.
    fn supports_type(&self, library_type: LibraryType) -> bool;

    /// Resolve `library_range` for `framework`, or `None` if this provider
    /// does not know it.
    fn get_description(
        &self,
        library_range: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<LibraryDescription>>;
}

/// A library located by a [`RemoteDependencyProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMatch {
    pub library: Library,
    /// Where the provider found it (folder path or URL).
    pub path: Option<String>,
}

impl RemoteMatch {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Asynchronous provider used by the remote walker: workspace projects,
/// local package folders, and HTTP feeds.
#[async_trait]
pub trait RemoteDependencyProvider: Send + Sync {
    /// Whether lookups go over the network.
    fn is_http(&self) -> bool;

    /// Human-readable location of this provider, for diagnostics.
    fn source(&self) -> &str;

    /// Find the best library this provider has for `library_range`.
    async fn find_library(
        &self,
        library_range: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<RemoteMatch>>;

    /// Dependencies declared by a library this provider matched.
    async fn get_dependencies(
        &self,
        library_match: &RemoteMatch,
        framework: &Framework,
    ) -> miette::Result<Vec<LibraryDependency>>;
}

/// A match together with the provider that produced it.
#[derive(Clone)]
pub struct SourcedMatch {
    pub remote_match: RemoteMatch,
    pub provider: Arc<dyn RemoteDependencyProvider>,
}

impl SourcedMatch {
    pub fn library(&self) -> &Library {
        &self.remote_match.library
    }

    pub fn version(&self) -> &PackageVersion {
        &self.remote_match.library.version
    }
}

impl fmt::Debug for SourcedMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcedMatch")
            .field("remote_match", &self.remote_match)
            .field("provider", &self.provider.source())
            .finish()
    }
}

/// Payload of a remote walk's graph items.
#[derive(Debug, Clone)]
pub struct RemoteResolveResult {
    pub matched: SourcedMatch,
    pub dependencies: Vec<LibraryDependency>,
}
