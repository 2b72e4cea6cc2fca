#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use graft_core::framework::Framework;
use graft_core::library::{
    Library, LibraryDependency, LibraryDescription, LibraryRange, LibraryType,
};
use graft_core::version::PackageVersion;
use graft_resolver::provider::{DependencyProvider, RemoteDependencyProvider, RemoteMatch};

/// One published version of a package and what it depends on.
#[derive(Debug, Clone)]
pub struct Package {
    pub library: Library,
    pub dependencies: Vec<LibraryDependency>,
}

/// `pkg("A", "1.0.0", &[("B", "1.0.0")])`
pub fn pkg(name: &str, version: &str, deps: &[(&str, &str)]) -> Package {
    Package {
        library: Library::new(name, PackageVersion::parse(version).unwrap()),
        dependencies: deps
            .iter()
            .map(|(n, r)| LibraryDependency::new(LibraryRange::package(*n, r).unwrap()))
            .collect(),
    }
}

pub fn fw() -> Framework {
    Framework::parse("net45").unwrap()
}

fn best<'a>(packages: &'a [Package], range: &LibraryRange) -> Option<&'a Package> {
    let mut best: Option<&Package> = None;
    for p in packages
        .iter()
        .filter(|p| p.library.name.eq_ignore_ascii_case(&range.name))
    {
        let better = match range.version_range {
            Some(ref vr) => vr.is_better(best.map(|b| &b.library.version), Some(&p.library.version)),
            None => best.is_none(),
        };
        if better {
            best = Some(p);
        }
    }
    best
}

/// Synchronous provider over a fixed package list.
pub struct MemoryProvider {
    packages: Vec<Package>,
    library_type: LibraryType,
    pub calls: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(packages: Vec<Package>) -> Arc<Self> {
        Arc::new(Self {
            packages,
            library_type: LibraryType::Package,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn projects(packages: Vec<Package>) -> Arc<Self> {
        Arc::new(Self {
            packages,
            library_type: LibraryType::Project,
            calls: AtomicUsize::new(0),
        })
    }
}

impl DependencyProvider for MemoryProvider {
    fn supports_type(&self, library_type: LibraryType) -> bool {
        library_type == self.library_type
    }

    fn get_description(
        &self,
        library_range: &LibraryRange,
        _framework: &Framework,
    ) -> miette::Result<Option<LibraryDescription>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(best(&self.packages, library_range).map(|p| {
            LibraryDescription::new(
                library_range.clone(),
                p.library.clone().with_type(self.library_type),
            )
            .with_dependencies(p.dependencies.clone())
        }))
    }
}

/// Asynchronous provider over a fixed package list that counts lookups.
pub struct FakeFeed {
    name: String,
    http: bool,
    packages: Vec<Package>,
    library_type: LibraryType,
    pub find_calls: AtomicUsize,
    pub dependency_calls: AtomicUsize,
    per_key: Mutex<HashMap<String, usize>>,
}

impl FakeFeed {
    fn build(name: &str, http: bool, packages: Vec<Package>, library_type: LibraryType) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            http,
            packages,
            library_type,
            find_calls: AtomicUsize::new(0),
            dependency_calls: AtomicUsize::new(0),
            per_key: Mutex::new(HashMap::new()),
        })
    }

    pub fn local(name: &str, packages: Vec<Package>) -> Arc<Self> {
        Self::build(name, false, packages, LibraryType::Package)
    }

    pub fn http(name: &str, packages: Vec<Package>) -> Arc<Self> {
        Self::build(name, true, packages, LibraryType::Package)
    }

    pub fn projects(name: &str, packages: Vec<Package>) -> Arc<Self> {
        Self::build(name, false, packages, LibraryType::Project)
    }

    pub fn calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Lookups for a particular request, keyed by its display form.
    pub fn calls_for(&self, key: &str) -> usize {
        self.per_key.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RemoteDependencyProvider for FakeFeed {
    fn is_http(&self) -> bool {
        self.http
    }

    fn source(&self) -> &str {
        &self.name
    }

    async fn find_library(
        &self,
        library_range: &LibraryRange,
        _framework: &Framework,
    ) -> miette::Result<Option<RemoteMatch>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .per_key
            .lock()
            .unwrap()
            .entry(library_range.to_string())
            .or_default() += 1;
        // Let sibling lookups interleave.
        tokio::task::yield_now().await;

        if self.library_type == LibraryType::Project {
            return Ok(self
                .packages
                .iter()
                .find(|p| p.library.name.eq_ignore_ascii_case(&library_range.name))
                .map(|p| RemoteMatch::new(p.library.clone().with_type(LibraryType::Project))));
        }
        Ok(best(&self.packages, library_range)
            .map(|p| RemoteMatch::new(p.library.clone()).with_path(format!("{}/{}", self.name, p.library))))
    }

    async fn get_dependencies(
        &self,
        library_match: &RemoteMatch,
        _framework: &Framework,
    ) -> miette::Result<Vec<LibraryDependency>> {
        self.dependency_calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent resolutions of the same identity a chance to race.
        tokio::task::yield_now().await;
        Ok(self
            .packages
            .iter()
            .find(|p| {
                p.library.name.eq_ignore_ascii_case(&library_match.library.name)
                    && p.library.version == library_match.library.version
            })
            .map(|p| p.dependencies.clone())
            .unwrap_or_default())
    }
}
