//! Local package folder: `<root>/<lowercase-name>/<version>/graft.toml`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::trace;

use graft_core::framework::Framework;
use graft_core::library::{
    Library, LibraryDependency, LibraryDescription, LibraryRange, LibraryType,
};
use graft_core::manifest::{Manifest, MANIFEST_FILE};
use graft_core::version::PackageVersion;
use graft_resolver::provider::{DependencyProvider, RemoteDependencyProvider, RemoteMatch};
use graft_util::errors::GraftError;

/// A folder of unpacked packages.
#[derive(Debug, Clone)]
pub struct PackageFolder {
    root: PathBuf,
    source: String,
}

impl PackageFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let source = root.display().to_string();
        Self { root, source }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a given package version.
    pub fn package_dir(&self, name: &str, version: &PackageVersion) -> PathBuf {
        self.root
            .join(name.to_ascii_lowercase())
            .join(version.to_string())
    }

    /// Versions of `name` present in the folder, in directory order.
    pub fn versions(&self, name: &str) -> miette::Result<Vec<PackageVersion>> {
        let dir = self.root.join(name.to_ascii_lowercase());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(GraftError::Io)? {
            let entry = entry.map_err(GraftError::Io)?;
            if !entry.path().join(MANIFEST_FILE).is_file() {
                continue;
            }
            let file_name = entry.file_name();
            match PackageVersion::parse(&file_name.to_string_lossy()) {
                Some(version) => versions.push(version),
                None => trace!("ignoring {}: not a version", entry.path().display()),
            }
        }
        Ok(versions)
    }

    /// The best version in the folder for `library_range`.
    pub fn best_version(&self, library_range: &LibraryRange) -> miette::Result<Option<PackageVersion>> {
        let versions = self.versions(&library_range.name)?;
        Ok(crate::select_best(library_range, versions))
    }

    /// Parse the manifest of an installed version.
    pub fn manifest(&self, name: &str, version: &PackageVersion) -> miette::Result<Manifest> {
        Manifest::from_dir(&self.package_dir(name, version))
    }
}

impl DependencyProvider for PackageFolder {
    fn supports_type(&self, library_type: LibraryType) -> bool {
        library_type == LibraryType::Package
    }

    fn get_description(
        &self,
        library_range: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<LibraryDescription>> {
        let Some(version) = self.best_version(library_range)? else {
            return Ok(None);
        };
        let manifest = self.manifest(&library_range.name, &version)?;
        let identity = Library::new(manifest.package.name.clone(), version.clone());
        Ok(Some(
            LibraryDescription::new(library_range.clone(), identity)
                .with_dependencies(manifest.dependencies_for(framework)?)
                .with_path(self.package_dir(&library_range.name, &version)),
        ))
    }
}

#[async_trait]
impl RemoteDependencyProvider for PackageFolder {
    fn is_http(&self) -> bool {
        false
    }

    fn source(&self) -> &str {
        &self.source
    }

    async fn find_library(
        &self,
        library_range: &LibraryRange,
        _framework: &Framework,
    ) -> miette::Result<Option<RemoteMatch>> {
        let Some(version) = self.best_version(library_range)? else {
            return Ok(None);
        };
        let path = self.package_dir(&library_range.name, &version);
        let manifest = self.manifest(&library_range.name, &version)?;
        Ok(Some(
            RemoteMatch::new(Library::new(manifest.package.name, version))
                .with_path(path.display().to_string()),
        ))
    }

    async fn get_dependencies(
        &self,
        library_match: &RemoteMatch,
        framework: &Framework,
    ) -> miette::Result<Vec<LibraryDependency>> {
        let library = &library_match.library;
        self.manifest(&library.name, &library.version)?
            .dependencies_for(framework)
    }
}
