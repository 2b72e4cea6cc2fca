//! Workspace projects as a dependency source.
//!
//! A project is any subdirectory of a search path that contains a
//! `graft.toml`; it is known by its directory name. The search paths are the
//! parent of the project being walked and every `projects` entry of the
//! workspace settings.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use graft_core::framework::Framework;
use graft_core::library::{
    LibraryDependency, LibraryDescription, LibraryRange, LibraryType,
};
use graft_core::manifest::{Manifest, MANIFEST_FILE};
use graft_core::workspace::{resolve_root_directory, WorkspaceSettings};
use graft_resolver::provider::{DependencyProvider, RemoteDependencyProvider, RemoteMatch};

/// Locates project directories by name.
#[derive(Debug, Clone)]
pub struct ProjectResolver {
    search_paths: Vec<PathBuf>,
}

impl ProjectResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Search paths for the project in `project_dir`.
    pub fn for_project(project_dir: &Path) -> miette::Result<Self> {
        let mut search_paths = Vec::new();
        if let Some(parent) = project_dir.parent() {
            search_paths.push(parent.to_path_buf());
        }
        let root = resolve_root_directory(project_dir);
        if let Some(settings) = WorkspaceSettings::try_load(&root)? {
            for path in settings.project_paths(&root) {
                if !search_paths.contains(&path) {
                    search_paths.push(path);
                }
            }
        }
        debug!("project search paths: {search_paths:?}");
        Ok(Self::new(search_paths))
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// The directory of the project called `name`, matched case-insensitively.
    pub fn find_project(&self, name: &str) -> Option<PathBuf> {
        for search_path in &self.search_paths {
            let Ok(entries) = std::fs::read_dir(search_path) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name)
                    && path.join(MANIFEST_FILE).is_file()
                {
                    return Some(path);
                }
            }
        }
        None
    }
}

/// Serves `Project`-typed requests from workspace projects.
#[derive(Debug, Clone)]
pub struct ProjectProvider {
    resolver: ProjectResolver,
    source: String,
}

impl ProjectProvider {
    pub fn new(resolver: ProjectResolver) -> Self {
        Self {
            resolver,
            source: "workspace".to_string(),
        }
    }

    fn load(&self, name: &str) -> miette::Result<Option<(PathBuf, Manifest)>> {
        let Some(dir) = self.resolver.find_project(name) else {
            return Ok(None);
        };
        let manifest = Manifest::from_dir(&dir)?;
        Ok(Some((dir, manifest)))
    }
}

impl DependencyProvider for ProjectProvider {
    fn supports_type(&self, library_type: LibraryType) -> bool {
        library_type == LibraryType::Project
    }

    fn get_description(
        &self,
        library_range: &LibraryRange,
        framework: &Framework,
    ) -> miette::Result<Option<LibraryDescription>> {
        let Some((dir, manifest)) = self.load(&library_range.name)? else {
            return Ok(None);
        };
        let identity = manifest.identity(LibraryType::Project)?;
        Ok(Some(
            LibraryDescription::new(library_range.clone(), identity)
                .with_dependencies(manifest.dependencies_for(framework)?)
                .with_path(dir),
        ))
    }
}

#[async_trait]
impl RemoteDependencyProvider for ProjectProvider {
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
        let Some((dir, manifest)) = self.load(&library_range.name)? else {
            return Ok(None);
        };
        Ok(Some(
            RemoteMatch::new(manifest.identity(LibraryType::Project)?)
                .with_path(dir.display().to_string()),
        ))
    }

    async fn get_dependencies(
        &self,
        library_match: &RemoteMatch,
        framework: &Framework,
    ) -> miette::Result<Vec<LibraryDependency>> {
        match self.load(&library_match.library.name)? {
            Some((_, manifest)) => manifest.dependencies_for(framework),
            None => Ok(Vec::new()),
        }
    }
}
