use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use graft_util::errors::GraftError;

use crate::framework::{self, Framework};
use crate::library::{Library, LibraryDependency, LibraryRange, LibraryType};
use crate::version::{PackageVersion, VersionRange};

/// File name of a package or project manifest.
pub const MANIFEST_FILE: &str = "graft.toml";

/// The parsed representation of a `graft.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageMetadata,

    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,

    #[serde(default)]
    pub frameworks: BTreeMap<String, FrameworkDependencies>,
}

/// Package identity and metadata from the `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A dependency declaration: either a bare range string or a detailed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Version(String),
    Detailed(DetailedDependency),
}

/// A dependency with an explicit type and optional version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedDependency {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "type")]
    pub library_type: LibraryType,
}

/// Framework-specific dependencies from `[frameworks.<tfm>.dependencies]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameworkDependencies {
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,
}

impl Manifest {
    /// Parse a manifest from a TOML string.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            GraftError::Manifest {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Read `graft.toml` from a directory.
    pub fn from_dir(dir: &Path) -> miette::Result<Self> {
        Self::from_path(&dir.join(MANIFEST_FILE))
    }

    pub fn version(&self) -> miette::Result<PackageVersion> {
        Ok(self.package.version.parse::<PackageVersion>()?)
    }

    /// The identity this manifest declares, typed as `library_type`.
    pub fn identity(&self, library_type: LibraryType) -> miette::Result<Library> {
        Ok(Library::new(self.package.name.clone(), self.version()?).with_type(library_type))
    }

    /// Dependencies that apply when targeting `target`: the common
    /// `[dependencies]` followed by the nearest compatible framework group.
    pub fn dependencies_for(&self, target: &Framework) -> miette::Result<Vec<LibraryDependency>> {
        let mut deps = to_dependencies(&self.dependencies)?;

        let mut groups = Vec::new();
        for (name, group) in &self.frameworks {
            let fw = name.parse::<Framework>().map_err(|e| GraftError::Manifest {
                message: format!("[frameworks.{name}]: {e}"),
            })?;
            groups.push((fw, group));
        }
        if let Some((_, group)) = framework::get_nearest(groups.iter(), target, |(fw, _)| fw) {
            deps.extend(to_dependencies(&group.dependencies)?);
        }
        Ok(deps)
    }
}

fn to_dependencies(
    specs: &BTreeMap<String, DependencySpec>,
) -> miette::Result<Vec<LibraryDependency>> {
    specs
        .iter()
        .map(|(name, spec)| spec.to_range(name).map(LibraryDependency::new))
        .collect()
}

impl DependencySpec {
    /// Turn this declaration into a library request named `name`.
    pub fn to_range(&self, name: &str) -> miette::Result<LibraryRange> {
        let (version, library_type) = match self {
            DependencySpec::Version(v) => (Some(v.as_str()), LibraryType::Package),
            DependencySpec::Detailed(d) => (d.version.as_deref(), d.library_type),
        };
        let version_range = match version {
            Some(v) => Some(v.parse::<VersionRange>().map_err(|e| GraftError::Manifest {
                message: format!("dependency '{name}': {e}"),
            })?),
            None => None,
        };
        Ok(LibraryRange::new(name, version_range).with_type(library_type))
    }
}
