//! Library identities, requested ranges, and resolved descriptions.
//!
//! Library names compare case-insensitively everywhere; the `Hash`
//! implementations fold case so ranges and identities can key hash maps.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::version::{PackageVersion, VersionRange};

/// Which kind of provider is able to satisfy a library request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    /// A package from a folder or feed.
    #[default]
    Package,
    /// A project in the current workspace.
    Project,
    /// A framework-supplied reference, never resolved by the walkers.
    Reference,
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LibraryType::Package => "package",
            LibraryType::Project => "project",
            LibraryType::Reference => "reference",
        })
    }
}

/// A request for a library: name, optional version constraint and type.
#[derive(Debug, Clone)]
pub struct LibraryRange {
    pub name: String,
    /// `None` means unconstrained.
    pub version_range: Option<VersionRange>,
    pub library_type: LibraryType,
}

impl LibraryRange {
    pub fn new(name: impl Into<String>, version_range: Option<VersionRange>) -> Self {
        Self {
            name: name.into(),
            version_range,
            library_type: LibraryType::Package,
        }
    }

    /// Shorthand for a package request, or `None` if `range` does not parse.
    pub fn package(name: impl Into<String>, range: &str) -> Option<Self> {
        VersionRange::parse(range).map(|range| Self::new(name, Some(range)))
    }

    pub fn with_type(mut self, library_type: LibraryType) -> Self {
        self.library_type = library_type;
        self
    }

    pub fn is_floating(&self) -> bool {
        self.version_range
            .as_ref()
            .is_some_and(VersionRange::is_floating)
    }

    pub fn is_gac_or_framework_reference(&self) -> bool {
        self.library_type == LibraryType::Reference
    }

    /// A request for `other` is already satisfied by this one when the names match.
    pub fn is_eclipsed_by(&self, other: &LibraryRange) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl PartialEq for LibraryRange {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.version_range == other.version_range
            && self.library_type == other.library_type
    }
}

impl Eq for LibraryRange {}

impl Hash for LibraryRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.version_range.hash(state);
        self.library_type.hash(state);
    }
}

impl fmt::Display for LibraryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version_range {
            Some(ref range) => write!(f, "{} {}", self.name, range),
            None => f.write_str(&self.name),
        }
    }
}

/// A concrete resolved identity.
#[derive(Debug, Clone)]
pub struct Library {
    pub name: String,
    pub version: PackageVersion,
    pub library_type: LibraryType,
}

impl Library {
    pub fn new(name: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            name: name.into(),
            version,
            library_type: LibraryType::Package,
        }
    }

    pub fn with_type(mut self, library_type: LibraryType) -> Self {
        self.library_type = library_type;
        self
    }

    /// The pinned request that this identity satisfies exactly.
    pub fn to_range(&self) -> LibraryRange {
        LibraryRange {
            name: self.name.clone(),
            version_range: Some(VersionRange::pinned(self.version.clone())),
            library_type: self.library_type,
        }
    }
}

impl PartialEq for Library {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.version == other.version
            && self.library_type == other.library_type
    }
}

impl Eq for Library {}

impl Hash for Library {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.version.hash(state);
        self.library_type.hash(state);
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// A dependency edge declared by a library.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryDependency {
    pub library_range: LibraryRange,
}

impl LibraryDependency {
    pub fn new(library_range: LibraryRange) -> Self {
        Self { library_range }
    }

    pub fn name(&self) -> &str {
        &self.library_range.name
    }
}

impl From<LibraryRange> for LibraryDependency {
    fn from(library_range: LibraryRange) -> Self {
        Self { library_range }
    }
}

impl fmt::Display for LibraryDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.library_range.fmt(f)
    }
}

/// What a synchronous provider knows about a resolved library.
#[derive(Debug, Clone)]
pub struct LibraryDescription {
    pub library_range: LibraryRange,
    pub identity: Library,
    pub dependencies: Vec<LibraryDependency>,
    /// `false` when the provider could only produce a stub.
    pub resolved: bool,
    pub path: Option<PathBuf>,
}

impl LibraryDescription {
    pub fn new(library_range: LibraryRange, identity: Library) -> Self {
        Self {
            library_range,
            identity,
            dependencies: Vec::new(),
            resolved: true,
            path: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<LibraryDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }
}
