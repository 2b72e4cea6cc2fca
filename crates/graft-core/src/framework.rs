//! Target frameworks and nearest-framework selection.

use std::fmt;
use std::str::FromStr;

use graft_util::errors::GraftError;

use crate::version::PackageVersion;

/// Identifier of the framework-neutral group, compatible with every target.
pub const ANY_FRAMEWORK: &str = "any";

/// A target framework such as `net45`, `netstandard2.0` or `dnxcore50`.
#[derive(Debug, Clone)]
pub struct Framework {
    name: String,
    identifier: String,
    version: PackageVersion,
}

impl Framework {
    /// Parse a short framework name.
    ///
    /// The leading letters form the identifier; the remainder is the version,
    /// either dotted (`netstandard2.0`) or one digit per part (`net451`).
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }
        let split = name
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(name.len());
        let (identifier, digits) = name.split_at(split);
        if identifier.is_empty() || !identifier.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let version = if digits.is_empty() {
            PackageVersion::new(0, 0, 0)
        } else if digits.contains('.') {
            PackageVersion::parse(digits)?
        } else {
            if digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let dotted: Vec<String> = digits.chars().map(String::from).collect();
            PackageVersion::parse(&dotted.join("."))?
        };

        Some(Self {
            identifier: identifier.to_string(),
            version,
            name,
        })
    }

    /// The framework-neutral group.
    pub fn any() -> Self {
        Self {
            name: ANY_FRAMEWORK.to_string(),
            identifier: ANY_FRAMEWORK.to_string(),
            version: PackageVersion::new(0, 0, 0),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn version(&self) -> &PackageVersion {
        &self.version
    }

    pub fn is_any(&self) -> bool {
        self.identifier == ANY_FRAMEWORK
    }

    /// Whether assets built for `self` can be consumed by a project targeting `target`.
    pub fn is_compatible_with(&self, target: &Framework) -> bool {
        self.is_any() || (self.identifier == target.identifier && self.version <= target.version)
    }
}

impl PartialEq for Framework {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.version == other.version
    }
}

impl Eq for Framework {}

impl FromStr for Framework {
    type Err = GraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| GraftError::Generic {
            message: format!("'{s}' is not a valid target framework"),
        })
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Pick the item whose framework is the nearest compatible match for `target`.
///
/// Framework-specific groups beat the neutral `any` group; among compatible
/// specific groups the highest version wins.
pub fn get_nearest<T, F>(items: impl IntoIterator<Item = T>, target: &Framework, selector: F) -> Option<T>
where
    F: Fn(&T) -> &Framework,
{
    let mut best: Option<T> = None;
    for item in items {
        let framework = selector(&item);
        if !framework.is_compatible_with(target) {
            continue;
        }
        let replace = match best.as_ref().map(&selector) {
            None => true,
            Some(current) if current.is_any() => !framework.is_any(),
            Some(current) => !framework.is_any() && framework.version > current.version,
        };
        if replace {
            best = Some(item);
        }
    }
    best
}
