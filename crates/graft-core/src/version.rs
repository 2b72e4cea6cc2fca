//! Package version parsing, comparison, and range matching.
//!
//! Versions use the `major.minor.patch[.revision][-release]` form:
//! - Missing numeric parts are zero, so `1.0` equals `1.0.0.0`
//! - A version with a release label sorts before the same version without one
//! - Release labels are split on `.` and compared segment by segment:
//!   numeric segments compare as numbers and sort before text segments,
//!   text segments compare case-insensitively
//! - Build metadata after `+` is ignored

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use graft_util::errors::GraftError;

/// A parsed package version with comparable parts.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    pub original: String,
    numbers: [u64; 4],
    release: Vec<ReleaseSegment>,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum ReleaseSegment {
    Numeric(u64),
    Text(String),
}

impl PackageVersion {
    /// Parse a version string. Returns `None` if it is not a valid version.
    pub fn parse(version: &str) -> Option<Self> {
        let trimmed = version.trim();
        let without_metadata = trimmed.split('+').next().unwrap_or(trimmed);
        let (numeric, release) = match without_metadata.split_once('-') {
            Some((n, r)) => (n, Some(r)),
            None => (without_metadata, None),
        };

        let parts: Vec<&str> = numeric.split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return None;
        }
        let mut numbers = [0u64; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse().ok()?;
        }

        let release = match release {
            Some(r) => {
                if r.is_empty() {
                    return None;
                }
                let mut segments = Vec::new();
                for segment in r.split('.') {
                    if segment.is_empty() {
                        return None;
                    }
                    segments.push(classify(segment));
                }
                segments
            }
            None => Vec::new(),
        };

        Some(Self {
            original: trimmed.to_string(),
            numbers,
            release,
        })
    }

    /// Build a stable version from its numeric parts.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            original: format!("{major}.{minor}.{patch}"),
            numbers: [major, minor, patch, 0],
            release: Vec::new(),
        }
    }

    pub fn major(&self) -> u64 {
        self.numbers[0]
    }

    pub fn minor(&self) -> u64 {
        self.numbers[1]
    }

    pub fn patch(&self) -> u64 {
        self.numbers[2]
    }

    pub fn revision(&self) -> u64 {
        self.numbers[3]
    }

    pub fn is_prerelease(&self) -> bool {
        !self.release.is_empty()
    }

    /// True when both versions have identical numeric parts, ignoring release labels.
    pub fn same_numbers(&self, other: &Self) -> bool {
        self.numbers == other.numbers
    }
}

fn classify(token: &str) -> ReleaseSegment {
    match token.parse::<u64>() {
        Ok(n) => ReleaseSegment::Numeric(n),
        Err(_) => ReleaseSegment::Text(token.to_lowercase()),
    }
}

impl FromStr for PackageVersion {
    type Err = GraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| GraftError::Version {
            message: format!("'{s}' is not a valid version"),
        })
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

impl Hash for PackageVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numbers.hash(state);
        self.release.hash(state);
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers
            .cmp(&other.numbers)
            .then_with(|| compare_release(&self.release, &other.release))
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_release(a: &[ReleaseSegment], b: &[ReleaseSegment]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    for (x, y) in a.iter().zip(b) {
        let ord = match (x, y) {
            (ReleaseSegment::Numeric(x), ReleaseSegment::Numeric(y)) => x.cmp(y),
            (ReleaseSegment::Numeric(_), ReleaseSegment::Text(_)) => Ordering::Less,
            (ReleaseSegment::Text(_), ReleaseSegment::Numeric(_)) => Ordering::Greater,
            (ReleaseSegment::Text(x), ReleaseSegment::Text(y)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// How a floating range picks among the versions it matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FloatBehavior {
    /// Pinned: the lowest satisfying version wins.
    #[default]
    None,
    /// `1.0.0-*`: newest release of exactly `1.0.0`, prereleases included.
    Prerelease,
    /// `1.0.0.*`: newest revision of `1.0.0`.
    Revision,
    /// `1.0.*`: newest patch of `1.0`.
    Patch,
    /// `1.*`: newest minor of `1`.
    Minor,
    /// `*`: newest version overall.
    Major,
}

/// A requested version range.
///
/// Supports bare versions (`1.2.0`, minimum-inclusive), intervals
/// (`[1.0,2.0)`, `(,2.0]`), exact versions (`[1.5]`) and floating patterns
/// (`1.*`, `1.2.*`, `1.2.3.*`, `1.0.0-*`, `*`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    pub min: Option<PackageVersion>,
    pub min_inclusive: bool,
    pub max: Option<PackageVersion>,
    pub max_inclusive: bool,
    pub float: FloatBehavior,
}

impl VersionRange {
    /// `>= version`, preferring the lowest match.
    pub fn pinned(version: PackageVersion) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            float: FloatBehavior::None,
        }
    }

    /// Exactly `version`.
    pub fn exact(version: PackageVersion) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
            float: FloatBehavior::None,
        }
    }

    /// Parse a range expression. Returns `None` if it is malformed.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        if s.is_empty() {
            return None;
        }
        if s.starts_with('[') || s.starts_with('(') {
            return parse_interval(s);
        }
        if s.contains('*') {
            return parse_floating(s);
        }
        PackageVersion::parse(s).map(Self::pinned)
    }

    pub fn is_floating(&self) -> bool {
        self.float != FloatBehavior::None
    }

    /// The lower bound a pinned request is hoping to hit exactly.
    pub fn min_version(&self) -> Option<&PackageVersion> {
        self.min.as_ref()
    }

    fn allows_prerelease(&self) -> bool {
        self.float == FloatBehavior::Prerelease
            || self.min.as_ref().is_some_and(PackageVersion::is_prerelease)
            || self.max.as_ref().is_some_and(PackageVersion::is_prerelease)
    }

    /// Check if a version falls within the bounds of this range.
    pub fn satisfies(&self, version: &PackageVersion) -> bool {
        if version.is_prerelease() && !self.allows_prerelease() {
            return false;
        }
        if let Some(ref min) = self.min {
            let cmp = version.cmp(min);
            if self.min_inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref max) = self.max {
            let cmp = version.cmp(max);
            if self.max_inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }

    /// Whether `version` fits the floating pattern (e.g. same major for `1.*`).
    fn float_matches(&self, version: &PackageVersion) -> bool {
        let Some(ref min) = self.min else {
            return true;
        };
        match self.float {
            FloatBehavior::None => version == min,
            FloatBehavior::Major => true,
            FloatBehavior::Minor => version.major() == min.major(),
            FloatBehavior::Patch => {
                version.major() == min.major() && version.minor() == min.minor()
            }
            FloatBehavior::Revision => {
                version.major() == min.major()
                    && version.minor() == min.minor()
                    && version.patch() == min.patch()
            }
            FloatBehavior::Prerelease => version.same_numbers(min),
        }
    }

    /// Decide whether `considering` is strictly better than `current` for this range.
    ///
    /// Pinned ranges prefer the lowest satisfying version, so an exact hit on
    /// the minimum beats everything. Floating ranges prefer versions matching
    /// the float pattern, then the highest. Equal candidates are never better.
    pub fn is_better(
        &self,
        current: Option<&PackageVersion>,
        considering: Option<&PackageVersion>,
    ) -> bool {
        let Some(considering) = considering else {
            return false;
        };
        if !self.satisfies(considering) {
            return false;
        }
        let Some(current) = current else {
            return true;
        };
        if !self.is_floating() {
            return considering < current;
        }
        let current_matches = self.float_matches(current);
        let considering_matches = self.float_matches(considering);
        if current_matches != considering_matches {
            return considering_matches;
        }
        considering > current
    }
}

fn parse_interval(s: &str) -> Option<VersionRange> {
    if s.len() < 2 {
        return None;
    }
    let open_inclusive = s.starts_with('[');
    let close_inclusive = s.ends_with(']');
    if !close_inclusive && !s.ends_with(')') {
        return None;
    }
    let inner = &s[1..s.len() - 1];

    if let Some((lower, upper)) = inner.split_once(',') {
        let lower = lower.trim();
        let upper = upper.trim();
        let min = if lower.is_empty() {
            None
        } else {
            Some(PackageVersion::parse(lower)?)
        };
        let max = if upper.is_empty() {
            None
        } else {
            Some(PackageVersion::parse(upper)?)
        };
        Some(VersionRange {
            min,
            min_inclusive: open_inclusive,
            max,
            max_inclusive: close_inclusive,
            float: FloatBehavior::None,
        })
    } else {
        if !open_inclusive || !close_inclusive {
            return None;
        }
        PackageVersion::parse(inner).map(VersionRange::exact)
    }
}

fn parse_floating(s: &str) -> Option<VersionRange> {
    let (min, float) = if s == "*" {
        (PackageVersion::new(0, 0, 0), FloatBehavior::Major)
    } else if let Some(base) = s.strip_suffix("-*") {
        let base = PackageVersion::parse(base)?;
        if base.is_prerelease() {
            return None;
        }
        (
            PackageVersion::parse(&format!("{base}-0"))?,
            FloatBehavior::Prerelease,
        )
    } else {
        let prefix = s.strip_suffix(".*")?;
        if prefix.contains('*') || prefix.contains('-') {
            return None;
        }
        let float = match prefix.split('.').count() {
            1 => FloatBehavior::Minor,
            2 => FloatBehavior::Patch,
            3 => FloatBehavior::Revision,
            _ => return None,
        };
        (PackageVersion::parse(prefix)?, float)
    };

    Some(VersionRange {
        min: Some(min),
        min_inclusive: true,
        max: None,
        max_inclusive: false,
        float,
    })
}

impl FromStr for VersionRange {
    type Err = GraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| GraftError::Version {
            message: format!("'{s}' is not a valid version range"),
        })
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (FloatBehavior::None, Some(min), None) = (self.float, &self.min, &self.max) {
            if self.min_inclusive {
                return write!(f, "{min}");
            }
        }
        if let Some(ref min) = self.min {
            match self.float {
                FloatBehavior::None => {}
                FloatBehavior::Major => return f.write_str("*"),
                FloatBehavior::Minor => return write!(f, "{}.*", min.major()),
                FloatBehavior::Patch => return write!(f, "{}.{}.*", min.major(), min.minor()),
                FloatBehavior::Revision => {
                    return write!(f, "{}.{}.{}.*", min.major(), min.minor(), min.patch())
                }
                FloatBehavior::Prerelease => {
                    return write!(f, "{}.{}.{}-*", min.major(), min.minor(), min.patch())
                }
            }
        }
        if let (Some(min), Some(max)) = (&self.min, &self.max) {
            if min == max && self.min_inclusive && self.max_inclusive {
                return write!(f, "[{min}]");
            }
        }
        let open = if self.min_inclusive { '[' } else { '(' };
        let close = if self.max_inclusive { ']' } else { ')' };
        let min = self.min.as_ref().map(|v| v.to_string()).unwrap_or_default();
        let max = self.max.as_ref().map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{open}{min}, {max}{close}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        PackageVersion::parse(s).unwrap()
    }

    #[test]
    fn basic_ordering() {
        assert!(v("1.0") < v("2.0"));
        assert!(v("1.0.0") < v("1.0.1"));
        assert!(v("1.0.1") < v("1.1.0"));
        assert!(v("1.0.0.1") > v("1.0.0"));
    }

    #[test]
    fn trailing_zeros_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1.0.0"), v("1.0.0.0"));
    }

    #[test]
    fn prerelease_before_release() {
        assert!(v("1.0.0-beta") < v("1.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0-beta"));
        assert!(v("1.0.0-beta.2") < v("1.0.0-beta.10"));
        assert!(v("1.0.0-rc.1") < v("1.0.0-rc.1.1"));
        assert!(v("1.0.0-1") < v("1.0.0-alpha"));
    }

    #[test]
    fn release_labels_case_insensitive() {
        assert_eq!(v("1.0.0-Beta"), v("1.0.0-beta"));
    }

    #[test]
    fn build_metadata_ignored() {
        assert_eq!(v("1.0.0+abc"), v("1.0.0"));
    }

    #[test]
    fn invalid_versions() {
        assert!(PackageVersion::parse("").is_none());
        assert!(PackageVersion::parse("a.b").is_none());
        assert!(PackageVersion::parse("1.2.3.4.5").is_none());
        assert!(PackageVersion::parse("1.0-").is_none());
        assert!("1..0".parse::<PackageVersion>().is_err());
    }

    #[test]
    fn display_keeps_original() {
        assert_eq!(v("1.8").to_string(), "1.8");
    }

    #[test]
    fn bare_version_is_pinned_minimum() {
        let range = VersionRange::parse("1.2.0").unwrap();
        assert!(!range.is_floating());
        assert!(range.satisfies(&v("1.2.0")));
        assert!(range.satisfies(&v("3.0.0")));
        assert!(!range.satisfies(&v("1.1.9")));
        assert!(!range.satisfies(&v("1.3.0-beta")));
    }

    #[test]
    fn interval_bounds() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        assert!(range.satisfies(&v("1.0")));
        assert!(range.satisfies(&v("1.9.9")));
        assert!(!range.satisfies(&v("2.0")));

        let open = VersionRange::parse("(,2.0]").unwrap();
        assert!(open.satisfies(&v("0.1")));
        assert!(open.satisfies(&v("2.0")));
    }

    #[test]
    fn exact_range() {
        let range = VersionRange::parse("[1.5]").unwrap();
        assert!(range.satisfies(&v("1.5")));
        assert!(!range.satisfies(&v("1.4")));
        assert!(!range.satisfies(&v("1.6")));
    }

    #[test]
    fn floating_patterns() {
        assert_eq!(VersionRange::parse("*").unwrap().float, FloatBehavior::Major);
        assert_eq!(VersionRange::parse("1.*").unwrap().float, FloatBehavior::Minor);
        assert_eq!(VersionRange::parse("1.2.*").unwrap().float, FloatBehavior::Patch);
        assert_eq!(
            VersionRange::parse("1.2.3.*").unwrap().float,
            FloatBehavior::Revision
        );
        assert_eq!(
            VersionRange::parse("1.0.0-*").unwrap().float,
            FloatBehavior::Prerelease
        );
        assert!(VersionRange::parse("1.*.3").is_none());
    }

    #[test]
    fn malformed_ranges() {
        assert!(VersionRange::parse("").is_none());
        assert!(VersionRange::parse("[1.0").is_none());
        assert!(VersionRange::parse("(1.0)").is_none());
        assert!("[x,y]".parse::<VersionRange>().is_err());
    }

    #[test]
    fn pinned_prefers_lowest_satisfying() {
        let range = VersionRange::parse("1.2.0").unwrap();
        assert!(range.is_better(None, Some(&v("1.3.0"))));
        assert!(range.is_better(Some(&v("1.3.0")), Some(&v("1.2.0"))));
        assert!(!range.is_better(Some(&v("1.2.0")), Some(&v("1.3.0"))));
        assert!(!range.is_better(Some(&v("1.3.0")), Some(&v("1.1.0"))));
    }

    #[test]
    fn floating_prefers_highest_matching() {
        let range = VersionRange::parse("1.*").unwrap();
        assert!(range.is_better(Some(&v("1.2.0")), Some(&v("1.5.0"))));
        assert!(!range.is_better(Some(&v("1.5.0")), Some(&v("1.2.0"))));
        assert!(range.is_better(Some(&v("2.0.0")), Some(&v("1.0.0"))));
        assert!(!range.is_better(Some(&v("1.5.0")), Some(&v("2.0.0"))));
    }

    #[test]
    fn equal_candidates_are_not_better() {
        let range = VersionRange::parse("1.*").unwrap();
        assert!(!range.is_better(Some(&v("1.5.0")), Some(&v("1.5.0"))));
        assert!(!range.is_better(Some(&v("1.5.0")), None));
        assert!(!range.is_better(None, None));
    }

    #[test]
    fn display_round_trips_common_forms() {
        for s in ["1.2.0", "1.*", "1.2.*", "*", "1.0.0-*", "[1.5]", "[1.0, 2.0)"] {
            assert_eq!(VersionRange::parse(s).unwrap().to_string(), s);
        }
    }
}
