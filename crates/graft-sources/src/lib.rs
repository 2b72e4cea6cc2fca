//! Package sources: local package folders, HTTP feeds and workspace
//! projects, plus selection of the providers a walk consults.

pub mod feed;
pub mod folder;
pub mod project;

use std::sync::Arc;

use graft_core::config::{GlobalConfig, PackageSource};
use graft_core::library::LibraryRange;
use graft_core::version::PackageVersion;
use graft_resolver::provider::RemoteDependencyProvider;

use crate::feed::{FeedOptions, HttpFeed};
use crate::folder::PackageFolder;

/// Build the provider for a configured source: URLs become feeds, anything
/// else is a package folder path.
pub fn create_provider(
    source: &PackageSource,
    config: &GlobalConfig,
) -> miette::Result<Arc<dyn RemoteDependencyProvider>> {
    if source.is_http() {
        Ok(Arc::new(HttpFeed::new(
            &source.source,
            FeedOptions::from_config(config),
        )?))
    } else {
        Ok(Arc::new(PackageFolder::new(graft_util::fs::expand_home(
            &source.source,
        ))))
    }
}

/// The version a provider should offer for `library_range` out of `versions`.
pub(crate) fn select_best(
    library_range: &LibraryRange,
    versions: impl IntoIterator<Item = PackageVersion>,
) -> Option<PackageVersion> {
    let mut best: Option<PackageVersion> = None;
    for version in versions {
        let better = match library_range.version_range {
            Some(ref range) => range.is_better(best.as_ref(), Some(&version)),
            None => !version.is_prerelease() && best.as_ref().map_or(true, |b| version > *b),
        };
        if better {
            best = Some(version);
        }
    }
    best
}
