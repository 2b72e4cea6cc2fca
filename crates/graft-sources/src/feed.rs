//! HTTP flat-container feed.
//!
//! Layout: `{base}/{id}/index.json` lists versions as
//! `{"versions": ["1.0.0", ...]}`, and `{base}/{id}/{version}/graft.toml`
//! holds each version's manifest. Ids are lowercased.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use graft_core::config::GlobalConfig;
use graft_core::framework::Framework;
use graft_core::library::{Library, LibraryDependency, LibraryRange};
use graft_core::manifest::{Manifest, MANIFEST_FILE};
use graft_core::version::PackageVersion;
use graft_resolver::provider::{RemoteDependencyProvider, RemoteMatch};
use graft_util::errors::GraftError;

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Behaviour knobs for an [`HttpFeed`].
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub timeout: Duration,
    pub retries: u32,
    /// Degrade request failures to "no match" with a warning.
    pub ignore_failed: bool,
    /// Re-fetch version listings on every lookup.
    pub no_cache: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(100),
            retries: 3,
            ignore_failed: false,
            no_cache: false,
        }
    }
}

impl FeedOptions {
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.http.timeout_secs),
            retries: config.http.retries.max(1),
            ignore_failed: config.ignore_failed_sources,
            no_cache: config.no_cache,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionIndex {
    versions: Vec<String>,
}

/// A package feed reached over HTTP.
pub struct HttpFeed {
    base_url: String,
    client: Client,
    options: FeedOptions,
    listings: Mutex<HashMap<String, Arc<Vec<PackageVersion>>>>,
}

/// Build a reqwest client for feed requests.
pub fn build_client(timeout: Duration) -> miette::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("graft/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            GraftError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

impl HttpFeed {
    pub fn new(base_url: &str, options: FeedOptions) -> miette::Result<Self> {
        let client = build_client(options.timeout)?;
        Ok(Self::with_client(base_url, client, options))
    }

    pub fn with_client(base_url: &str, client: Client, options: FeedOptions) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            options,
            listings: Mutex::new(HashMap::new()),
        }
    }

    pub fn index_url(&self, name: &str) -> String {
        format!("{}/{}/index.json", self.base_url, name.to_ascii_lowercase())
    }

    pub fn manifest_url(&self, name: &str, version: &PackageVersion) -> String {
        format!(
            "{}/{}/{}/{MANIFEST_FILE}",
            self.base_url,
            name.to_ascii_lowercase(),
            version
        )
    }

    /// GET `url` as text. `Ok(None)` on 404; retries server errors and timeouts.
    async fn fetch_text(&self, url: &str) -> miette::Result<Option<String>> {
        let mut last_err = String::new();

        for attempt in 0..self.options.retries {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAY * attempt).await;
            }

            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if status.is_server_error() {
                        last_err = format!("HTTP {status} from {url}");
                        continue;
                    }
                    if !status.is_success() {
                        return Err(GraftError::Network {
                            message: format!("HTTP {status} fetching {url}"),
                        }
                        .into());
                    }
                    let text = resp.text().await.map_err(|e| GraftError::Network {
                        message: format!("Failed to read response from {url}: {e}"),
                    })?;
                    return Ok(Some(text));
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = e.to_string();
                    continue;
                }
                Err(e) => {
                    return Err(GraftError::Network {
                        message: format!("Request to {url} failed: {e}"),
                    }
                    .into());
                }
            }
        }

        Err(GraftError::Network {
            message: format!(
                "Failed after {} attempts for {url}: {last_err}",
                self.options.retries
            ),
        }
        .into())
    }

    /// Versions published for `name`, memoized per feed unless caching is off.
    pub async fn versions(&self, name: &str) -> miette::Result<Arc<Vec<PackageVersion>>> {
        let id = name.to_ascii_lowercase();
        if !self.options.no_cache {
            let listings = self.listings.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(versions) = listings.get(&id) {
                trace!("listing cache hit for {id}");
                return Ok(versions.clone());
            }
        }

        let url = self.index_url(name);
        let versions = match self.fetch_text(&url).await? {
            Some(body) => {
                let index: VersionIndex =
                    serde_json::from_str(&body).map_err(|e| GraftError::Source {
                        message: format!("Invalid version index at {url}: {e}"),
                    })?;
                index
                    .versions
                    .iter()
                    .filter_map(|v| PackageVersion::parse(v))
                    .collect()
            }
            None => Vec::new(),
        };
        debug!("{url}: {} versions", versions.len());

        let versions = Arc::new(versions);
        if !self.options.no_cache {
            self.listings
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(id, versions.clone());
        }
        Ok(versions)
    }

    async fn try_find(&self, library_range: &LibraryRange) -> miette::Result<Option<RemoteMatch>> {
        let versions = self.versions(&library_range.name).await?;
        let Some(version) = crate::select_best(library_range, versions.iter().cloned()) else {
            return Ok(None);
        };
        let url = self.manifest_url(&library_range.name, &version);
        Ok(Some(
            RemoteMatch::new(Library::new(library_range.name.clone(), version)).with_path(url),
        ))
    }

    async fn try_dependencies(
        &self,
        library_match: &RemoteMatch,
        framework: &Framework,
    ) -> miette::Result<Vec<LibraryDependency>> {
        let library = &library_match.library;
        let url = self.manifest_url(&library.name, &library.version);
        let Some(body) = self.fetch_text(&url).await? else {
            return Err(GraftError::Source {
                message: format!("{library} is listed but {url} is missing"),
            }
            .into());
        };
        Manifest::parse_toml(&body)?.dependencies_for(framework)
    }

    fn degrade<T>(&self, result: miette::Result<T>, fallback: T) -> miette::Result<T> {
        match result {
            Err(e) if self.options.ignore_failed => {
                warn!("ignoring failed source {}: {e}", self.base_url);
                graft_util::progress::status_warn("Warning", &format!("{}: {e}", self.base_url));
                Ok(fallback)
            }
            other => other,
        }
    }
}

#[async_trait]
impl RemoteDependencyProvider for HttpFeed {
    fn is_http(&self) -> bool {
        true
    }

    fn source(&self) -> &str {
        &self.base_url
    }

    async fn find_library(
        &self,
        library_range: &LibraryRange,
        _framework: &Framework,
    ) -> miette::Result<Option<RemoteMatch>> {
        let result = self.try_find(library_range).await;
        self.degrade(result, None)
    }

    async fn get_dependencies(
        &self,
        library_match: &RemoteMatch,
        framework: &Framework,
    ) -> miette::Result<Vec<LibraryDependency>> {
        let result = self.try_dependencies(library_match, framework).await;
        self.degrade(result, Vec::new())
    }
}
