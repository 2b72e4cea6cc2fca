use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use graft_util::errors::GraftError;

/// Global user configuration loaded from `~/.graft/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Named package sources: URL or local path.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,

    #[serde(default, rename = "fallback-sources")]
    pub fallback_sources: Vec<String>,

    #[serde(default, rename = "disabled-sources")]
    pub disabled_sources: Vec<String>,

    /// Local package folder consulted before any source.
    #[serde(default = "default_packages_dir")]
    pub packages: String,

    #[serde(default, rename = "ignore-failed-sources")]
    pub ignore_failed_sources: bool,

    #[serde(default, rename = "no-cache")]
    pub no_cache: bool,

    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            sources: BTreeMap::new(),
            fallback_sources: Vec::new(),
            disabled_sources: Vec::new(),
            packages: default_packages_dir(),
            ignore_failed_sources: false,
            no_cache: false,
            http: HttpConfig::default(),
        }
    }
}

fn default_packages_dir() -> String {
    "~/.graft/packages".to_string()
}

/// HTTP settings from `[http]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs", rename = "timeout-secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    100
}

fn default_retries() -> u32 {
    3
}

/// A package source as selected for a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSource {
    pub name: String,
    pub source: String,
    pub enabled: bool,
}

impl PackageSource {
    /// An ad-hoc source named after its location.
    pub fn new(source: &str) -> Self {
        Self {
            name: source.to_string(),
            source: source.to_string(),
            enabled: true,
        }
    }

    /// Whether `value` names this source, by name or by location.
    fn is_named(&self, value: &str) -> bool {
        self.name.eq_ignore_ascii_case(value) || self.source.eq_ignore_ascii_case(value)
    }

    /// Whether this source is reached over HTTP.
    pub fn is_http(&self) -> bool {
        let lower = self.source.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

impl GlobalConfig {
    /// Load the global configuration from `~/.graft/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from an explicit path, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Config {
            message: format!("Failed to read global config: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| {
            GraftError::Config {
                message: format!("Failed to parse global config: {e}"),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// The local package folder with `~` expanded.
    pub fn packages_dir(&self) -> PathBuf {
        graft_util::fs::expand_home(&self.packages)
    }

    /// All configured sources, with their enabled state.
    pub fn configured_sources(&self) -> Vec<PackageSource> {
        self.sources
            .iter()
            .map(|(name, source)| PackageSource {
                name: name.clone(),
                source: source.clone(),
                enabled: !self
                    .disabled_sources
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(name)),
            })
            .collect()
    }

    /// The sources a walk should consult.
    ///
    /// Explicit sources replace the enabled configured sources; fallback
    /// sources (explicit first, then configured) are appended. Each value is
    /// matched against configured names and locations, otherwise used as a
    /// location directly. Duplicate locations are dropped.
    pub fn effective_sources(&self, explicit: &[String], fallback: &[String]) -> Vec<PackageSource> {
        let all = self.configured_sources();
        let enabled: Vec<PackageSource> = if explicit.is_empty() {
            all.iter().filter(|s| s.enabled).cloned().collect()
        } else {
            Vec::new()
        };

        let added = explicit
            .iter()
            .chain(fallback)
            .chain(&self.fallback_sources)
            .map(|value| {
                all.iter()
                    .find(|s| s.is_named(value))
                    .cloned()
                    .map(|s| PackageSource { enabled: true, ..s })
                    .unwrap_or_else(|| PackageSource::new(value))
            });

        let mut result: Vec<PackageSource> = Vec::new();
        for source in enabled.into_iter().chain(added) {
            if !result
                .iter()
                .any(|s| s.source.eq_ignore_ascii_case(&source.source))
            {
                result.push(source);
            }
        }
        result
    }
}

/// Returns the path to the graft data directory (`~/.graft/`).
pub fn dirs_path() -> PathBuf {
    graft_util::fs::home_dir().join(".graft")
}
