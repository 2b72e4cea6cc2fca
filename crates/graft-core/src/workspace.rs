use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use graft_util::errors::GraftError;
use graft_util::fs::find_ancestor_with;

/// File name of the workspace settings that mark a workspace root.
pub const WORKSPACE_FILE: &str = "graft-workspace.toml";

/// Workspace-wide settings loaded from `graft-workspace.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Directories, relative to the workspace root, whose subdirectories are projects.
    #[serde(default)]
    pub projects: Vec<String>,

    /// Package folder override for this workspace.
    #[serde(default)]
    pub packages: Option<String>,
}

impl WorkspaceSettings {
    /// Load settings from `root/graft-workspace.toml`.
    pub fn load(root: &Path) -> miette::Result<Self> {
        let path = root.join(WORKSPACE_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| GraftError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            GraftError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Load settings from the given root if the settings file exists.
    pub fn try_load(root: &Path) -> miette::Result<Option<Self>> {
        if root.join(WORKSPACE_FILE).is_file() {
            Self::load(root).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Absolute project search paths for a workspace rooted at `root`.
    pub fn project_paths(&self, root: &Path) -> Vec<PathBuf> {
        self.projects.iter().map(|p| root.join(p)).collect()
    }
}

/// Find the workspace root for a project directory.
///
/// Walks up looking for `graft-workspace.toml`; when none exists the project
/// directory itself is the root.
pub fn resolve_root_directory(project_dir: &Path) -> PathBuf {
    find_ancestor_with(project_dir, WORKSPACE_FILE).unwrap_or_else(|| project_dir.to_path_buf())
}
