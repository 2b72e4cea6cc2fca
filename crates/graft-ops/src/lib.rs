pub mod ops_sources;
pub mod ops_tree;

use std::path::{Path, PathBuf};

use graft_core::config::GlobalConfig;
use graft_core::workspace::{resolve_root_directory, WorkspaceSettings};

/// The package folder for a project: the workspace override if set,
/// otherwise the global one.
pub fn packages_dir(project_dir: &Path, config: &GlobalConfig) -> miette::Result<PathBuf> {
    let root = resolve_root_directory(project_dir);
    let workspace_override = WorkspaceSettings::try_load(&root)?.and_then(|s| s.packages);
    Ok(match workspace_override {
        Some(dir) => root.join(graft_util::fs::expand_home(&dir)),
        None => config.packages_dir(),
    })
}
