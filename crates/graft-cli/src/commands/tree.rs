//! Handler for `graft tree`.

use miette::Result;

use graft_core::config::GlobalConfig;
use graft_core::manifest::MANIFEST_FILE;
use graft_ops::ops_tree::{self, TreeOptions};
use graft_util::errors::GraftError;

pub struct Args {
    pub framework: Option<String>,
    pub offline: bool,
    pub sources: Vec<String>,
    pub fallback_sources: Vec<String>,
    pub ignore_failed_sources: bool,
    pub no_cache: bool,
    pub depth: Option<u32>,
    pub why: Option<String>,
}

pub async fn exec(config: &GlobalConfig, args: Args) -> Result<()> {
    let project_dir = std::env::current_dir().map_err(GraftError::Io)?;

    if !project_dir.join(MANIFEST_FILE).is_file() {
        return Err(GraftError::Manifest {
            message: format!("No {MANIFEST_FILE} found in current directory"),
        }
        .into());
    }

    let opts = TreeOptions {
        framework: args.framework,
        offline: args.offline,
        sources: args.sources,
        fallback_sources: args.fallback_sources,
        ignore_failed_sources: args.ignore_failed_sources,
        no_cache: args.no_cache,
        depth: args.depth.map(|d| d as usize),
        why: args.why,
    };

    ops_tree::tree(&project_dir, config, &opts).await
}
