//! Handler for `graft sources`.

use miette::Result;

use graft_core::config::GlobalConfig;
use graft_ops::ops_sources;

pub fn exec(config: &GlobalConfig, sources: &[String], fallback_sources: &[String]) -> Result<()> {
    ops_sources::sources(config, sources, fallback_sources);
    Ok(())
}
