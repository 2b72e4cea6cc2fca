//! Command dispatch and handler modules.

mod sources;
mod tree;

use miette::Result;

use graft_core::config::GlobalConfig;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => GlobalConfig::load_from(path)?,
        None => GlobalConfig::load()?,
    };

    match cli.command {
        Command::Tree {
            framework,
            offline,
            sources,
            fallback_sources,
            ignore_failed_sources,
            no_cache,
            depth,
            why,
        } => {
            tree::exec(
                &config,
                tree::Args {
                    framework,
                    offline,
                    sources,
                    fallback_sources,
                    ignore_failed_sources,
                    no_cache,
                    depth,
                    why,
                },
            )
            .await
        }
        Command::Sources {
            sources,
            fallback_sources,
        } => sources::exec(&config, &sources, &fallback_sources),
    }
}
