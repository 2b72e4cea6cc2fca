//! CLI argument definitions for Graft.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "graft",
    version,
    about = "Inspect and resolve package dependency graphs",
    long_about = "Graft walks a project's dependency graph across workspace projects, \
                  local package folders and HTTP feeds, applying nearest-wins conflict \
                  resolution and reporting cycles and unresolved dependencies."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Global configuration file [default: ~/.graft/config.toml]
    #[arg(long, global = true, env = "GRAFT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display the dependency tree of the project in the current directory
    Tree {
        /// Target framework (e.g. net45, netstandard2.0)
        #[arg(short, long)]
        framework: Option<String>,
        /// Resolve from projects and package folders only
        #[arg(long)]
        offline: bool,
        /// Package source to use instead of the configured ones (repeatable)
        #[arg(short, long = "source")]
        sources: Vec<String>,
        /// Additional source consulted after the others (repeatable)
        #[arg(long = "fallback-source")]
        fallback_sources: Vec<String>,
        /// Treat unreachable sources as having no packages
        #[arg(long)]
        ignore_failed_sources: bool,
        /// Do not reuse feed version listings
        #[arg(long)]
        no_cache: bool,
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<u32>,
        /// Show the path to a specific dependency
        #[arg(long)]
        why: Option<String>,
    },

    /// List the package sources a walk would consult
    Sources {
        /// Package source to use instead of the configured ones (repeatable)
        #[arg(short, long = "source")]
        sources: Vec<String>,
        /// Additional source consulted after the others (repeatable)
        #[arg(long = "fallback-source")]
        fallback_sources: Vec<String>,
    },
}

/// Parse command-line arguments.
pub fn parse() -> Cli {
    Cli::parse()
}
