//! Operation: walk a project's dependencies and display the tree.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use graft_core::config::GlobalConfig;
use graft_core::framework::Framework;
use graft_core::library::LibraryType;
use graft_core::manifest::Manifest;
use graft_resolver::context::RemoteWalkContext;
use graft_resolver::graph::DependencyGraph;
use graft_resolver::local::DependencyWalker;
use graft_resolver::provider::{DependencyProvider, RemoteDependencyProvider};
use graft_resolver::remote::RemoteDependencyWalker;
use graft_resolver::report::UnresolvedReport;
use graft_sources::folder::PackageFolder;
use graft_sources::project::{ProjectProvider, ProjectResolver};
use graft_util::progress;

/// Options for `graft tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    /// Target framework short name; `any` when absent.
    pub framework: Option<String>,
    /// Use only projects and package folders, never the network.
    pub offline: bool,
    /// Sources replacing the enabled configured ones.
    pub sources: Vec<String>,
    pub fallback_sources: Vec<String>,
    pub ignore_failed_sources: bool,
    pub no_cache: bool,
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the path to a specific dependency instead of the tree.
    pub why: Option<String>,
}

/// Display the dependency tree for the project in `project_dir`.
pub async fn tree(project_dir: &Path, config: &GlobalConfig, opts: &TreeOptions) -> miette::Result<()> {
    let output = render(project_dir, config, opts).await?;
    print!("{output}");
    Ok(())
}

/// Walk the project and render what `graft tree` prints.
pub async fn render(
    project_dir: &Path,
    config: &GlobalConfig,
    opts: &TreeOptions,
) -> miette::Result<String> {
    let manifest = Manifest::from_dir(project_dir)?;
    let root = manifest.identity(LibraryType::Project)?;
    let framework = match opts.framework {
        Some(ref name) => name.parse::<Framework>()?,
        None => Framework::any(),
    };

    let mut config = config.clone();
    config.ignore_failed_sources |= opts.ignore_failed_sources;
    config.no_cache |= opts.no_cache;

    let resolver = ProjectResolver::for_project(project_dir)?;
    let packages = crate::packages_dir(project_dir, &config)?;
    let sources = config.effective_sources(&opts.sources, &opts.fallback_sources);
    progress::status("Resolving", &format!("{root} for {framework}"));

    if opts.offline {
        let mut providers: Vec<Arc<dyn DependencyProvider>> = vec![
            Arc::new(ProjectProvider::new(resolver)),
            Arc::new(PackageFolder::new(packages)),
        ];
        for source in sources.iter().filter(|s| !s.is_http()) {
            providers.push(Arc::new(PackageFolder::new(graft_util::fs::expand_home(
                &source.source,
            ))));
        }
        debug!("offline walk with {} providers", providers.len());
        let graph = DependencyWalker::new(providers).walk_library(&root, &framework)?;
        Ok(describe(&graph, opts))
    } else {
        let mut context = RemoteWalkContext::new()
            .with_project_provider(Arc::new(ProjectProvider::new(resolver)))
            .with_local_provider(Arc::new(PackageFolder::new(packages)));
        for source in &sources {
            let provider: Arc<dyn RemoteDependencyProvider> =
                graft_sources::create_provider(source, &config)?;
            context = context.with_remote_provider(provider);
        }
        debug!("online walk over {} sources", sources.len());
        let spinner = progress::spinner(&format!("Walking {}", root.name));
        let graph = RemoteDependencyWalker::new(Arc::new(context))
            .walk_library(&root, &framework)
            .await;
        spinner.finish_and_clear();
        Ok(describe(&graph?, opts))
    }
}

fn describe<T>(graph: &DependencyGraph<T>, opts: &TreeOptions) -> String {
    let mut output = match opts.why {
        Some(ref target) => match graph.find_path(target) {
            Some(path) => {
                let mut out = format!("Path to {target}:\n");
                for (i, node) in path.iter().enumerate() {
                    out.push_str(&format!("{}{node}\n", "  ".repeat(i)));
                }
                out
            }
            None => format!("Dependency '{target}' not found in the graph.\n"),
        },
        None => graph.print_tree(opts.depth),
    };

    let report = UnresolvedReport::from_graph(graph);
    if report.is_empty() {
        progress::status(
            "Resolved",
            &format!("{} libraries", graph.resolved_libraries().len()),
        );
    } else {
        progress::status_warn("Unresolved", &format!("{} dependencies", report.len()));
        output.push_str(&report.to_string());
    }
    output
}
