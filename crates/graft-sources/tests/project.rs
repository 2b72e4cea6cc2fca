use std::path::Path;
use std::sync::Arc;

use graft_core::framework::Framework;
use graft_core::library::{LibraryRange, LibraryType};
use graft_core::workspace::WORKSPACE_FILE;
use graft_resolver::context::RemoteWalkContext;
use graft_resolver::local::DependencyWalker;
use graft_resolver::provider::{DependencyProvider, RemoteDependencyProvider};
use graft_resolver::remote::RemoteDependencyWalker;
use graft_sources::folder::PackageFolder;
use graft_sources::project::{ProjectProvider, ProjectResolver};

fn write_project(dir: &Path, name: &str, deps: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(
        dir.join("graft.toml"),
        format!("[package]\nname = \"{name}\"\nversion = \"1.0.0\"\n\n[dependencies]\n{deps}\n"),
    )
    .unwrap();
}

fn write_package(root: &Path, name: &str, version: &str) {
    let dir = root.join(name.to_ascii_lowercase()).join(version);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("graft.toml"),
        format!("[package]\nname = \"{name}\"\nversion = \"{version}\"\n"),
    )
    .unwrap();
}

#[test]
fn finds_siblings_and_workspace_projects() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    std::fs::write(root.join(WORKSPACE_FILE), "projects = [\"src\", \"test\"]\n").unwrap();
    write_project(&root.join("src/App"), "App", "");
    write_project(&root.join("src/Core"), "Core", "");
    write_project(&root.join("test/App.Tests"), "App.Tests", "");
    std::fs::create_dir_all(root.join("src/NotAProject")).unwrap();

    let resolver = ProjectResolver::for_project(&root.join("src/App")).unwrap();
    assert_eq!(resolver.search_paths().len(), 2);
    assert!(resolver.find_project("core").is_some());
    assert!(resolver.find_project("App.Tests").is_some());
    assert!(resolver.find_project("NotAProject").is_none());
}

#[test]
fn local_walk_over_projects_and_packages() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_project(&root.join("App"), "App", "Core = { type = \"project\" }\nJson = \"6.0.0\"");
    write_project(&root.join("Core"), "Core", "Json = \"6.0.0\"");
    let packages = root.join("packages");
    write_package(&packages, "Json", "6.0.4");

    let projects = ProjectProvider::new(ProjectResolver::for_project(&root.join("App")).unwrap());
    let walker = DependencyWalker::new(vec![
        Arc::new(projects),
        Arc::new(PackageFolder::new(&packages)),
    ]);
    let graph = walker
        .walk_range(
            LibraryRange::new("App", None).with_type(LibraryType::Project),
            &Framework::any(),
            &mut Default::default(),
        )
        .unwrap();

    assert_eq!(
        graph.print_tree(None),
        "App 1.0.0\n├── Core 1.0.0\n└── Json 6.0.4\n"
    );
}

#[tokio::test]
async fn project_tier_serves_remote_walk() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_project(&root.join("App"), "App", "Core = \"1.0.0\"");
    write_project(&root.join("Core"), "Core", "");

    let projects = Arc::new(ProjectProvider::new(
        ProjectResolver::for_project(&root.join("App")).unwrap(),
    ));
    assert!(!projects.is_http());
    assert!(projects.supports_type(LibraryType::Project));

    let walker = RemoteDependencyWalker::new(Arc::new(
        RemoteWalkContext::new().with_project_provider(projects),
    ));
    let graph = walker
        .walk_range(
            LibraryRange::new("App", None).with_type(LibraryType::Project),
            &Framework::any(),
        )
        .await
        .unwrap();
    assert_eq!(graph.print_tree(None), "App 1.0.0\n└── Core 1.0.0\n");
}
