//! Operation: list package sources.

use graft_core::config::{GlobalConfig, PackageSource};

/// Render configured sources, marking which a walk would use.
pub fn render(config: &GlobalConfig, explicit: &[String], fallback: &[String]) -> String {
    let effective = config.effective_sources(explicit, fallback);
    let mut output = String::new();

    if effective.is_empty() {
        output.push_str("No package sources configured.\n");
    } else {
        output.push_str("Effective sources:\n");
        for (i, source) in effective.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, describe(source)));
        }
    }

    let disabled: Vec<PackageSource> = config
        .configured_sources()
        .into_iter()
        .filter(|s| !s.enabled)
        .collect();
    if !disabled.is_empty() {
        output.push_str("Disabled sources:\n");
        for source in &disabled {
            output.push_str(&format!("  - {}\n", describe(source)));
        }
    }
    output
}

fn describe(source: &PackageSource) -> String {
    let kind = if source.is_http() { "feed" } else { "folder" };
    if source.name == source.source {
        format!("{} [{kind}]", source.source)
    } else {
        format!("{} ({}) [{kind}]", source.name, source.source)
    }
}

/// Print the effective source list to stdout.
pub fn sources(config: &GlobalConfig, explicit: &[String], fallback: &[String]) {
    print!("{}", render(config, explicit, fallback));
}
