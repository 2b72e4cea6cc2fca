//! Duplicate and cycle avoidance for the remote walker.
//!
//! Each expanded dependency hands its children a frame naming the library
//! that declared it and that library's other dependencies. A candidate is
//! checked against every frame from the nearest outwards.

use std::sync::Arc;

use graft_core::library::LibraryDependency;
use graft_util::errors::GraftError;

/// Immutable chain of exclusion frames threaded down a remote walk.
#[derive(Debug)]
pub struct WalkScope {
    owner: String,
    siblings: Vec<String>,
    outer: Option<Arc<WalkScope>>,
}

impl WalkScope {
    /// The scope for expanding `dependencies[expanding]` of `owner`.
    pub fn narrow(
        outer: Option<Arc<WalkScope>>,
        owner: &str,
        dependencies: &[LibraryDependency],
        expanding: usize,
    ) -> Arc<Self> {
        let siblings = dependencies
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != expanding)
            .map(|(_, d)| d.name().to_string())
            .collect();
        Arc::new(Self {
            owner: owner.to_string(),
            siblings,
            outer,
        })
    }

    /// Whether `current` may expand a dependency on `candidate`.
    ///
    /// A candidate naming the owner of any frame is a cycle. A candidate that
    /// a frame's owner also declares through another edge is skipped, since
    /// that edge resolves it closer to the root.
    pub fn allows(&self, current: &str, candidate: &str) -> miette::Result<bool> {
        for frame in self.frames() {
            if frame.owner.eq_ignore_ascii_case(candidate) {
                return Err(GraftError::CircularDependency {
                    chain: self.chain(current, candidate),
                }
                .into());
            }
            if frame.siblings.iter().any(|s| s.eq_ignore_ascii_case(candidate)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn frames(&self) -> impl Iterator<Item = &WalkScope> {
        std::iter::successors(Some(self), |frame| frame.outer.as_deref())
    }

    fn chain(&self, current: &str, candidate: &str) -> String {
        let mut names: Vec<&str> = self.frames().map(|f| f.owner.as_str()).collect();
        names.reverse();
        names.push(current);
        names.push(candidate);
        names.join(" -> ")
    }
}
