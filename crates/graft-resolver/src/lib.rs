//! Dependency graph walkers: a synchronous walker over in-memory providers
//! with nearest-wins pruning, and an asynchronous walker that memoizes
//! resolutions and picks the best match across project, local and remote
//! sources.

pub mod context;
pub mod graph;
pub mod local;
pub mod provider;
pub mod remote;
pub mod report;
pub mod scope;
