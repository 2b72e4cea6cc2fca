//! Core data types for graft.
//!
//! This crate defines the vocabulary shared by the resolver and the package
//! sources: library identities and requested ranges, package versions and
//! version ranges, target frameworks, package manifests, workspace settings,
//! and global configuration.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod config;
pub mod framework;
pub mod library;
pub mod manifest;
pub mod version;
pub mod workspace;
