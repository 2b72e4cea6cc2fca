use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all graft operations.
#[derive(Debug, Error, Diagnostic)]
pub enum GraftError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (e.g. graft.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your graft.toml for syntax errors"))]
    Manifest { message: String },

    /// Global configuration or workspace settings could not be loaded.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A version or version range string could not be parsed.
    #[error("Invalid version: {message}")]
    Version { message: String },

    /// A dependency name reappeared on the active path of a walk.
    #[error("Circular dependency detected: {chain}")]
    #[diagnostic(help("Break the cycle by removing one of the references in the chain"))]
    CircularDependency { chain: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// A package source returned unusable data.
    #[error("Source error: {message}")]
    Source { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type GraftResult<T> = miette::Result<T>;
