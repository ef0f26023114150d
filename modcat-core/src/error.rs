//! Catalog error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the remote marketplace.
///
/// These never reach catalog consumers: the assembler recovers from them by
/// falling back on the cache or degrading to an empty catalog.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The marketplace could not be reached for a category
    #[error("Marketplace unreachable while requesting '{category}': {detail}")]
    Unreachable { category: String, detail: String },

    /// The marketplace answered with a payload that cannot be decoded
    #[error("Malformed marketplace payload for '{category}'")]
    Malformed {
        category: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading a mirrored category failed
    #[error("Failed to read marketplace data from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Wiring bugs: a collaborator is missing or misconfigured.
///
/// Unlike [`TransportError`] these are returned to the caller, since they
/// indicate the host application set things up incorrectly.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// URL generation was requested before a router was attached
    #[error("No router configured; call set_router before generating action URLs")]
    RouterNotSet,

    /// The router has no route with this name
    #[error("Unknown route '{route}'")]
    UnknownRoute { route: String },

    /// A route template references a parameter the caller did not supply
    #[error("Route '{route}' requires parameter '{param}'")]
    MissingRouteParameter { route: String, param: String },
}

/// Errors raised by the shipped file-backed adapters (cache, lock file).
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Cache directory or entry could not be read or written
    #[error("Cache error at {path}: {detail}")]
    Cache { path: PathBuf, detail: String },

    /// Installation state file could not be read or written
    #[error("Installation state error at {path}: {detail}")]
    State { path: PathBuf, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
