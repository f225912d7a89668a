//! Startup error types
//!
//! Everything here is fatal before the server accepts its first connection.
//! Request-time outcomes (unknown version, malformed `Accept`) are not errors
//! at this layer: the former becomes a 404 response, the latter is ignored.

use http::Method;
use thiserror::Error;

/// Result type alias for versioning setup
pub type Result<T, E = VersioningError> = std::result::Result<T, E>;

/// Invalid configuration option
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Request or response header name is not a valid HTTP header name
    #[error("invalid {option} header name {name:?}: {reason}")]
    InvalidHeaderName {
        option: &'static str,
        name: String,
        reason: String,
    },

    /// Path prefix cannot be used to build mount paths
    #[error("invalid path prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },

    /// Label assigned to untagged declarations is not a valid version label
    #[error("invalid default version: {0}")]
    InvalidDefaultVersion(#[source] RegistrationError),

    /// Reading `VERSA_*` environment variables failed
    #[cfg(feature = "env")]
    #[error("failed to read versioning configuration from environment: {0}")]
    Env(#[from] envy::Error),
}

/// Invalid route declaration
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    /// Version label is empty or contains characters outside a path segment
    #[error("invalid version label {label:?}: {reason}")]
    InvalidVersionLabel { label: String, reason: &'static str },

    /// Logical path does not start with '/'
    #[error("route path must start with '/', got {path:?}")]
    InvalidPath { path: String },

    /// Two entries of one batch both claim to be the default for the same group
    #[error("conflicting default versions for {method} {path}: {first:?} and {second:?} are both marked default")]
    ConflictingDefaults {
        method: Method,
        path: String,
        first: String,
        second: String,
    },

    /// The underlying router refused a mount point
    #[error(transparent)]
    Mount(#[from] MountError),
}

/// Refusal from the underlying router
#[derive(Debug, Clone, Error)]
pub enum MountError {
    /// Same method already mounted on the same path
    #[error("duplicate handler for {method} {path}")]
    Duplicate { method: Method, path: String },

    /// Path overlaps an existing route in a way the router cannot disambiguate
    #[error("route {path:?} conflicts with existing route {existing:?}: {details}")]
    Conflict {
        path: String,
        existing: String,
        details: String,
    },
}

/// Any startup failure of the versioning layer
#[derive(Debug, Error)]
pub enum VersioningError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl From<MountError> for VersioningError {
    fn from(err: MountError) -> Self {
        VersioningError::Registration(err.into())
    }
}
