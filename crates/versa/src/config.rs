//! Environment-driven configuration
//!
//! Versioning options can come from `VERSA_*` variables, optionally seeded
//! from a `.env` file:
//!
//! ```text
//! VERSA_PREFIX=/api
//! VERSA_REDIRECT=true
//! VERSA_HEADER=x-api-version
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use versa::config::versioning_from_env;
//!
//! let config = versioning_from_env()?;
//! let app = Versa::new().versioning(config);
//! ```

use versa_versioning::{ConfigError, VersioningConfig};

/// Load environment variables from `.env` in the current directory or its parents.
///
/// A missing file is not an error.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Load environment variables from a specific file path.
pub fn load_dotenv_from<P: AsRef<std::path::Path>>(path: P) {
    let _ = dotenvy::from_path(path);
}

/// Load `.env`, then read [`VersioningConfig`] from `VERSA_*` variables
pub fn versioning_from_env() -> Result<VersioningConfig, ConfigError> {
    load_dotenv();
    VersioningConfig::from_env()
}
