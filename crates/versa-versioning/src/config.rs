//! Versioning configuration
//!
//! [`VersioningConfig`] is the user-facing, serde-friendly option set. It is
//! checked once at startup by [`VersioningConfig::validate`], which yields the
//! immutable [`VersionSettings`] shared by the resolver and the dispatcher.
//!
//! # Example
//!
//! ```rust,ignore
//! use versa_versioning::VersioningConfig;
//!
//! let settings = VersioningConfig::default()
//!     .prefix("/api")
//!     .redirect(true)
//!     .validate()?;
//!
//! assert_eq!(settings.versioned_path("v1", "/users"), "/api/v1/users");
//! assert_eq!(settings.unversioned_path("/users"), "/api/users");
//! ```

use crate::error::ConfigError;
use crate::label::VersionLabel;
use http::HeaderName;
use serde::Deserialize;

/// Default request header carrying an explicit version
pub const DEFAULT_REQUEST_HEADER: &str = "api-version";

/// Default response header announcing the resolved version
pub const DEFAULT_RESPONSE_HEADER: &str = "version";

/// Default mount prefix
pub const DEFAULT_PREFIX: &str = "/";

/// Label given to declarations that omit a version
pub const DEFAULT_VERSION: &str = "v1";

/// Prefix of the environment variables read by [`VersioningConfig::from_env`]
#[cfg(feature = "env")]
const ENV_PREFIX: &str = "VERSA_";

/// Raw versioning options
///
/// Every field has a default, so partial configuration files and partially
/// set environments deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Request header carrying an explicit version
    pub header: String,
    /// Response header announcing the resolved version
    #[serde(alias = "responseHeader")]
    pub response_header: String,
    /// Path prefix for every versioned and unversioned mount
    pub prefix: String,
    /// Redirect negotiated requests to their canonical versioned path
    pub redirect: bool,
    /// Label used for declarations without a version
    #[serde(alias = "defaultVersion")]
    pub default_version: String,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_REQUEST_HEADER.to_string(),
            response_header: DEFAULT_RESPONSE_HEADER.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            redirect: false,
            default_version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl VersioningConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from `VERSA_*` environment variables
    ///
    /// Recognized variables: `VERSA_HEADER`, `VERSA_RESPONSE_HEADER`,
    /// `VERSA_PREFIX`, `VERSA_REDIRECT`, `VERSA_DEFAULT_VERSION`. Unset
    /// variables keep their defaults.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Load options from `(name, value)` pairs using the `VERSA_*` naming of
    /// [`VersioningConfig::from_env`]; other names are ignored
    #[cfg(feature = "env")]
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, Self>(vars)?)
    }

    /// Set the request header name
    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.header = name.into();
        self
    }

    /// Set the response header name
    pub fn response_header(mut self, name: impl Into<String>) -> Self {
        self.response_header = name.into();
        self
    }

    /// Set the mount prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enable or disable canonicalizing redirects
    pub fn redirect(mut self, enabled: bool) -> Self {
        self.redirect = enabled;
        self
    }

    /// Set the label used for declarations without a version
    pub fn default_version(mut self, label: impl Into<String>) -> Self {
        self.default_version = label.into();
        self
    }

    /// Check every option and produce the runtime settings
    pub fn validate(&self) -> Result<VersionSettings, ConfigError> {
        let header = parse_header_name("request", &self.header)?;
        let response_header = parse_header_name("response", &self.response_header)?;
        let prefix = normalize_prefix(&self.prefix)?;
        let default_version = VersionLabel::parse(self.default_version.as_str())
            .map_err(ConfigError::InvalidDefaultVersion)?;

        Ok(VersionSettings {
            header,
            response_header,
            prefix,
            redirect: self.redirect,
            default_version,
        })
    }
}

fn parse_header_name(option: &'static str, name: &str) -> Result<HeaderName, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidHeaderName {
            option,
            name: name.to_string(),
            reason: "header name must not be empty".to_string(),
        });
    }
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeaderName {
        option,
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Normalize a mount prefix.
///
/// The result has exactly one leading slash, no trailing slash and no doubled
/// slashes; an empty prefix is the root `/`.
fn normalize_prefix(prefix: &str) -> Result<String, ConfigError> {
    if !prefix.is_empty() && !prefix.starts_with('/') {
        return Err(ConfigError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: "prefix must start with '/'",
        });
    }
    if prefix.contains(['?', '#', '{', '}', '*', ':']) {
        return Err(ConfigError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: "prefix must be a static path",
        });
    }

    if !prefix.bytes().all(is_prefix_byte) {
        return Err(ConfigError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: "prefix may only contain unreserved and sub-delimiter characters",
        });
    }

    let mut normalized = String::with_capacity(prefix.len());
    for segment in prefix.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    Ok(normalized)
}

/// `/` plus the RFC 3986 segment characters that need no percent-encoding
fn is_prefix_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'/' | b'-' | b'.' | b'_' | b'~' | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'+'
                | b',' | b';' | b'=' | b'@'
        )
}

/// Validated, immutable versioning settings
#[derive(Debug, Clone)]
pub struct VersionSettings {
    header: HeaderName,
    response_header: HeaderName,
    prefix: String,
    redirect: bool,
    default_version: VersionLabel,
}

impl VersionSettings {
    /// Request header carrying an explicit version
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Response header announcing the resolved version
    pub fn response_header(&self) -> &HeaderName {
        &self.response_header
    }

    /// Normalized prefix, `/` when unset
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether negotiated requests are redirected to their versioned path
    pub fn redirect(&self) -> bool {
        self.redirect
    }

    /// Label used for declarations without a version
    pub fn default_version(&self) -> &VersionLabel {
        &self.default_version
    }

    fn base(&self) -> &str {
        if self.prefix == "/" {
            ""
        } else {
            &self.prefix
        }
    }

    /// `prefix + "/" + version + path`, without a trailing slash for the root path
    pub fn versioned_path(&self, version: &str, path: &str) -> String {
        let tail = if path == "/" { "" } else { path };
        format!("{}/{}{}", self.base(), version, tail)
    }

    /// `prefix + path`; the root path under a prefix is the prefix itself
    pub fn unversioned_path(&self, path: &str) -> String {
        if self.prefix == "/" {
            return path.to_string();
        }
        if path == "/" {
            self.prefix.clone()
        } else {
            format!("{}{}", self.prefix, path)
        }
    }

    /// The part of a request path after the prefix.
    ///
    /// Returns `None` when the path is not under the prefix. The remainder is
    /// either empty (the path equals the prefix) or starts with `/`.
    pub fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        let base = self.base();
        let rest = path.strip_prefix(base)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(DEFAULT_REQUEST_HEADER),
            response_header: HeaderName::from_static(DEFAULT_RESPONSE_HEADER),
            prefix: DEFAULT_PREFIX.to_string(),
            redirect: false,
            default_version: VersionLabel::from_static(DEFAULT_VERSION),
        }
    }
}
