//! Request version resolution

use crate::accept;
use crate::config::VersionSettings;
use crate::materialize::MountKind;
use crate::registry::RouteGroup;
use http::{header, HeaderMap, HeaderName};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Per-request data the resolver looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegotiationInputs<'a> {
    /// Request path, including the prefix
    pub path: &'a str,
    /// Value of the configured version header
    pub header: Option<&'a str>,
    /// Value of the `Accept` header
    pub accept: Option<&'a str>,
}

impl<'a> NegotiationInputs<'a> {
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            header: None,
            accept: None,
        }
    }

    pub fn with_header(mut self, value: &'a str) -> Self {
        self.header = Some(value);
        self
    }

    pub fn with_accept(mut self, value: &'a str) -> Self {
        self.accept = Some(value);
        self
    }

    /// Collect inputs from request headers.
    ///
    /// Values that are not visible ASCII are treated as absent.
    pub fn from_headers(path: &'a str, headers: &'a HeaderMap, version_header: &HeaderName) -> Self {
        Self {
            path,
            header: header_str(headers, version_header),
            accept: header_str(headers, &header::ACCEPT),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            trace!(header = %name, "Ignoring non-ASCII header value");
            None
        }
    }
}

/// Where a resolved version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionSource {
    /// Version segment in the request path
    Path,
    /// Configured version header
    Header,
    /// `version` parameter of the `Accept` header
    Accept,
    /// Group default, no explicit signal
    Default,
}

impl VersionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionSource::Path => "path",
            VersionSource::Header => "header",
            VersionSource::Accept => "accept",
            VersionSource::Default => "default",
        }
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The version a request asked for
///
/// `version` is not guaranteed to be registered for the group: a header can
/// name any version, and the dispatcher answers unknown ones with 404.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: String,
    pub source: VersionSource,
}

impl ResolvedVersion {
    pub fn new(version: impl Into<String>, source: VersionSource) -> Self {
        Self {
            version: version.into(),
            source,
        }
    }

    /// The caller used a versioned URL; never redirected
    pub fn is_from_path(&self) -> bool {
        self.source == VersionSource::Path
    }

    /// Derived from headers or the group default
    pub fn is_negotiated(&self) -> bool {
        !self.is_from_path()
    }
}

/// Computes the requested version from [`NegotiationInputs`]
///
/// Pure: the same inputs and group always produce the same result.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    settings: Arc<VersionSettings>,
}

impl VersionResolver {
    pub fn new(settings: Arc<VersionSettings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &VersionSettings {
        &self.settings
    }

    /// Resolve the version for a request matched to `group`, reading a
    /// version segment from the request path
    pub fn resolve<H>(&self, group: &RouteGroup<H>, inputs: &NegotiationInputs<'_>) -> ResolvedVersion {
        match self.path_version(group, inputs.path) {
            Some(version) => ResolvedVersion::new(version, VersionSource::Path),
            None => self.negotiate(group, inputs),
        }
    }

    /// Resolve the version for a request that arrived through a known mount.
    ///
    /// A versioned mount fixes the version; the path is not inspected. An
    /// unversioned mount never reads a version from the path, so a leading
    /// path parameter that happens to equal a label stays a parameter.
    pub fn resolve_mount<H>(
        &self,
        group: &RouteGroup<H>,
        kind: &MountKind,
        inputs: &NegotiationInputs<'_>,
    ) -> ResolvedVersion {
        match kind {
            MountKind::Versioned(label) => ResolvedVersion::new(label.as_str(), VersionSource::Path),
            MountKind::Unversioned => self.negotiate(group, inputs),
        }
    }

    /// Rules after the path: header, `Accept`, group default
    fn negotiate<H>(&self, group: &RouteGroup<H>, inputs: &NegotiationInputs<'_>) -> ResolvedVersion {
        if let Some(version) = inputs.header.map(str::trim).filter(|v| !v.is_empty()) {
            return ResolvedVersion::new(version, VersionSource::Header);
        }

        if let Some(version) = inputs.accept.and_then(accept::version_param) {
            return ResolvedVersion::new(version, VersionSource::Accept);
        }

        ResolvedVersion::new(group.default_version().as_str(), VersionSource::Default)
    }

    /// First segment after the prefix, when it is a version of the group
    fn path_version<'a, H>(&self, group: &RouteGroup<H>, path: &'a str) -> Option<&'a str> {
        let rest = self.settings.strip_prefix(path)?;
        let segment = rest.strip_prefix('/')?.split('/').next()?;
        group.contains(segment).then_some(segment)
    }
}
