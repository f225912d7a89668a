//! Version registry
//!
//! Holds, per `(method, path)` group, the handlers registered for each version
//! label and which label is the group's default.
//!
//! # Default selection
//!
//! Every non-empty group has exactly one default version:
//!
//! - a declaration marked [`VersionedRoute::default`] always becomes the
//!   default, replacing whatever was there (last one wins)
//! - otherwise the first declaration without a version claims it
//! - otherwise the first registered version holds it provisionally
//!
//! Registering a label that already exists replaces its handler but keeps its
//! position in the group.

use crate::error::RegistrationError;
use crate::label::VersionLabel;
use http::Method;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Identity of a route group: HTTP method plus logical path template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A route declaration with optional version information
///
/// This mirrors a plain route declaration and adds `version` and
/// `is_default`. Omitting `version` gives the declaration the registry's
/// untagged label.
///
/// # Example
///
/// ```rust,ignore
/// VersionedRoute::get("/users", list_users_v2).version("v2").default();
/// ```
#[derive(Clone)]
pub struct VersionedRoute<H> {
    pub method: Method,
    pub path: String,
    pub version: Option<String>,
    pub is_default: bool,
    pub handler: H,
}

impl<H> VersionedRoute<H> {
    /// Declare a route for an arbitrary method
    pub fn new(method: Method, path: impl Into<String>, handler: H) -> Self {
        Self {
            method,
            path: path.into(),
            version: None,
            is_default: false,
            handler,
        }
    }

    pub fn get(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::GET, path, handler)
    }

    pub fn post(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::POST, path, handler)
    }

    pub fn put(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::PUT, path, handler)
    }

    pub fn patch(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::PATCH, path, handler)
    }

    pub fn delete(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::DELETE, path, handler)
    }

    /// Tag the declaration with a version label
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Mark this version as the group's default
    pub fn default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Map the handler, keeping the rest of the declaration
    pub fn map_handler<T>(self, f: impl FnOnce(H) -> T) -> VersionedRoute<T> {
        VersionedRoute {
            method: self.method,
            path: self.path,
            version: self.version,
            is_default: self.is_default,
            handler: f(self.handler),
        }
    }

    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.method.clone(), self.path.clone())
    }
}

impl<H> fmt::Debug for VersionedRoute<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedRoute")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("version", &self.version)
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// How the current default of a group was chosen, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DefaultOrigin {
    /// First registered version, replaceable by anything stronger
    Provisional,
    /// First declaration without a version tag
    Untagged,
    /// Declaration flagged `is_default`
    Explicit,
}

/// All versions registered for one `(method, path)` pair
#[derive(Clone)]
pub struct RouteGroup<H> {
    key: RouteKey,
    versions: Vec<(VersionLabel, H)>,
    default: usize,
    default_origin: DefaultOrigin,
}

impl<H> RouteGroup<H> {
    fn new(key: RouteKey, label: VersionLabel, handler: H, origin: DefaultOrigin) -> Self {
        Self {
            key,
            versions: vec![(label, handler)],
            default: 0,
            default_origin: origin,
        }
    }

    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    pub fn method(&self) -> &Method {
        &self.key.method
    }

    pub fn path(&self) -> &str {
        &self.key.path
    }

    /// Registered labels in registration order
    pub fn versions(&self) -> impl Iterator<Item = &VersionLabel> {
        self.versions.iter().map(|(label, _)| label)
    }

    /// Labels paired with their handlers, in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&VersionLabel, &H)> {
        self.versions.iter().map(|(label, handler)| (label, handler))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn contains(&self, version: &str) -> bool {
        self.position(version).is_some()
    }

    /// Handler registered for `version`
    pub fn handler(&self, version: &str) -> Option<&H> {
        self.position(version).map(|i| &self.versions[i].1)
    }

    pub fn default_version(&self) -> &VersionLabel {
        &self.versions[self.default].0
    }

    pub fn default_handler(&self) -> &H {
        &self.versions[self.default].1
    }

    pub fn is_default(&self, version: &str) -> bool {
        self.default_version() == version
    }

    fn position(&self, version: &str) -> Option<usize> {
        self.versions.iter().position(|(label, _)| label == version)
    }

    fn insert(&mut self, label: VersionLabel, handler: H, origin: Option<DefaultOrigin>) {
        let index = match self.position(label.as_str()) {
            Some(i) => {
                debug!(route = %self.key, version = %label, "Replacing handler for existing version");
                self.versions[i].1 = handler;
                i
            }
            None => {
                self.versions.push((label, handler));
                self.versions.len() - 1
            }
        };

        let Some(origin) = origin else {
            return;
        };
        if origin < self.default_origin {
            return;
        }
        if origin == DefaultOrigin::Untagged && self.default_origin == DefaultOrigin::Untagged {
            // Only the first untagged declaration claims the default.
            return;
        }
        if origin == DefaultOrigin::Explicit
            && self.default_origin == DefaultOrigin::Explicit
            && self.default != index
        {
            warn!(
                route = %self.key,
                previous = %self.versions[self.default].0,
                current = %self.versions[index].0,
                "Default version replaced"
            );
        }
        self.default = index;
        self.default_origin = origin;
    }
}

impl<H> fmt::Debug for RouteGroup<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup")
            .field("key", &self.key)
            .field("versions", &self.versions().collect::<Vec<_>>())
            .field("default", self.default_version())
            .finish()
    }
}

/// Registry of every versioned route group
///
/// Built during startup, then shared read-only for the lifetime of the server.
#[derive(Clone)]
pub struct VersionRegistry<H> {
    groups: Vec<RouteGroup<H>>,
    index: HashMap<RouteKey, usize>,
    untagged: VersionLabel,
}

/// A declaration that passed validation
struct Checked<H> {
    key: RouteKey,
    label: VersionLabel,
    origin: Option<DefaultOrigin>,
    handler: H,
}

impl<H> VersionRegistry<H> {
    /// Create an empty registry; `untagged` labels declarations without a version
    pub fn new(untagged: VersionLabel) -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
            untagged,
        }
    }

    /// Register or overwrite one version of a group
    pub fn register(&mut self, route: VersionedRoute<H>) -> Result<(), RegistrationError> {
        let checked = self.check(route)?;
        self.apply(checked);
        Ok(())
    }

    /// Register a list of declarations in order, all or nothing.
    ///
    /// Fails without touching the registry if any entry is invalid or if two
    /// entries flag different default versions for the same group.
    pub fn register_batch<I>(&mut self, routes: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = VersionedRoute<H>>,
    {
        let mut checked = Vec::new();
        let mut defaults: HashMap<RouteKey, VersionLabel> = HashMap::new();

        for route in routes {
            let entry = self.check(route)?;
            if entry.origin == Some(DefaultOrigin::Explicit) {
                if let Some(first) = defaults.get(&entry.key) {
                    if *first != entry.label {
                        return Err(RegistrationError::ConflictingDefaults {
                            method: entry.key.method.clone(),
                            path: entry.key.path.clone(),
                            first: first.to_string(),
                            second: entry.label.to_string(),
                        });
                    }
                } else {
                    defaults.insert(entry.key.clone(), entry.label.clone());
                }
            }
            checked.push(entry);
        }

        for entry in checked {
            self.apply(entry);
        }
        Ok(())
    }

    fn check(&self, route: VersionedRoute<H>) -> Result<Checked<H>, RegistrationError> {
        if !route.path.starts_with('/') {
            return Err(RegistrationError::InvalidPath { path: route.path });
        }

        let (label, origin) = match route.version {
            Some(version) => {
                let origin = route.is_default.then_some(DefaultOrigin::Explicit);
                (VersionLabel::parse(version)?, origin)
            }
            None if route.is_default => (self.untagged.clone(), Some(DefaultOrigin::Explicit)),
            None => (self.untagged.clone(), Some(DefaultOrigin::Untagged)),
        };

        Ok(Checked {
            key: RouteKey::new(route.method, route.path),
            label,
            origin,
            handler: route.handler,
        })
    }

    fn apply(&mut self, entry: Checked<H>) {
        debug!(
            method = %entry.key.method,
            path = %entry.key.path,
            version = %entry.label,
            "Registering versioned route"
        );

        match self.index.get(&entry.key) {
            Some(&i) => self.groups[i].insert(entry.label, entry.handler, entry.origin),
            None => {
                let origin = entry.origin.unwrap_or(DefaultOrigin::Provisional);
                self.index.insert(entry.key.clone(), self.groups.len());
                self.groups
                    .push(RouteGroup::new(entry.key, entry.label, entry.handler, origin));
            }
        }
    }

    /// Handler registered for `version` of a group
    pub fn lookup(&self, method: &Method, path: &str, version: &str) -> Option<&H> {
        self.find(method, path)?.handler(version)
    }

    /// Default version of a group
    pub fn default_version(&self, method: &Method, path: &str) -> Option<&VersionLabel> {
        self.find(method, path).map(RouteGroup::default_version)
    }

    pub fn group(&self, key: &RouteKey) -> Option<&RouteGroup<H>> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    fn find(&self, method: &Method, path: &str) -> Option<&RouteGroup<H>> {
        // Linear scan avoids allocating a key; registries are small.
        self.groups
            .iter()
            .find(|g| g.key.method == *method && g.key.path == path)
    }

    /// Groups in order of first registration
    pub fn groups(&self) -> impl Iterator<Item = &RouteGroup<H>> {
        self.groups.iter()
    }

    /// Label given to declarations without a version
    pub fn untagged_label(&self) -> &VersionLabel {
        &self.untagged
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<H> Default for VersionRegistry<H> {
    fn default() -> Self {
        Self::new(VersionLabel::from_static(crate::config::DEFAULT_VERSION))
    }
}

impl<H> fmt::Debug for VersionRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionRegistry")
            .field("groups", &self.groups)
            .field("untagged", &self.untagged)
            .finish()
    }
}
