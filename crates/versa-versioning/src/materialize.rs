//! Mount-point materialization
//!
//! Expands a [`VersionRegistry`] into the concrete `(method, path)` bindings
//! handed to the underlying router:
//!
//! | Group | Mount points (prefix `/api`) |
//! |-------|------------------------------|
//! | `GET /test` v1, v2 (default) | `/api/v1/test`, `/api/v2/test`, `/api/test` → v2 |
//! | `GET /` v1 (default) | `/api/v1`, `/api` → v1 |
//!
//! Every versioned mount is emitted before every unversioned one. Versioned
//! paths carry one more static segment than their unversioned form, so a
//! radix-tree router matches them the same way whatever the insertion order.

use crate::config::VersionSettings;
use crate::error::MountError;
use crate::label::VersionLabel;
use crate::registry::{RouteKey, VersionRegistry};
use http::Method;
use std::fmt;
use tracing::debug;

/// Which mount of a group a binding is
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MountKind {
    /// `prefix/version/path`
    Versioned(VersionLabel),
    /// `prefix/path`, bound to the group's default version
    Unversioned,
}

impl MountKind {
    pub fn is_unversioned(&self) -> bool {
        matches!(self, MountKind::Unversioned)
    }

    pub fn version(&self) -> Option<&VersionLabel> {
        match self {
            MountKind::Versioned(label) => Some(label),
            MountKind::Unversioned => None,
        }
    }
}

/// One concrete route for the underlying router
#[derive(Clone)]
pub struct MountPoint<H> {
    pub method: Method,
    pub path: String,
    pub handler: H,
    /// Group the mount belongs to
    pub key: RouteKey,
    pub kind: MountKind,
}

impl<H> MountPoint<H> {
    /// Replace the handler, e.g. with a dispatching wrapper
    pub fn map_handler<T>(self, f: impl FnOnce(&RouteKey, &MountKind, H) -> T) -> MountPoint<T> {
        let handler = f(&self.key, &self.kind, self.handler);
        MountPoint {
            method: self.method,
            path: self.path,
            handler,
            key: self.key,
            kind: self.kind,
        }
    }
}

impl<H> fmt::Debug for MountPoint<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountPoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("key", &self.key)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Expand every group into its mount points
pub fn materialize<H: Clone>(
    registry: &VersionRegistry<H>,
    settings: &VersionSettings,
) -> Vec<MountPoint<H>> {
    let mut mounts = Vec::new();

    for group in registry.groups() {
        for (label, handler) in group.entries() {
            mounts.push(MountPoint {
                method: group.method().clone(),
                path: settings.versioned_path(label.as_str(), group.path()),
                handler: handler.clone(),
                key: group.key().clone(),
                kind: MountKind::Versioned(label.clone()),
            });
        }
    }

    for group in registry.groups() {
        mounts.push(MountPoint {
            method: group.method().clone(),
            path: settings.unversioned_path(group.path()),
            handler: group.default_handler().clone(),
            key: group.key().clone(),
            kind: MountKind::Unversioned,
        });
    }

    debug!(count = mounts.len(), "Materialized versioned mount points");
    mounts
}

/// The underlying router's registration capability
pub trait MountTarget<H> {
    /// Bind `handler` to `method` on `path`
    fn mount(&mut self, method: Method, path: &str, handler: H) -> Result<(), MountError>;
}

/// Hand every mount point to `target`, stopping at the first refusal
pub fn mount_all<H, T>(mounts: Vec<MountPoint<H>>, target: &mut T) -> Result<(), MountError>
where
    T: MountTarget<H> + ?Sized,
{
    for mount in mounts {
        target.mount(mount.method, &mount.path, mount.handler)?;
    }
    Ok(())
}
