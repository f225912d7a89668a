//! Version labels

use crate::error::RegistrationError;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of one API version, e.g. `v1` or `2024-01-beta`.
///
/// Labels end up as a URL path segment and as a response header value, so
/// they are restricted to RFC 3986 unreserved characters. Comparison is exact
/// and case-sensitive; no ordering between labels is implied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionLabel(String);

impl VersionLabel {
    /// Validate and wrap a label
    pub fn parse(label: impl Into<String>) -> Result<Self, RegistrationError> {
        let label = label.into();
        if let Err(reason) = validate_label(&label) {
            return Err(RegistrationError::InvalidVersionLabel { label, reason });
        }
        Ok(Self(label))
    }

    /// Wrap a label known to be valid
    pub(crate) fn from_static(label: &'static str) -> Self {
        debug_assert!(validate_label(label).is_ok());
        Self(label.to_string())
    }

    /// The label as registered
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_label(label: &str) -> Result<(), &'static str> {
    if label.is_empty() {
        return Err("label must not be empty");
    }
    if label.contains('/') {
        return Err("label must not contain a path separator");
    }
    if !label.bytes().all(is_unreserved) {
        return Err("label may only contain ASCII letters, digits, '-', '.', '_' and '~'");
    }
    Ok(())
}

#[inline]
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VersionLabel {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for VersionLabel {
    type Error = RegistrationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for VersionLabel {
    type Error = RegistrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl Borrow<str> for VersionLabel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VersionLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for VersionLabel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VersionLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
