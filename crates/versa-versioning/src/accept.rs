//! `Accept` header version parameter
//!
//! A deliberately small parser: it only looks for a `version` parameter on
//! the media ranges of an `Accept` value and never fails. Anything it cannot
//! make sense of is skipped.
//!
//! ```text
//! Accept: application/vnd.acme.users;version=v2;charset=utf-8
//!         └──── media type (ignored) ───┘ └─ param ─┘ └─ param ─┘
//! ```

use tracing::trace;

/// Name of the media-type parameter carrying the version
pub const VERSION_PARAM: &str = "version";

/// Find the first non-empty `version` parameter in an `Accept` value.
///
/// Media ranges are separated by `,`, parameters by `;`. The first segment of
/// every range is the media type and is ignored. Parameter names compare
/// ASCII case-insensitively; values are trimmed and may be quoted.
///
/// # Example
///
/// ```rust
/// use versa_versioning::accept::version_param;
///
/// assert_eq!(version_param("vnd.acme.foo;version=v1;blah=bar"), Some("v1"));
/// assert_eq!(version_param("vnd.acme.foo;;blah=bar;"), None);
/// assert_eq!(version_param("text/html, vnd.acme.foo; Version=\"v2\""), Some("v2"));
/// ```
pub fn version_param(accept: &str) -> Option<&str> {
    accept.split(',').find_map(range_version)
}

fn range_version(range: &str) -> Option<&str> {
    // The media type itself never carries the version.
    range.split(';').skip(1).find_map(|segment| {
        let Some((name, value)) = segment.split_once('=') else {
            if !segment.trim().is_empty() {
                trace!(segment = %segment, "Ignoring Accept parameter without '='");
            }
            return None;
        };

        if !name.trim().eq_ignore_ascii_case(VERSION_PARAM) {
            return None;
        }

        let value = unquote(value.trim()).trim();
        if value.is_empty() {
            trace!("Ignoring empty Accept version parameter");
            None
        } else {
            Some(value)
        }
    })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
