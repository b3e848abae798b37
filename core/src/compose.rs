//! URL composition for both API profiles.
//!
//! # Design
//! v2 paths are `/clip/<version>/resource/<type>/<id>`; v1 paths are
//! `/api/<username>/<collection>/<id>`. Every caller-supplied piece goes
//! through `single_segment`: surrounding slashes are trimmed, and anything that
//! would address more or less than one segment is refused. Host problems are reported as `Configuration` errors here,
//! before any request reaches a transport.

use url::Url;

use crate::error::{HueError, Result};

pub const DEFAULT_API_VERSION: &str = "v2";

/// Parse a host string, prefixing `<default_scheme>://` when it has none.
pub fn parse_host(host: &str, default_scheme: &str) -> Result<Url> {
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("{default_scheme}://{host}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| HueError::Configuration(format!("invalid host {host:?}: {e}")))?;

    if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
        return Err(HueError::Configuration(format!(
            "host {host:?} has an empty scheme or host"
        )));
    }
    Ok(url)
}

/// Check that `value` addresses exactly one path segment and return it.
///
/// Surrounding slashes are trimmed. Interior separators (raw or
/// percent-encoded), query/fragment delimiters and dot segments are rejected,
/// so a caller-supplied id can never climb out of its collection.
pub fn single_segment<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim_matches('/');
    let lowered = trimmed.to_ascii_lowercase();
    let dotted = lowered.replace("%2e", ".");
    let rejected = trimmed.is_empty()
        || trimmed.contains(|c| matches!(c, '/' | '\\' | '?' | '#'))
        || lowered.contains("%2f")
        || lowered.contains("%5c")
        || dotted == "."
        || dotted == "..";
    if rejected {
        return Err(HueError::Configuration(format!(
            "{what} {value:?} is not a single path segment"
        )));
    }
    Ok(trimmed)
}

/// Path for a v2 request. No resource type yields exactly `/clip/<version>/`.
pub fn compose_path(
    version: &str,
    resource_type: Option<&str>,
    resource_id: Option<&str>,
) -> Result<String> {
    let resource_type = resource_type.filter(|t| !t.is_empty());
    let resource_id = resource_id.filter(|id| !id.is_empty());
    let version = single_segment("API version", version)?;

    match (resource_type, resource_id) {
        (None, Some(id)) => Err(HueError::Configuration(format!(
            "resource id {id:?} given without a resource type"
        ))),
        (None, None) => Ok(format!("/clip/{version}/")),
        (Some(rtype), id) => {
            let rtype = single_segment("resource type", rtype)?.to_lowercase();
            let mut path = format!("/clip/{version}/resource/{rtype}");
            if let Some(id) = id {
                path.push('/');
                path.push_str(single_segment("resource id", id)?);
            }
            Ok(path)
        }
    }
}

/// Absolute v2 URL: host (https by default) plus the composed path.
pub fn compose_url(
    host: &str,
    version: &str,
    resource_type: Option<&str>,
    resource_id: Option<&str>,
) -> Result<Url> {
    let mut url = parse_host(host, "https")?;
    url.set_path(&compose_path(version, resource_type, resource_id)?);
    Ok(url)
}

/// Path for a v1 request: `/api/<username>/<segments...>`.
///
/// An empty username yields `/api`, the user-creation endpoint. Each
/// segment must be a single path segment.
pub fn compose_v1_path(username: &str, segments: &[&str]) -> Result<String> {
    let mut path = String::from("/api");
    if !username.is_empty() {
        path.push('/');
        path.push_str(single_segment("username", username)?);
    }
    for segment in segments {
        path.push('/');
        path.push_str(single_segment("path segment", segment)?);
    }
    Ok(path)
}
