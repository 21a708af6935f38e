//! Descriptor key derivation
//!
//! The key is the last segment of the decoded request path. It is the only
//! thing joined onto the store root, so anything that could name another
//! directory is refused here before the store is touched.

use super::error::ReplayError;
use hyper::HeaderMap;
use percent_encoding::percent_decode_str;

/// Derive the descriptor key from a request path
///
/// Trailing slashes are ignored, so `/a/b/` and `/a/b` both yield `b`.
pub fn derive_key(path: &str) -> Result<String, ReplayError> {
    let invalid = |reason| ReplayError::InvalidRequest {
        path: path.to_string(),
        reason,
    };

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| invalid("path is not valid UTF-8"))?;

    let segment = decoded
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    if segment.is_empty() || segment == "." {
        return Err(invalid("empty final segment"));
    }
    if segment.contains("..") {
        return Err(invalid("parent directory reference"));
    }
    if segment.contains(['\\', '\0']) {
        return Err(invalid("forbidden character"));
    }

    Ok(segment.to_string())
}

/// Header-driven selection of the preview descriptor variant
#[derive(Debug, Clone)]
pub struct PreviewRule {
    header: String,
    value: String,
    suffix: String,
}

impl PreviewRule {
    pub fn new(header: &str, value: &str, suffix: &str) -> Self {
        Self {
            header: header.to_string(),
            value: value.to_string(),
            suffix: suffix.to_string(),
        }
    }

    /// Whether the first value of the preview header matches exactly
    pub fn matches(&self, headers: &HeaderMap) -> bool {
        headers
            .get(self.header.as_str())
            .is_some_and(|v| v.as_bytes() == self.value.as_bytes())
    }

    /// Suffix `key` when the request asks for the preview variant
    pub fn apply(&self, mut key: String, headers: &HeaderMap) -> String {
        if self.matches(headers) {
            key.push_str(&self.suffix);
        }
        key
    }
}

impl Default for PreviewRule {
    fn default() -> Self {
        Self::new("X-Purpose", "preview", ".preview")
    }
}
