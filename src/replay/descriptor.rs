//! Descriptor grammar
//!
//! A descriptor is `<3 digit code><delimiter><payload>`. Redirect codes turn
//! the payload into a `Location`; every other recognized code turns it into
//! the response body. Content without a numeric prefix is served as-is with
//! 200.

use super::error::ReplayError;
use hyper::body::Bytes;
use hyper::StatusCode;
use percent_encoding::{utf8_percent_encode, CONTROLS};

/// Classification of a descriptor status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Payload is the redirect target
    Redirect,
    /// Payload is the body
    BodyBearing,
    /// Payload is the body; a generic error page is sent when it is empty
    ServerError,
    /// Not a code this server replays
    Unknown,
}

/// Map a status code onto its replay class
///
/// Recognized codes are the registered final-response codes. Informational
/// codes cannot end an HTTP/1.1 exchange and fall under `Unknown`.
pub const fn classify(code: u16) -> StatusClass {
    match code {
        301 | 302 | 303 | 307 | 308 => StatusClass::Redirect,
        200..=208
        | 226
        | 300
        | 304..=306
        | 400..=418
        | 421..=426
        | 428
        | 429
        | 431
        | 451 => StatusClass::BodyBearing,
        500..=508 | 510 | 511 => StatusClass::ServerError,
        _ => StatusClass::Unknown,
    }
}

/// What the descriptor asks the server to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayAction {
    Redirect { status: StatusCode, location: String },
    Respond { status: StatusCode, body: Bytes },
}

impl ReplayAction {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Redirect { status, .. } | Self::Respond { status, .. } => *status,
        }
    }
}

/// Leading three ASCII digits as a number
fn status_prefix(descriptor: &[u8]) -> Option<u16> {
    let prefix = descriptor.get(..3)?;
    if !prefix.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        prefix
            .iter()
            .fold(0, |acc, digit| acc * 10 + u16::from(digit - b'0')),
    )
}

/// Everything after the code and its delimiter byte, whitespace-trimmed
fn payload(descriptor: &[u8]) -> &[u8] {
    descriptor.get(4..).unwrap_or_default().trim_ascii()
}

/// Parse a descriptor into a replay action
pub fn parse(descriptor: &[u8]) -> Result<ReplayAction, ReplayError> {
    let Some(code) = status_prefix(descriptor) else {
        return Ok(ReplayAction::Respond {
            status: StatusCode::OK,
            body: Bytes::copy_from_slice(descriptor),
        });
    };

    let class = classify(code);
    if class == StatusClass::Unknown {
        return Err(ReplayError::UnknownCode { code });
    }
    let status = StatusCode::from_u16(code).map_err(|_| ReplayError::UnknownCode { code })?;

    let payload = payload(descriptor);
    Ok(match class {
        StatusClass::Redirect => ReplayAction::Redirect {
            status,
            location: String::from_utf8_lossy(payload).into_owned(),
        },
        _ => ReplayAction::Respond {
            status,
            body: Bytes::copy_from_slice(payload),
        },
    })
}

/// Resolve a redirect target against the request path
///
/// URLs with a scheme or authority are kept. Anything else is taken relative
/// to the directory of the request path and cleaned of `.` and `..`
/// segments. Non-ASCII bytes are percent-escaped in either case.
pub fn resolve_location(request_path: &str, target: &str) -> String {
    if has_scheme(target) || target.starts_with("//") {
        return escape_non_ascii(target);
    }

    let joined = if target.starts_with('/') {
        target.to_string()
    } else {
        let dir = request_path
            .rfind('/')
            .map_or("/", |idx| &request_path[..=idx]);
        format!("{dir}{target}")
    };

    let (path, query) = joined.split_at(joined.find('?').unwrap_or(joined.len()));
    let mut cleaned = clean_path(path);
    if path.ends_with('/') && !cleaned.ends_with('/') {
        cleaned.push('/');
    }
    cleaned.push_str(query);
    escape_non_ascii(&cleaned)
}

/// Lexically resolve `.` and `..` segments of a rooted path
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

fn escape_non_ascii(target: &str) -> String {
    utf8_percent_encode(target, CONTROLS).to_string()
}

fn has_scheme(target: &str) -> bool {
    target.split_once(':').is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}
