//! Request recording format

use chrono::{DateTime, Local};
use hyper::body::Bytes;
use hyper::header::{HeaderName, HOST, TRANSFER_ENCODING};
use hyper::{HeaderMap, Request};

/// Recording suffix format, lexically sortable with microsecond precision
pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.6f";

pub fn recording_stamp(now: &DateTime<Local>) -> String {
    now.format(STAMP_FORMAT).to_string()
}

/// Wire-style dump: request line, headers, blank line, body
///
/// Header names are written in canonical MIME case with `Host` first and the
/// rest grouped per name in received order. A chunked request gets its body
/// re-chunked so the dump parses back as the same request.
pub fn dump_request(req: &Request<Bytes>) -> Vec<u8> {
    let body = req.body();
    let mut out = Vec::with_capacity(256 + body.len());

    out.extend_from_slice(
        format!("{} {} {:?}\r\n", req.method(), req.uri(), req.version()).as_bytes(),
    );
    for value in req.headers().get_all(HOST) {
        write_header(&mut out, &HOST, value.as_bytes());
    }
    for (name, value) in req.headers() {
        if *name != HOST {
            write_header(&mut out, name, value.as_bytes());
        }
    }
    out.extend_from_slice(b"\r\n");

    if is_chunked(req.headers()) {
        write_chunked(&mut out, body);
    } else {
        out.extend_from_slice(body);
    }
    out
}

fn write_header(out: &mut Vec<u8>, name: &HeaderName, value: &[u8]) {
    out.extend_from_slice(canonical_name(name.as_str()).as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value);
    out.extend_from_slice(b"\r\n");
}

/// `x-forwarded-for` → `X-Forwarded-For`
fn canonical_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

/// Whether the final transfer coding is `chunked`
fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .last()
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Body as a single chunk followed by the last-chunk marker
fn write_chunked(out: &mut Vec<u8>, body: &[u8]) {
    if !body.is_empty() {
        out.extend_from_slice(format!("{:x}\r\n", body.len()).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
}
