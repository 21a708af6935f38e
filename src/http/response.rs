//! HTTP response building module
//!
//! Builders for every response the server sends. Builder failures (for
//! example a redirect target that is not a valid header value) are logged
//! and degrade to a bare 500.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS};
use hyper::{Response, StatusCode};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Build a generic plain-text error response
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Full::new(Bytes::from(format!("{message}\n"))))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback_response()
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_error_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
}

/// Build redirect response with a bodiless `Location`
pub fn build_redirect_response_with_code(
    target: &str,
    status: StatusCode,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(LOCATION, target)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback_response()
        })
}

/// Build a replayed body response
///
/// The content type is only set when there is a body; the body itself is
/// only sent when `send_body` is true.
pub fn build_replay_response(
    status: StatusCode,
    body: Bytes,
    send_body: bool,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    if !body.is_empty() {
        builder = builder.header(CONTENT_TYPE, HTML_CONTENT_TYPE);
    }
    let body = if send_body { body } else { Bytes::new() };

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(status, &e);
        fallback_response()
    })
}

fn fallback_response() -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!(
        "Failed to build {} response: {error}",
        status.as_u16()
    ));
}
